//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and projection
//! - exported to JSON/CSV
//! - handed to the report/plot layer without conversion

use std::fmt;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::math::{ParamBounds, SolverOptions};

/// A single paired light-chain measurement.
///
/// `primary` is the biomarker being modelled (kappa); `secondary` is the
/// reference chain (lambda) used for the ratio column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub primary: f64,
    pub secondary: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, primary: f64, secondary: f64) -> Self {
        Self {
            date,
            primary,
            secondary,
        }
    }
}

/// Which side of the cutover date a window covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseLabel {
    Pre,
    Post,
}

impl PhaseLabel {
    /// Model family fitted to this phase.
    pub fn model_kind(self) -> ModelKind {
        match self {
            PhaseLabel::Pre => ModelKind::Saturating,
            PhaseLabel::Post => ModelKind::Decay,
        }
    }
}

impl fmt::Display for PhaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseLabel::Pre => write!(f, "pre"),
            PhaseLabel::Post => write!(f, "post"),
        }
    }
}

/// One fitting sample: whole days since the window origin and the observed value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSample {
    pub day_offset: i64,
    pub value: f64,
}

/// A contiguous slice of the series with its own local time origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseWindow {
    pub label: PhaseLabel,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Sorted by `day_offset`.
    pub samples: Vec<PhaseSample>,
}

impl PhaseWindow {
    pub fn xs(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.day_offset as f64).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Concrete fitted model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Gompertz curve `A·exp(−B·exp(−C·x))`.
    Saturating,
    /// Exponential decay `A·exp(−k·x)`.
    Decay,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Saturating => "Gompertz",
            ModelKind::Decay => "Exponential decay",
        }
    }

    /// Number of free parameters.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Saturating => 3,
            ModelKind::Decay => 2,
        }
    }

    /// Parameter names in the order stored in [`FittedModel::parameters`].
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Saturating => &["A", "B", "C"],
            ModelKind::Decay => &["A", "k"],
        }
    }
}

/// Fitted parameters anchored to a calendar origin.
///
/// Only ever built from a converged fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub kind: ModelKind,
    pub parameters: Vec<f64>,
    /// Calendar date corresponding to `day_offset = 0`.
    pub origin_date: NaiveDate,
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub iterations: usize,
    pub n: usize,
}

/// Fit output for a single phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseFit {
    pub model: FittedModel,
    pub quality: FitQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Daily predicted values generated from one [`FittedModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCurve {
    pub kind: ModelKind,
    pub points: Vec<ProjectedPoint>,
}

impl ProjectedCurve {
    pub fn first(&self) -> Option<&ProjectedPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ProjectedPoint> {
        self.points.last()
    }
}

/// A named clinical threshold (e.g. VGPR, CR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub label: String,
    pub value: f64,
}

impl Threshold {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Result of scanning a curve for a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "date")]
pub enum CrossingDate {
    At(NaiveDate),
    NotFound,
}

impl CrossingDate {
    pub fn date(self) -> Option<NaiveDate> {
        match self {
            CrossingDate::At(d) => Some(d),
            CrossingDate::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCrossing {
    pub label: String,
    pub threshold_value: f64,
    pub crossing: CrossingDate,
}

/// Per-observation table row.
///
/// Fields that involve a division carry the failure instead of a coerced value.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub date: NaiveDate,
    pub primary: f64,
    pub secondary: f64,
    pub ratio: Result<f64, EngineError>,
    pub delta: f64,
    pub percent_change: Result<f64, EngineError>,
}

/// Vertical axis scale for terminal charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Linear,
    Log,
}

/// Everything the engine needs for one run.
///
/// Built from the data file settings plus CLI overrides; no ambient state.
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    pub cutover: NaiveDate,
    pub projection_end: NaiveDate,
    pub thresholds: Vec<Threshold>,
    pub solver: SolverOptions,
    /// Box applied to the post-phase decay fit. The pre-phase fit is unbounded.
    pub decay_bounds: ParamBounds,
}

/// A full `kappa report` run as understood by the app layer.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub projection: ProjectionConfig,
    pub notes_path: Option<std::path::PathBuf>,
    pub plot: bool,
    pub plot_scale: ScaleKind,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_table: Option<std::path::PathBuf>,
    pub export_curve: Option<std::path::PathBuf>,
}
