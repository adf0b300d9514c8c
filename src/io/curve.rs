//! Write curve JSON files.
//!
//! Curve JSON is the portable representation of a run:
//! - per phase: model kind + parameters + origin date
//! - fit quality and threshold crossings
//! - the projected daily curve, for plotting elsewhere
//!
//! A phase whose fit failed is recorded with its error message instead.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app::pipeline::{PhaseOutcome, RunOutput};
use crate::domain::{FitQuality, FittedModel, PhaseLabel, ProjectedPoint, ThresholdCrossing};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub latest_observation: NaiveDate,
    pub phases: Vec<PhaseEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEntry {
    pub phase: PhaseLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<FittedModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_quality: Option<FitQuality>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crossings: Vec<ThresholdCrossing>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub curve: Vec<ProjectedPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CurveFile {
    pub fn from_run(run: &RunOutput) -> Self {
        Self {
            tool: "kappa".to_string(),
            latest_observation: run.series.last().date,
            phases: vec![phase_entry(&run.pre), phase_entry(&run.post)],
        }
    }
}

fn phase_entry(outcome: &PhaseOutcome) -> PhaseEntry {
    match &outcome.result {
        Ok(p) => PhaseEntry {
            phase: outcome.label,
            model: Some(p.fit.model.clone()),
            fit_quality: Some(p.fit.quality.clone()),
            crossings: p.crossings.clone(),
            curve: p.curve.points.clone(),
            error: None,
        },
        Err(e) => PhaseEntry {
            phase: outcome.label,
            model: None,
            fit_quality: None,
            crossings: Vec::new(),
            curve: Vec::new(),
            error: Some(e.to_string()),
        },
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, run: &RunOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, &CurveFile::from_run(run))
        .map_err(|e| AppError::new(2, format!("Failed to write curve JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_projection;
    use crate::data::sample::{SampleSpec, generate_sample};
    use crate::domain::{ModelKind, ProjectionConfig, Threshold};
    use crate::math::SolverOptions;
    use crate::models::default_bounds;

    #[test]
    fn failed_phase_is_recorded_with_its_error() {
        let spec = SampleSpec::default();
        let data = generate_sample(&spec).unwrap();
        let series = data.to_series().unwrap();
        let first = series.first().date;
        let config = ProjectionConfig {
            cutover: first,
            projection_end: first + chrono::Duration::days(200),
            thresholds: vec![Threshold::new("CR", 5.0)],
            solver: SolverOptions::default(),
            decay_bounds: default_bounds(ModelKind::Decay).unwrap(),
        };
        let run = run_projection(series, &config).unwrap();
        let file = CurveFile::from_run(&run);

        assert_eq!(file.phases.len(), 2);
        assert_eq!(file.phases[0].phase, PhaseLabel::Pre);
        assert!(file.phases[0].model.is_none());
        assert!(file.phases[0].error.as_deref().unwrap().contains("Insufficient data"));

        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains("\"phase\":\"pre\""));
    }
}
