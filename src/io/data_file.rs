//! Measurement data file (JSON).
//!
//! Schema:
//!
//! ```json
//! {
//!   "measurements": [ { "date": "2025-07-03", "kappa": 23.2, "lambda": 1.4 } ],
//!   "settings": {
//!     "split_date": "2025-06-10",
//!     "projection_end_date": "2026-06-30",
//!     "vgpr_threshold": 10.0,
//!     "cr_threshold": 5.0
//!   }
//! }
//! ```
//!
//! Every settings key is optional here; the app layer decides which ones are
//! required after CLI overrides are applied.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Observation, Series};
use crate::error::{AppError, EngineError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub date: NaiveDate,
    pub kappa: f64,
    pub lambda: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vgpr_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cr_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub settings: Settings,
}

impl DataFile {
    /// Validate measurements into a [`Series`].
    pub fn to_series(&self) -> Result<Series, EngineError> {
        Series::new(
            self.measurements
                .iter()
                .map(|m| Observation::new(m.date, m.kappa, m.lambda))
                .collect(),
        )
    }

    /// Append a measurement, keeping the file in date order.
    pub fn push_measurement(&mut self, m: Measurement) -> Result<(), AppError> {
        if let Some(last) = self.measurements.last() {
            if m.date < last.date {
                return Err(AppError::new(
                    2,
                    format!(
                        "New measurement {} is earlier than the latest entry {}.",
                        m.date, last.date
                    ),
                ));
            }
        }
        if !(m.kappa.is_finite() && m.kappa >= 0.0 && m.lambda.is_finite() && m.lambda >= 0.0) {
            return Err(AppError::new(
                2,
                format!("Invalid measurement values: kappa={}, lambda={}.", m.kappa, m.lambda),
            ));
        }
        self.measurements.push(m);
        Ok(())
    }
}

/// Read a data file.
pub fn read_data_file(path: &Path) -> Result<DataFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open data file '{}': {e}", path.display()),
        )
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::new(
            2,
            format!("Invalid JSON in '{}': {e}", path.display()),
        )
    })
}

/// Write a data file (pretty-printed, trailing newline).
pub fn write_data_file(path: &Path, data: &DataFile) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create data file '{}': {e}", path.display()),
        )
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| AppError::new(2, format!("Failed to write data file: {e}")))?;
    writeln!(writer).map_err(|e| AppError::new(2, format!("Failed to write data file: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write data file: {e}")))?;
    Ok(())
}
