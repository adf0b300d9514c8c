//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated input (`Observation`, `Series`)
//! - phase windows and fit outputs (`PhaseWindow`, `FittedModel`, `ProjectedCurve`)
//! - run configuration (`ProjectionConfig`, `ReportConfig`)

pub mod series;
pub mod types;

pub use series::*;
pub use types::*;
