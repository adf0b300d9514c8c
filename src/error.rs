//! Error types.
//!
//! Two layers:
//! - [`EngineError`]: typed failures raised by the fitting/projection engine
//! - [`AppError`]: what the binary reports (message + process exit code)

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::PhaseLabel;

/// Failures surfaced by the engine. None of these are recovered internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Series is empty.")]
    EmptySeries,

    #[error("Series is not in date order: {date} at index {index} follows {previous}.")]
    UnorderedSeries {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("Invalid observation on {date}: {reason}.")]
    InvalidObservation { date: NaiveDate, reason: String },

    #[error("Insufficient data for {phase} phase: need {required} points, got {got}.")]
    InsufficientPhaseData {
        phase: PhaseLabel,
        required: usize,
        got: usize,
    },

    #[error("Fit did not converge within {iterations} iterations (SSE={sse:.6e}).")]
    FitDidNotConverge { iterations: usize, sse: f64 },

    #[error("Singular normal equations at iteration {iteration}.")]
    SingularJacobian { iteration: usize },

    #[error("Division by zero computing {field}.")]
    DivisionByZero { field: &'static str },

    #[error("Invalid projection range: end {end} is before start {start}.")]
    InvalidProjectionRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl EngineError {
    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            EngineError::EmptySeries
            | EngineError::UnorderedSeries { .. }
            | EngineError::InvalidObservation { .. }
            | EngineError::InsufficientPhaseData { .. } => 3,
            EngineError::InvalidOptions(_) => 2,
            EngineError::FitDidNotConverge { .. }
            | EngineError::SingularJacobian { .. }
            | EngineError::DivisionByZero { .. }
            | EngineError::InvalidProjectionRange { .. } => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
