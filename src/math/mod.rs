//! Numerical utilities: dense linear solves and Levenberg–Marquardt.

pub mod lm;
pub mod ols;

pub use lm::*;
pub use ols::*;
