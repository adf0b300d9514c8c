//! Synthetic data generation (demos and tests).

pub mod sample;

pub use sample::*;
