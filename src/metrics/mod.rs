//! Per-observation derived metrics (ratio, delta, percent change).

pub mod derived;

pub use derived::*;
