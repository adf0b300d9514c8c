//! Saturating and decay model implementations.
//!
//! Models are implemented as small, pure functions so that fitting/projection
//! code can stay generic.

pub mod model;

pub use model::*;
