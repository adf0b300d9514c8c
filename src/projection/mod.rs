//! Forward projection of fitted models and threshold-crossing search.

pub mod projector;
pub mod threshold;

pub use projector::*;
pub use threshold::*;
