//! Phase fitting.
//!
//! Responsibilities:
//!
//! - split the series into pre/post windows around the cutover
//! - fit each window with its model family

pub mod fitter;
pub mod splitter;

pub use fitter::*;
pub use splitter::*;
