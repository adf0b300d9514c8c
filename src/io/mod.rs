//! Input/output helpers.
//!
//! - measurement data file read/write (`data_file`)
//! - derived table CSV export (`export`)
//! - curve JSON export (`curve`)

pub mod curve;
pub mod data_file;
pub mod export;

pub use curve::*;
pub use data_file::*;
pub use export::*;
