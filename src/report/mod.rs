//! Reporting utilities: run summary, results table, and templated notes.

pub mod format;
pub mod notes;

pub use format::*;
pub use notes::*;
