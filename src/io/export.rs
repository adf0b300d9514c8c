//! Export the derived results table to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.
//! Undefined fields (division by zero) are written as empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::DerivedRow;
use crate::error::AppError;

/// Write derived rows to a CSV file.
pub fn write_derived_csv(path: &Path, rows: &[DerivedRow]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "date,kappa,lambda,ratio,delta,pct_change")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in rows {
        writeln!(
            file,
            "{},{:.1},{:.1},{},{:.1},{}",
            r.date,
            r.primary,
            r.secondary,
            r.ratio.as_ref().map(|v| format!("{v:.2}")).unwrap_or_default(),
            r.delta,
            r.percent_change
                .as_ref()
                .map(|v| format!("{v:.1}"))
                .unwrap_or_default(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
