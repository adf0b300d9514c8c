//! Table metrics over the raw (unsplit) series.
//!
//! Rounding follows the results table: ratio to 2 decimals, delta and percent
//! change to 1 decimal.

use crate::domain::{DerivedRow, Series};
use crate::error::EngineError;

const RATIO_DECIMALS: i32 = 2;
const CHANGE_DECIMALS: i32 = 1;

/// One row per observation, deltas against the immediately preceding row.
pub fn derive_rows(series: &Series) -> Vec<DerivedRow> {
    let mut out = Vec::with_capacity(series.len());
    let mut prev_primary: Option<f64> = None;

    for obs in series.iter() {
        let ratio = if obs.secondary == 0.0 {
            Err(EngineError::DivisionByZero { field: "ratio" })
        } else {
            Ok(round_to(obs.primary / obs.secondary, RATIO_DECIMALS))
        };

        let (delta, percent_change) = match prev_primary {
            None => (0.0, Ok(0.0)),
            Some(prev) => {
                let delta = obs.primary - prev;
                let pct = if prev == 0.0 {
                    Err(EngineError::DivisionByZero {
                        field: "percent_change",
                    })
                } else {
                    Ok(round_to(100.0 * delta / prev, CHANGE_DECIMALS))
                };
                (round_to(delta, CHANGE_DECIMALS), pct)
            }
        };

        out.push(DerivedRow {
            date: obs.date,
            primary: obs.primary,
            secondary: obs.secondary,
            ratio,
            delta,
            percent_change,
        });
        prev_primary = Some(obs.primary);
    }

    out
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}
