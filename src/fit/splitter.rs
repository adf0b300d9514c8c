//! Cutover splitting.
//!
//! `pre` holds observations dated on or before the cutover, `post` those on or
//! after it, so a cutover-day observation lands in both windows. Each window
//! measures day offsets from its own earliest date.

use chrono::NaiveDate;

use crate::domain::{PhaseLabel, PhaseSample, PhaseWindow, Series};
use crate::error::EngineError;

/// Build one phase window, requiring at least `required` samples.
pub fn split_phase(
    series: &Series,
    cutover: NaiveDate,
    label: PhaseLabel,
    required: usize,
) -> Result<PhaseWindow, EngineError> {
    let selected: Vec<_> = series
        .iter()
        .filter(|obs| match label {
            PhaseLabel::Pre => obs.date <= cutover,
            PhaseLabel::Post => obs.date >= cutover,
        })
        .collect();

    if selected.len() < required.max(1) {
        return Err(EngineError::InsufficientPhaseData {
            phase: label,
            required,
            got: selected.len(),
        });
    }

    let start_date = selected.iter().map(|o| o.date).min().unwrap_or(cutover);
    let end_date = selected.iter().map(|o| o.date).max().unwrap_or(cutover);

    let mut samples: Vec<PhaseSample> = selected
        .iter()
        .map(|obs| PhaseSample {
            day_offset: (obs.date - start_date).num_days(),
            value: obs.primary,
        })
        .collect();
    // Series is already ordered; a stable sort keeps duplicate-date order intact.
    samples.sort_by_key(|s| s.day_offset);

    Ok(PhaseWindow {
        label,
        start_date,
        end_date,
        samples,
    })
}

/// Split into `(pre, post)` windows sized for their model families.
pub fn split(series: &Series, cutover: NaiveDate) -> Result<(PhaseWindow, PhaseWindow), EngineError> {
    let pre = split_phase(
        series,
        cutover,
        PhaseLabel::Pre,
        PhaseLabel::Pre.model_kind().param_count(),
    )?;
    let post = split_phase(
        series,
        cutover,
        PhaseLabel::Post,
        PhaseLabel::Post.model_kind().param_count(),
    )?;
    Ok((pre, post))
}
