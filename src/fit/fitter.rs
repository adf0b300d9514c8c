//! Fitting a model family to one phase window.
//!
//! Given a [`PhaseWindow`] and a [`ModelKind`] we:
//! - check the window has at least as many samples as parameters
//! - build the starting guess
//! - run Levenberg–Marquardt (bounded for decay, unbounded for saturating)
//! - anchor the converged parameters to the window's start date

use tracing::debug;

use crate::domain::{FitQuality, FittedModel, ModelKind, PhaseFit, PhaseWindow};
use crate::error::EngineError;
use crate::math::{ParamBounds, SolverOptions, levenberg_marquardt};
use crate::models::initial_guess;

/// Fit `model` to `window`.
pub fn fit_phase(
    window: &PhaseWindow,
    model: ModelKind,
    bounds: Option<&ParamBounds>,
    opts: &SolverOptions,
) -> Result<PhaseFit, EngineError> {
    let k = model.param_count();
    let n = window.len();
    if n < k {
        return Err(EngineError::InsufficientPhaseData {
            phase: window.label,
            required: k,
            got: n,
        });
    }

    let xs = window.xs();
    let ys = window.ys();
    let guess = initial_guess(model, &window.samples, bounds)?;
    debug!(phase = %window.label, model = model.display_name(), ?guess, n, "fitting phase");

    let outcome = levenberg_marquardt(&model, &xs, &ys, &guess, bounds, opts)?;

    let rmse = (outcome.sse / n as f64).sqrt();
    Ok(PhaseFit {
        model: FittedModel {
            kind: model,
            parameters: outcome.params,
            origin_date: window.start_date,
        },
        quality: FitQuality {
            sse: outcome.sse,
            rmse,
            iterations: outcome.iterations,
            n,
        },
    })
}
