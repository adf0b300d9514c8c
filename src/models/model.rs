//! Model evaluation for the saturating (Gompertz) and decay curves.
//!
//! The fitter relies on three primitive operations per model kind:
//! - predict `y(x)` given parameters (residuals, projections, plots)
//! - the analytic gradient `∂y/∂p` (Jacobian rows)
//! - a starting guess derived from the phase samples
//!
//! `x` is always a day offset from the phase origin.

use nalgebra::{DMatrix, DVector};

use crate::domain::{ModelKind, PhaseSample};
use crate::error::EngineError;
use crate::math::{ParamBounds, ParametricModel, solve_least_squares};

/// Default decay box: `A ∈ [0, 1000]`, `k ∈ [0, 1]`.
pub const DECAY_LOWER: [f64; 2] = [0.0, 0.0];
pub const DECAY_UPPER: [f64; 2] = [1000.0, 1.0];

/// Starting Gompertz shape parameters `B`, `C`.
const SATURATING_B0: f64 = 1.0;
const SATURATING_C0: f64 = 0.05;

/// Decay rate used when the samples give no usable log-linear slope.
const DECAY_K0: f64 = 0.01;

/// Predict `y(x)` for the given model kind.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_count()`.
pub fn predict(model: ModelKind, x: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::Saturating => {
            let (a, b, c) = (params[0], params[1], params[2]);
            a * (-b * (-c * x).exp()).exp()
        }
        ModelKind::Decay => {
            let (a, k) = (params[0], params[1]);
            a * (-k * x).exp()
        }
    }
}

/// Fill `out` with `∂y/∂p_j` at `x`.
pub fn fill_gradient(model: ModelKind, x: f64, params: &[f64], out: &mut [f64]) {
    match model {
        ModelKind::Saturating => {
            let (a, b, c) = (params[0], params[1], params[2]);
            let u = (-c * x).exp();
            let g = (-b * u).exp();
            out[0] = g;
            out[1] = -a * u * g;
            out[2] = a * b * x * u * g;
        }
        ModelKind::Decay => {
            let (a, k) = (params[0], params[1]);
            let e = (-k * x).exp();
            out[0] = e;
            out[1] = -a * x * e;
        }
    }
}

impl ParametricModel for ModelKind {
    fn param_count(&self) -> usize {
        (*self).param_count()
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        predict(*self, x, params)
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        fill_gradient(*self, x, params, out);
    }
}

/// Bound box applied by default for a model kind.
///
/// Only the decay fit is bounded; the saturating fit runs unconstrained.
pub fn default_bounds(model: ModelKind) -> Option<ParamBounds> {
    match model {
        ModelKind::Saturating => None,
        ModelKind::Decay => ParamBounds::new(DECAY_LOWER.to_vec(), DECAY_UPPER.to_vec()).ok(),
    }
}

/// Starting parameters for a fit.
pub fn initial_guess(
    model: ModelKind,
    samples: &[PhaseSample],
    bounds: Option<&ParamBounds>,
) -> Result<Vec<f64>, EngineError> {
    let max_value = samples
        .iter()
        .map(|s| s.value)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_value.is_finite() {
        return Err(EngineError::InvalidOptions(
            "cannot build an initial guess from an empty window".into(),
        ));
    }

    let mut guess = match model {
        ModelKind::Saturating => vec![max_value, SATURATING_B0, SATURATING_C0],
        ModelKind::Decay => {
            let (a, k) = log_linear_decay(samples).unwrap_or((max_value, DECAY_K0));
            let a = if a.is_finite() && a > 0.0 { a } else { max_value };
            let k = if k.is_finite() { k } else { DECAY_K0 };
            vec![a, k]
        }
    };

    if let Some(b) = bounds {
        b.clip(&mut guess);
    }
    Ok(guess)
}

/// OLS fit of `ln y = ln A − k·x` over the strictly positive samples.
fn log_linear_decay(samples: &[PhaseSample]) -> Option<(f64, f64)> {
    let positive: Vec<&PhaseSample> = samples.iter().filter(|s| s.value > 0.0).collect();
    if positive.len() < 2 {
        return None;
    }
    let first = positive[0].day_offset;
    if positive.iter().all(|s| s.day_offset == first) {
        return None;
    }

    let n = positive.len();
    let mut x = DMatrix::<f64>::zeros(n, 2);
    let mut y = DVector::<f64>::zeros(n);
    for (i, s) in positive.iter().enumerate() {
        x[(i, 0)] = 1.0;
        x[(i, 1)] = s.day_offset as f64;
        y[i] = s.value.ln();
    }

    let beta = solve_least_squares(&x, &y)?;
    Some((beta[0].exp(), -beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(points: &[(i64, f64)]) -> Vec<PhaseSample> {
        points
            .iter()
            .map(|&(day_offset, value)| PhaseSample { day_offset, value })
            .collect()
    }

    #[test]
    fn predict_matches_closed_forms() {
        let y = predict(ModelKind::Decay, 30.0, &[100.0, 0.1]);
        assert!((y - 100.0 * (-3.0f64).exp()).abs() < 1e-12);

        // At x = 0 the Gompertz curve sits at A·e^{−B}.
        let y0 = predict(ModelKind::Saturating, 0.0, &[20.0, 1.0, 0.05]);
        assert!((y0 - 20.0 * (-1.0f64).exp()).abs() < 1e-12);
        let far = predict(ModelKind::Saturating, 1e4, &[20.0, 1.0, 0.05]);
        assert!((far - 20.0).abs() < 1e-9);
    }

    #[test]
    fn analytic_gradient_matches_finite_differences() {
        for (kind, params) in [
            (ModelKind::Saturating, vec![25.0, 0.8, 0.03]),
            (ModelKind::Decay, vec![40.0, 0.07]),
        ] {
            let mut analytic = vec![0.0; params.len()];
            fill_gradient(kind, 12.0, &params, &mut analytic);

            for j in 0..params.len() {
                let h = 1e-6 * params[j].abs().max(1.0);
                let mut up = params.clone();
                let mut dn = params.clone();
                up[j] += h;
                dn[j] -= h;
                let numeric = (predict(kind, 12.0, &up) - predict(kind, 12.0, &dn)) / (2.0 * h);
                assert!(
                    (numeric - analytic[j]).abs() <= 1e-5 * analytic[j].abs().max(1.0),
                    "{kind:?} param {j}: numeric={numeric}, analytic={}",
                    analytic[j]
                );
            }
        }
    }

    #[test]
    fn saturating_guess_uses_window_max() {
        let s = samples(&[(0, 10.0), (7, 14.0), (14, 12.0)]);
        let guess = initial_guess(ModelKind::Saturating, &s, None).unwrap();
        assert_eq!(guess, vec![14.0, 1.0, 0.05]);
    }

    #[test]
    fn decay_guess_comes_from_log_linear_slope_and_is_clipped() {
        let s = samples(&[(0, 20.0), (10, 20.0 * (-0.5f64).exp()), (20, 20.0 * (-1.0f64).exp())]);
        let bounds = default_bounds(ModelKind::Decay).unwrap();
        let guess = initial_guess(ModelKind::Decay, &s, Some(&bounds)).unwrap();
        assert!((guess[0] - 20.0).abs() < 1e-9);
        assert!((guess[1] - 0.05).abs() < 1e-9);

        // Rising data implies a negative k, which the box clips to zero.
        let rising = samples(&[(0, 5.0), (10, 10.0)]);
        let guess = initial_guess(ModelKind::Decay, &rising, Some(&bounds)).unwrap();
        assert_eq!(guess[1], 0.0);
    }
}
