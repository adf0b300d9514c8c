//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `Σ (y_i − f(x_i; p))²` over a parameter vector `p` for an arbitrary
//! smooth model `f`. The solver knows nothing about dates or biomarkers; it sees
//! `(x, y)` pairs and a [`ParametricModel`].
//!
//! Each iteration:
//!
//! 1. linearize the model around `p` (Jacobian `J`, residuals `r`)
//! 2. solve `(JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr`
//! 3. clip `p + δ` into the optional bound box
//! 4. accept if the SSE drops (λ ÷ 10), otherwise reject (λ × 10)
//!
//! Convergence is declared on a small relative SSE decrease (`ftol`), a small
//! relative step (`xtol`), a small gradient (`gtol`), or an SSE that is zero to
//! machine precision. Hitting `max_iter` first is an error; the last iterate is
//! never returned as if it were a fit.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::EngineError;
use crate::math::ols::solve_square;

/// Relative finite-difference step (≈ cbrt(machine epsilon)).
const FD_STEP: f64 = 6.0e-6;

/// SSE below `SSE_FLOOR · Σy²` is treated as an exact fit.
const SSE_FLOOR: f64 = 1e-28;

const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;

/// A model `f(x; p)` with a fixed number of parameters.
pub trait ParametricModel {
    fn param_count(&self) -> usize;

    fn eval(&self, x: f64, params: &[f64]) -> f64;

    /// Partial derivatives `∂f/∂p_j` at `x`, written into `out`.
    ///
    /// The default uses central differences; models with closed-form
    /// derivatives should override it.
    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let mut work = params.to_vec();
        for j in 0..params.len() {
            let h = FD_STEP * params[j].abs().max(1.0);
            work[j] = params[j] + h;
            let f_plus = self.eval(x, &work);
            work[j] = params[j] - h;
            let f_minus = self.eval(x, &work);
            work[j] = params[j];
            out[j] = (f_plus - f_minus) / (2.0 * h);
        }
    }
}

/// Adapter so plain closures can be fitted.
pub struct FnModel<F> {
    n_params: usize,
    f: F,
}

impl<F> FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64,
{
    pub fn new(n_params: usize, f: F) -> Self {
        Self { n_params, f }
    }
}

impl<F> ParametricModel for FnModel<F>
where
    F: Fn(f64, &[f64]) -> f64,
{
    fn param_count(&self) -> usize {
        self.n_params
    }

    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        (self.f)(x, params)
    }
}

/// Per-parameter box constraints.
///
/// Proposed parameter vectors are clipped into the box; this is a projection,
/// not a constrained solver.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ParamBounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, EngineError> {
        if lower.len() != upper.len() {
            return Err(EngineError::InvalidOptions(format!(
                "bounds length mismatch: lower={}, upper={}",
                lower.len(),
                upper.len()
            )));
        }
        for (j, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(EngineError::InvalidOptions(format!(
                    "invalid bounds for parameter {j}: [{lo}, {hi}]"
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn clip(&self, params: &mut [f64]) {
        for (j, p) in params.iter_mut().enumerate() {
            *p = p.clamp(self.lower[j], self.upper[j]);
        }
    }
}

/// Solver tolerances and iteration cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Iteration cap (accepted and rejected steps both count).
    pub max_iter: usize,
    /// Relative SSE decrease below which an accepted step ends the fit.
    pub ftol: f64,
    /// Relative step size below which the fit ends.
    pub xtol: f64,
    /// Gradient infinity-norm below which the fit ends.
    pub gtol: f64,
    /// Starting damping factor.
    pub initial_lambda: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-12,
            initial_lambda: 1e-3,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_iter == 0 {
            return Err(EngineError::InvalidOptions("max_iter must be > 0".into()));
        }
        for (name, v) in [
            ("ftol", self.ftol),
            ("xtol", self.xtol),
            ("gtol", self.gtol),
            ("initial_lambda", self.initial_lambda),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(EngineError::InvalidOptions(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Converged parameters and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub params: Vec<f64>,
    pub sse: f64,
    pub iterations: usize,
}

/// Fit `model` to `(xs, ys)` starting from `initial`.
pub fn levenberg_marquardt<M>(
    model: &M,
    xs: &[f64],
    ys: &[f64],
    initial: &[f64],
    bounds: Option<&ParamBounds>,
    opts: &SolverOptions,
) -> Result<FitOutcome, EngineError>
where
    M: ParametricModel + ?Sized,
{
    opts.validate()?;

    let p = model.param_count();
    let n = xs.len();
    if initial.len() != p {
        return Err(EngineError::InvalidOptions(format!(
            "initial guess has {} values, model expects {p}",
            initial.len()
        )));
    }
    if ys.len() != n {
        return Err(EngineError::InvalidOptions(format!(
            "sample length mismatch: xs={n}, ys={}",
            ys.len()
        )));
    }
    if n < p {
        return Err(EngineError::InvalidOptions(format!(
            "need at least {p} samples, got {n}"
        )));
    }
    if let Some(b) = bounds {
        if b.len() != p {
            return Err(EngineError::InvalidOptions(format!(
                "bounds have {} entries, model expects {p}",
                b.len()
            )));
        }
    }

    let mut params = DVector::from_column_slice(initial);
    if let Some(b) = bounds {
        b.clip(params.as_mut_slice());
    }

    let mut sse = sum_squares(model, xs, ys, params.as_slice());
    if !sse.is_finite() {
        return Err(EngineError::InvalidOptions(
            "initial guess produces non-finite residuals".into(),
        ));
    }

    let sse_floor = SSE_FLOOR * ys.iter().map(|y| y * y).sum::<f64>().max(f64::MIN_POSITIVE);
    let mut lambda = opts.initial_lambda;

    let mut jac = DMatrix::<f64>::zeros(n, p);
    let mut resid = DVector::<f64>::zeros(n);
    let mut row = vec![0.0; p];
    let mut jtj = DMatrix::<f64>::zeros(p, p);
    let mut jtr = DVector::<f64>::zeros(p);
    let mut relinearize = true;

    for iter in 1..=opts.max_iter {
        if sse <= sse_floor {
            return Ok(finish(params, sse, iter - 1, "exact fit"));
        }

        if relinearize {
            for i in 0..n {
                model.gradient(xs[i], params.as_slice(), &mut row);
                for j in 0..p {
                    jac[(i, j)] = row[j];
                }
                resid[i] = ys[i] - model.eval(xs[i], params.as_slice());
            }
            jtj = jac.transpose() * &jac;
            jtr = jac.transpose() * &resid;

            if jtr.amax() <= opts.gtol {
                return Ok(finish(params, sse, iter - 1, "gradient"));
            }
            relinearize = false;
        }

        // Marquardt scaling: damp each direction relative to its own curvature.
        let mut damped = jtj.clone();
        for j in 0..p {
            let d = jtj[(j, j)];
            if !(d.is_finite() && d > 0.0) {
                return Err(EngineError::SingularJacobian { iteration: iter });
            }
            damped[(j, j)] = d * (1.0 + lambda);
        }

        let Some(step) = solve_square(&damped, &jtr) else {
            return Err(EngineError::SingularJacobian { iteration: iter });
        };

        let mut trial = &params + &step;
        if let Some(b) = bounds {
            b.clip(trial.as_mut_slice());
        }
        let step_norm = (&trial - &params).norm();
        let trial_sse = sum_squares(model, xs, ys, trial.as_slice());

        if trial_sse.is_finite() && trial_sse < sse {
            let decrease = sse - trial_sse;
            let previous = sse;
            params = trial;
            sse = trial_sse;
            lambda = (lambda / 10.0).max(LAMBDA_MIN);
            relinearize = true;

            if decrease <= opts.ftol * previous {
                return Ok(finish(params, sse, iter, "ftol"));
            }
            if step_norm <= opts.xtol * (params.norm() + opts.xtol) {
                return Ok(finish(params, sse, iter, "xtol"));
            }
        } else {
            if step_norm <= opts.xtol * (params.norm() + opts.xtol) {
                return Ok(finish(params, sse, iter, "xtol"));
            }
            lambda = (lambda * 10.0).min(LAMBDA_MAX);
        }
    }

    debug!(iterations = opts.max_iter, sse, "solver hit iteration cap");
    Err(EngineError::FitDidNotConverge {
        iterations: opts.max_iter,
        sse,
    })
}

fn finish(params: DVector<f64>, sse: f64, iterations: usize, reason: &str) -> FitOutcome {
    debug!(iterations, sse, reason, "solver converged");
    FitOutcome {
        params: params.iter().copied().collect(),
        sse,
        iterations,
    }
}

fn sum_squares<M>(model: &M, xs: &[f64], ys: &[f64], params: &[f64]) -> f64
where
    M: ParametricModel + ?Sized,
{
    xs.iter()
        .zip(ys.iter())
        .map(|(&x, &y)| {
            let r = y - model.eval(x, params);
            r * r
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_a_line_with_numeric_gradient() {
        let model = FnModel::new(2, |x, p| p[0] + p[1] * x);
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let fit =
            levenberg_marquardt(&model, &xs, &ys, &[0.0, 0.0], None, &SolverOptions::default())
                .unwrap();
        assert!((fit.params[0] - 1.0).abs() < 1e-6, "{:?}", fit.params);
        assert!((fit.params[1] - 2.0).abs() < 1e-6, "{:?}", fit.params);
    }

    #[test]
    fn recovers_exponential_from_noise_free_samples() {
        let model = FnModel::new(2, |x, p| p[0] * (-p[1] * x).exp());
        let xs: Vec<f64> = (0..10).map(|i| i as f64 * 3.0).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 50.0 * (-0.08 * x).exp()).collect();
        let fit =
            levenberg_marquardt(&model, &xs, &ys, &[40.0, 0.05], None, &SolverOptions::default())
                .unwrap();
        assert!((fit.params[0] - 50.0).abs() / 50.0 < 1e-6);
        assert!((fit.params[1] - 0.08).abs() / 0.08 < 1e-6);
    }

    #[test]
    fn bounds_are_respected() {
        // Unconstrained optimum has a negative slope; the box forbids it.
        let model = FnModel::new(2, |x, p| p[0] + p[1] * x);
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [6.0, 4.0, 2.0, 0.0];
        let bounds = ParamBounds::new(vec![-10.0, 0.0], vec![10.0, 10.0]).unwrap();
        let fit = levenberg_marquardt(
            &model,
            &xs,
            &ys,
            &[1.0, 1.0],
            Some(&bounds),
            &SolverOptions::default(),
        )
        .unwrap();
        assert!(fit.params[1] >= 0.0);
        assert!(fit.params[0] <= 10.0 && fit.params[0] >= -10.0);
    }

    #[test]
    fn unidentifiable_parameter_is_singular() {
        let model = FnModel::new(2, |_x, p| p[0]);
        let err = levenberg_marquardt(
            &model,
            &[0.0, 1.0, 2.0],
            &[1.0, 2.0, 3.0],
            &[0.0, 0.0],
            None,
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::SingularJacobian { iteration: 1 });
    }

    #[test]
    fn iteration_cap_is_an_error() {
        let model = FnModel::new(2, |x, p| p[0] * (-p[1] * x).exp());
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 80.0 * (-0.3 * x).exp()).collect();
        let opts = SolverOptions {
            max_iter: 1,
            ..SolverOptions::default()
        };
        let err = levenberg_marquardt(&model, &xs, &ys, &[1.0, 0.01], None, &opts).unwrap_err();
        assert!(matches!(
            err,
            EngineError::FitDidNotConverge { iterations: 1, .. }
        ));
    }

    #[test]
    fn rejects_too_few_samples() {
        let model = FnModel::new(3, |x, p| p[0] + p[1] * x + p[2] * x * x);
        let err = levenberg_marquardt(
            &model,
            &[0.0, 1.0],
            &[1.0, 2.0],
            &[0.0, 0.0, 0.0],
            None,
            &SolverOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidOptions(_)));
    }
}
