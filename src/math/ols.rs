//! Small dense linear solvers.
//!
//! Two problems show up in this project:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2        (log-linear starting guesses)
//! (JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr         (damped Gauss–Newton step)
//! ```
//!
//! Implementation choices:
//! - Least squares goes through SVD so tall design matrices work.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - The damped normal equations are symmetric positive definite when the
//!   Jacobian has full column rank, so we try Cholesky first and fall back to LU.
//! - Parameter dimension is 2–3, so none of this is performance sensitive.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve a square system `a · x = b`.
///
/// Returns `None` when the matrix is singular or the solution is non-finite.
pub fn solve_square(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if !a.is_square() || a.nrows() != b.len() {
        return None;
    }

    let x = match a.clone().cholesky() {
        Some(chol) => chol.solve(b),
        None => a.clone().lu().solve(b)?,
    };

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
