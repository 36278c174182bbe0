//! Least squares solver.
//!
//! The report fits a handful of small regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We use SVD to solve the least-squares problem robustly even when
//!   the design matrix is tall (more rows than columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Coefficient standard errors need `(XᵀX)⁻¹`; with at most seven columns the
//!   direct inverse is cheap and a singular result tells us the design is
//!   degenerate.

use nalgebra::{DMatrix, DVector};

/// Relative singular-value cutoff below which a design counts as rank deficient.
const RANK_TOL: f64 = 1e-10;

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

/// `(XᵀX)⁻¹`, or `None` when the columns are linearly dependent.
pub fn normal_inverse(x: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    // LU will happily invert a numerically singular matrix, so check the
    // conditioning of X first.
    let sv = x.clone().svd(false, false).singular_values;
    let max = sv.iter().cloned().fold(0.0, f64::max);
    let min = sv.iter().cloned().fold(f64::INFINITY, f64::min);
    if !(max > 0.0 && min / max > RANK_TOL) {
        return None;
    }

    let xtx = x.transpose() * x;
    let inv = xtx.try_inverse()?;
    if inv.iter().all(|v| v.is_finite()) {
        Some(inv)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn normal_inverse_rejects_collinear_columns() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        assert!(normal_inverse(&x).is_none());

        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let inv = normal_inverse(&x).unwrap();
        // XᵀX = [[3, 3], [3, 5]] -> inverse = [[5, -3], [-3, 3]] / 6
        assert!((inv[(0, 0)] - 5.0 / 6.0).abs() < 1e-12);
        assert!((inv[(0, 1)] + 0.5).abs() < 1e-12);
    }
}
