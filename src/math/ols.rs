//! Least squares solver.
//!
//! Trend fits are tiny tall systems: one design row per observation and two or
//! three columns. They are solved through nalgebra's SVD with a rank cutoff
//! relative to the largest singular value, the same rule `lstsq`-style solvers
//! use. A rank-deficient design is reported instead of returning a
//! minimum-norm solution.

use std::fmt;

use nalgebra::{DMatrix, DVector};

/// Why a least squares system had no usable solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveFailure {
    /// Row count disagrees with `y`, or fewer rows than columns.
    Shape,
    RankDeficient,
    /// The design was fine but the coefficients overflowed.
    NonFinite,
}

impl fmt::Display for SolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveFailure::Shape => write!(f, "design shape does not match the observations"),
            SolveFailure::RankDeficient => write!(f, "design is singular"),
            SolveFailure::NonFinite => write!(f, "solution is not finite"),
        }
    }
}

/// Solve `min ||X β - y||²`.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>, SolveFailure> {
    let (rows, cols) = x.shape();
    if rows != y.len() || rows < cols || cols == 0 {
        return Err(SolveFailure::Shape);
    }

    let svd = x.clone().svd(true, true);
    let cutoff = f64::EPSILON * rows as f64 * svd.singular_values.max();
    if svd.rank(cutoff) < cols {
        return Err(SolveFailure::RankDeficient);
    }

    let beta = svd.solve(y, cutoff).map_err(|_| SolveFailure::RankDeficient)?;
    if beta.iter().all(|v| v.is_finite()) {
        Ok(beta)
    } else {
        Err(SolveFailure::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        // y = 2 + 3x on x = [0, 1, 2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn overdetermined_system_minimises_residuals() {
        // Points (0,0), (1,1), (2,1): OLS line is y = 1/6 + x/2.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[0.0, 1.0, 1.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0 / 6.0).abs() < 1e-10);
        assert!((beta[1] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn collinear_design_is_rejected() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(solve_least_squares(&x, &y), Err(SolveFailure::RankDeficient));
    }

    #[test]
    fn overflowing_solution_is_not_called_singular() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, -1.0, 1.0, 0.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[-1.7e308, 0.0, 1.7e308]);
        assert_eq!(solve_least_squares(&x, &y), Err(SolveFailure::NonFinite));
    }

    #[test]
    fn underdetermined_system_is_rejected() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        let y = DVector::from_row_slice(&[1.0]);
        assert_eq!(solve_least_squares(&x, &y), Err(SolveFailure::Shape));
    }
}
