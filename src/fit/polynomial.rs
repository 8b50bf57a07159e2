//! Polynomial least squares on centred time.
//!
//! Both public fitters (`fit_linear`, `fit_quadratic`) go through
//! [`fit_polynomial`], which:
//! - enforces the minimum observation count for the degree
//! - requires at least `degree + 1` distinct years (otherwise the line is undefined)
//! - builds the design on `u = year - mean(year)` and solves it with SVD
//! - reports the population standard deviation of the residuals

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitDegree, Observation};
use crate::error::TrendError;
use crate::math::{fill_polynomial_row, polyval, solve_least_squares};

/// Raw output of a polynomial fit, in centred coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyFit {
    pub center: f64,
    /// Ascending coefficients in `u = year - center`.
    pub betas: Vec<f64>,
    pub residual_std: f64,
    pub n_observations: usize,
}

pub fn fit_polynomial<O: Observation>(records: &[O], degree: FitDegree) -> Result<PolyFit, TrendError> {
    let n = records.len();
    let required = degree.min_observations();
    if n < required {
        return Err(TrendError::InsufficientData {
            n_observations: n,
            required,
        });
    }

    let n_coef = degree.degree() + 1;
    let distinct = distinct_times(records);
    if distinct < n_coef {
        return Err(TrendError::InsufficientData {
            n_observations: distinct,
            required: n_coef,
        });
    }

    let center = records.iter().map(|r| r.time() as f64).sum::<f64>() / n as f64;

    let mut x = DMatrix::<f64>::zeros(n, n_coef);
    let mut y = DVector::<f64>::zeros(n);
    let mut row = vec![0.0; n_coef];
    for (i, r) in records.iter().enumerate() {
        fill_polynomial_row(r.time() as f64 - center, &mut row);
        for (j, v) in row.iter().enumerate() {
            x[(i, j)] = *v;
        }
        y[i] = r.value();
    }

    let beta = solve_least_squares(&x, &y)
        .map_err(|failure| TrendError::Numeric(format!("degree-{} fit: {failure}", degree.degree())))?;
    let betas: Vec<f64> = beta.iter().copied().collect();

    let sse: f64 = records
        .iter()
        .map(|r| {
            let resid = r.value() - polyval(&betas, r.time() as f64 - center);
            resid * resid
        })
        .sum();
    let residual_std = (sse / n as f64).sqrt();
    if !residual_std.is_finite() {
        return Err(TrendError::Numeric("residuals are not finite".to_string()));
    }

    Ok(PolyFit {
        center,
        betas,
        residual_std,
        n_observations: n,
    })
}

fn distinct_times<O: Observation>(records: &[O]) -> usize {
    let mut times: Vec<i32> = records.iter().map(Observation::time).collect();
    times.sort_unstable();
    times.dedup();
    times.len()
}
