//! Quadratic least squares, used for accelerating series (temperature).

use crate::domain::{FitDegree, Observation, QuadraticModel};
use crate::error::TrendError;
use crate::fit::polynomial::fit_polynomial;
use crate::math::uncenter_quadratic;

/// Fit `value = c0 + c1 * year + c2 * year^2`.
///
/// Needs at least six observations.
pub fn fit_quadratic<O: Observation>(records: &[O]) -> Result<QuadraticModel, TrendError> {
    let fit = fit_polynomial(records, FitDegree::Quadratic)?;
    let centered = [fit.betas[0], fit.betas[1], fit.betas[2]];
    Ok(QuadraticModel {
        coefficients: uncenter_quadratic(centered, fit.center),
        center: fit.center,
        centered_coefficients: centered,
        residual_std: fit.residual_std,
        n_observations: fit.n_observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CanonicalSeries;
    use crate::fit::TrendCurve;

    #[test]
    fn recovers_exact_parabola() {
        let points: Vec<(i32, f64)> = (1980..1990)
            .map(|t| {
                let u = (t - 1980) as f64;
                (t, 0.1 + 0.01 * u + 0.002 * u * u)
            })
            .collect();
        let model = fit_quadratic(CanonicalSeries::global(&points).records()).unwrap();
        assert!((model.curvature() - 0.002).abs() < 1e-9);
        assert!(model.residual_std < 1e-9);
        assert!((model.predict(1995.0) - (0.1 + 0.15 + 0.002 * 225.0)).abs() < 1e-8);
    }

    #[test]
    fn needs_six_points() {
        let points: Vec<(i32, f64)> = (2000..2005).map(|t| (t, t as f64)).collect();
        assert_eq!(
            fit_quadratic(CanonicalSeries::global(&points).records()).unwrap_err(),
            TrendError::InsufficientData {
                n_observations: 5,
                required: 6
            }
        );
    }
}
