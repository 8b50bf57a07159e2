//! Ordinary least squares line of value against year.

use crate::domain::{FitDegree, Observation, TrendModel};
use crate::error::TrendError;
use crate::fit::polynomial::fit_polynomial;

/// Fit `value = slope * year + intercept`.
///
/// Needs at least two observations spanning two distinct years.
pub fn fit_linear<O: Observation>(records: &[O]) -> Result<TrendModel, TrendError> {
    let fit = fit_polynomial(records, FitDegree::Linear)?;
    let slope = fit.betas[1];
    let intercept = fit.betas[0] - slope * fit.center;
    Ok(TrendModel {
        slope,
        intercept,
        residual_std: fit.residual_std,
        n_observations: fit.n_observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalSeries, TimeKey};

    #[test]
    fn recovers_exact_line() {
        let series = CanonicalSeries::global(&[(2000, 14.0), (2001, 14.2), (2002, 14.4)]);
        let model = fit_linear(series.records()).unwrap();
        assert!((model.slope - 0.2).abs() < 1e-9);
        assert!((model.intercept + 386.0).abs() < 1e-6);
        assert!(model.residual_std < 1e-9);
        assert_eq!(model.n_observations, 3);
    }

    #[test]
    fn residual_std_is_population_std() {
        // Symmetric scatter around y = 0 with residuals [+1, -1, -1, +1] after the fit.
        let series = CanonicalSeries::global(&[(0, 1.0), (1, -1.0), (2, -1.0), (3, 1.0)]);
        let model = fit_linear(series.records()).unwrap();
        assert!(model.slope.abs() < 1e-12);
        assert!((model.residual_std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fewer_than_two_points_is_insufficient() {
        let one = CanonicalSeries::global(&[(2000, 1.0)]);
        assert_eq!(
            fit_linear(one.records()).unwrap_err(),
            TrendError::InsufficientData {
                n_observations: 1,
                required: 2
            }
        );
        let none = CanonicalSeries::default();
        assert!(matches!(
            fit_linear(none.records()),
            Err(TrendError::InsufficientData { n_observations: 0, required: 2 })
        ));
    }

    #[test]
    fn fits_aggregated_series() {
        let series = CanonicalSeries::global(&[(1990, 1.0), (1995, 2.0), (2000, 3.0), (2005, 4.0)]);
        let decades = crate::aggregate::aggregate(series.records(), TimeKey::Decade);
        let model = fit_linear(decades.records()).unwrap();
        // Decade means: 1990 -> 1.5, 2000 -> 3.5.
        assert!((model.slope - 0.2).abs() < 1e-9);
    }
}
