//! Extrapolation of a fitted trend to a future horizon.
//!
//! The band is `prediction ± 1.96·σ`, with σ the residual standard deviation of
//! the fit. It ignores parameter uncertainty, so it is a rough 95% interval that
//! does not widen with distance from the data.

use crate::domain::{MAX_YEAR, Projection};
use crate::fit::TrendCurve;

/// Two-sided 95% normal quantile.
pub const Z_95: f64 = 1.96;

/// Default projection horizon.
pub const DEFAULT_HORIZON: i32 = MAX_YEAR;

impl Projection {
    /// Evaluate one year.
    pub fn at<M: TrendCurve + ?Sized>(model: &M, year: i32) -> Self {
        let predicted = model.predict(year as f64);
        let half_width = Z_95 * model.residual_std().abs();
        Self {
            horizon_time: year,
            predicted_value: predicted,
            lower_95: predicted - half_width,
            upper_95: predicted + half_width,
        }
    }
}

/// Lazy projection over `last_observed + 1 ..= horizon`.
///
/// Pure function of its inputs: cloning restarts from the current position,
/// and calling [`project`] again restarts from the beginning.
pub struct Projections<'a, M: ?Sized> {
    model: &'a M,
    next: i64,
    horizon: i64,
}

impl<M: ?Sized> Clone for Projections<'_, M> {
    fn clone(&self) -> Self {
        Self {
            model: self.model,
            next: self.next,
            horizon: self.horizon,
        }
    }
}

impl<M: ?Sized> std::fmt::Debug for Projections<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projections")
            .field("next", &self.next)
            .field("horizon", &self.horizon)
            .finish()
    }
}

/// Project `model` for every year after `last_observed_time` up to `horizon` inclusive.
///
/// Yields nothing when `horizon <= last_observed_time`.
pub fn project<M: TrendCurve + ?Sized>(model: &M, last_observed_time: i32, horizon: i32) -> Projections<'_, M> {
    Projections {
        model,
        next: last_observed_time as i64 + 1,
        horizon: horizon as i64,
    }
}

impl<M: TrendCurve + ?Sized> Iterator for Projections<'_, M> {
    type Item = Projection;

    fn next(&mut self) -> Option<Projection> {
        if self.next > self.horizon {
            return None;
        }
        // `next <= horizon <= i32::MAX`, so the narrowing is lossless.
        let year = self.next as i32;
        self.next += 1;
        Some(Projection::at(self.model, year))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.horizon - self.next + 1).max(0) as usize;
        (remaining, Some(remaining))
    }
}

impl<M: TrendCurve + ?Sized> ExactSizeIterator for Projections<'_, M> {}

impl<M: TrendCurve + ?Sized> std::iter::FusedIterator for Projections<'_, M> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrendModel;

    fn model(residual_std: f64) -> TrendModel {
        TrendModel {
            slope: 0.02,
            intercept: -39.0,
            residual_std,
            n_observations: 40,
        }
    }

    #[test]
    fn covers_next_year_through_horizon() {
        let m = model(0.1);
        let out: Vec<Projection> = project(&m, 2023, 2100).collect();
        assert_eq!(out.len(), 77);
        assert_eq!(out[0].horizon_time, 2024);
        assert_eq!(out[76].horizon_time, 2100);
    }

    #[test]
    fn band_is_symmetric_196_sigma() {
        let m = model(0.5);
        let p = Projection::at(&m, 2050);
        assert!((p.predicted_value - (0.02 * 2050.0 - 39.0)).abs() < 1e-12);
        assert!((p.upper_95 - p.predicted_value - 0.98).abs() < 1e-12);
        assert!((p.predicted_value - p.lower_95 - 0.98).abs() < 1e-12);
    }

    #[test]
    fn horizon_not_after_last_observation_is_empty() {
        let m = model(0.1);
        assert_eq!(project(&m, 2100, 2100).count(), 0);
        assert_eq!(project(&m, 2101, 2100).len(), 0);
    }

    #[test]
    fn is_restartable_and_exact_size() {
        let m = model(0.1);
        let mut it = project(&m, 2090, 2100);
        assert_eq!(it.len(), 10);
        it.next();
        let rest = it.clone();
        assert_eq!(rest.len(), 9);
        assert_eq!(it.collect::<Vec<_>>(), rest.collect::<Vec<_>>());
    }

    #[test]
    fn extreme_years_do_not_overflow() {
        let m = model(0.0);
        assert_eq!(project(&m, i32::MAX - 1, i32::MAX).count(), 1);
    }
}
