//! Trend fitting.
//!
//! Responsibilities:
//!
//! - linear and quadratic least squares over any `Observation` slice
//! - per-entity linear fits (parallel)
//! - the `TrendCurve` seam consumed by the projector

pub mod entity;
pub mod linear;
pub mod polynomial;
pub mod quadratic;

pub use entity::*;
pub use linear::*;
pub use polynomial::*;
pub use quadratic::*;

use crate::domain::{QuadraticModel, TrendModel};
use crate::math::polyval;

/// A fitted curve that can be evaluated at a (possibly future) year.
pub trait TrendCurve {
    fn predict(&self, year: f64) -> f64;

    /// Population standard deviation of the fit residuals.
    fn residual_std(&self) -> f64;
}

impl TrendCurve for TrendModel {
    fn predict(&self, year: f64) -> f64 {
        self.slope * year + self.intercept
    }

    fn residual_std(&self) -> f64 {
        self.residual_std
    }
}

impl TrendCurve for QuadraticModel {
    fn predict(&self, year: f64) -> f64 {
        polyval(&self.centered_coefficients, year - self.center)
    }

    fn residual_std(&self) -> f64 {
        self.residual_std
    }
}
