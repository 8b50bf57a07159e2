//! Trend classification and the one-line summary sentence.
//!
//! Classification is a sign test against `epsilon`. With the default
//! `epsilon = 0` any non-zero slope, including floating-point noise, is
//! reported as ascending or descending. Pass a positive `epsilon` to get a
//! dead band.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::YearRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Ascending,
    Descending,
    Stable,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Ascending => "ascending",
            Trend::Descending => "descending",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `slope > ε` → ascending, `slope < -ε` → descending, otherwise stable.
///
/// A NaN slope is stable.
pub fn classify(slope: f64, epsilon: f64) -> Trend {
    if slope > epsilon {
        Trend::Ascending
    } else if slope < -epsilon {
        Trend::Descending
    } else {
        Trend::Stable
    }
}

/// Natural-language sentence for a fitted slope.
///
/// `magnitude` is printed as given (usually the slope, per year).
pub fn format_summary(trend: Trend, magnitude: f64, period: YearRange, unit: &str) -> String {
    let rate = fmt_rate(magnitude, unit);
    match trend {
        Trend::Ascending => format!(
            "Between {} and {} the series shows an ascending trend of {rate}.",
            period.from, period.to
        ),
        Trend::Descending => format!(
            "Between {} and {} the series shows a descending trend of {rate}.",
            period.from, period.to
        ),
        Trend::Stable => format!(
            "Between {} and {} the series remained stable ({rate}).",
            period.from, period.to
        ),
    }
}

fn fmt_rate(magnitude: f64, unit: &str) -> String {
    if unit.is_empty() {
        format!("{magnitude:.4} per year")
    } else {
        format!("{magnitude:.4} {unit}/year")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_zero_is_the_only_stable_slope() {
        assert_eq!(classify(0.0, 0.0), Trend::Stable);
        assert_eq!(classify(1e-9, 0.0), Trend::Ascending);
        assert_eq!(classify(-1e-9, 0.0), Trend::Descending);
        assert_eq!(classify(f64::NAN, 0.0), Trend::Stable);
    }

    #[test]
    fn epsilon_adds_a_dead_band() {
        assert_eq!(classify(1e-9, 1e-6), Trend::Stable);
        assert_eq!(classify(-1e-9, 1e-6), Trend::Stable);
        assert_eq!(classify(2e-6, 1e-6), Trend::Ascending);
    }

    #[test]
    fn summary_carries_trend_and_magnitude() {
        let text = format_summary(Trend::Ascending, 0.2, YearRange::new(2000, 2002), "°C");
        assert_eq!(
            text,
            "Between 2000 and 2002 the series shows an ascending trend of 0.2000 °C/year."
        );
        let text = format_summary(Trend::Stable, 0.0, YearRange::new(1990, 2000), "");
        assert!(text.contains("remained stable (0.0000 per year)"));
    }
}
