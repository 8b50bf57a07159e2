//! Polynomial design rows on centred time.
//!
//! Raw years make `t²` about 4·10⁶ while the intercept column is 1, which ruins
//! the conditioning of the design matrix. Every row is therefore built from
//! `u = t - center`, with `center` the mean observed year.

/// Fill `out` with `[1, u, u², ...]`; `out.len()` is the number of coefficients.
pub fn fill_polynomial_row(u: f64, out: &mut [f64]) {
    let mut power = 1.0;
    for slot in out.iter_mut() {
        *slot = power;
        power *= u;
    }
}

/// Evaluate `Σ c_k u^k` (ascending coefficients) with Horner's rule.
pub fn polyval(coefficients: &[f64], u: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * u + c)
}

/// Re-express ascending coefficients in `u = t - center` as coefficients in `t`.
///
/// Supports up to degree 2, which is all the trend fitter produces.
pub fn uncenter_quadratic(centered: [f64; 3], center: f64) -> [f64; 3] {
    let [a, b, q] = centered;
    [
        a - b * center + q * center * center,
        b - 2.0 * q * center,
        q,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomial_row_powers() {
        let mut row = [0.0; 3];
        fill_polynomial_row(3.0, &mut row);
        assert_eq!(row, [1.0, 3.0, 9.0]);
    }

    #[test]
    fn polyval_matches_direct_evaluation() {
        let c = [1.0, -2.0, 0.5];
        let u = 4.0;
        assert!((polyval(&c, u) - (1.0 - 8.0 + 8.0)).abs() < 1e-12);
    }

    #[test]
    fn uncentering_preserves_values() {
        let centered = [14.0, 0.02, 0.0003];
        let center = 1990.0;
        let raw = uncenter_quadratic(centered, center);
        for t in [1950.0, 1990.0, 2020.0] {
            let direct = polyval(&raw, t);
            let via_center = polyval(&centered, t - center);
            assert!((direct - via_center).abs() < 1e-6, "t={t}: {direct} vs {via_center}");
        }
    }
}
