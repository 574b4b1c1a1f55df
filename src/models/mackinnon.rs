/// MacKinnon response surfaces for Dickey-Fuller type statistics,
/// constant-only deterministic term.
///
/// p-values: MacKinnon (1994) "Approximate asymptotic distribution functions
/// for unit-root and cointegration tests". The statistic is mapped through a
/// polynomial and then the standard normal CDF, with a small-p and a large-p
/// branch split at `TAU_STAR`.
///
/// Critical values: MacKinnon (2010) "Critical values for cointegration
/// tests", finite-sample corrected as b0 + b1/T + b2/T^2 + b3/T^3.
///
/// Row index is `n_vars - 1`: 1 for a plain ADF test, 2 for a two-series
/// Engle-Granger test.
use statrs::distribution::{ContinuousCDF, Normal};

pub const MAX_VARS: usize = 2;

const TAU_MAX: [f64; MAX_VARS] = [2.74, 0.92];
const TAU_MIN: [f64; MAX_VARS] = [-18.83, -18.86];
const TAU_STAR: [f64; MAX_VARS] = [-1.61, -2.62];

const TAU_SMALL_P: [[f64; 3]; MAX_VARS] = [
    [2.1659, 1.4412, 3.8269e-2],
    [2.92, 1.5012, 3.9796e-2],
];

const TAU_LARGE_P: [[f64; 4]; MAX_VARS] = [
    [1.7339, 0.93202, -0.12745, -0.010368],
    [2.1945, 0.64695, -0.29198, -0.042377],
];

/// [1%, 5%, 10%] x [b0, b1, b2, b3]
const TAU_CRIT_2010: [[[f64; 4]; 3]; MAX_VARS] = [
    [
        [-3.43035, -6.5393, -16.786, -79.433],
        [-2.86154, -2.8903, -4.234, -40.040],
        [-2.56677, -1.5384, -2.809, 0.0],
    ],
    [
        [-3.89644, -10.9519, -33.527, 0.0],
        [-3.33613, -6.1101, -6.823, 0.0],
        [-3.04445, -4.2412, -2.720, 0.0],
    ],
];

/// Critical values at the 1%, 5% and 10% levels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CriticalValues {
    #[serde(rename = "1%")]
    pub one_pct: f64,
    #[serde(rename = "5%")]
    pub five_pct: f64,
    #[serde(rename = "10%")]
    pub ten_pct: f64,
}

/// Evaluate `c0 + c1*x + c2*x^2 + ...` (Horner).
#[inline]
fn poly(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[inline]
fn row(n_vars: usize) -> usize {
    n_vars.clamp(1, MAX_VARS) - 1
}

/// Approximate p-value of a unit-root / no-cointegration null.
/// A NaN statistic carries no evidence against the null and maps to 1.
pub fn p_value(stat: f64, n_vars: usize) -> f64 {
    let i = row(n_vars);
    if stat.is_nan() {
        return 1.0;
    }
    if stat > TAU_MAX[i] {
        return 1.0;
    }
    if stat < TAU_MIN[i] {
        return 0.0;
    }

    let z = if stat <= TAU_STAR[i] {
        poly(&TAU_SMALL_P[i], stat)
    } else {
        poly(&TAU_LARGE_P[i], stat)
    };

    Normal::standard().cdf(z)
}

/// Finite-sample critical values for `nobs` observations.
pub fn critical_values(n_vars: usize, nobs: usize) -> CriticalValues {
    let table = &TAU_CRIT_2010[row(n_vars)];
    let inv_t = 1.0 / nobs.max(1) as f64;
    CriticalValues {
        one_pct: poly(&table[0], inv_t),
        five_pct: poly(&table[1], inv_t),
        ten_pct: poly(&table[2], inv_t),
    }
}
