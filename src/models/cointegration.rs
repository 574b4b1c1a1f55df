use crate::errors::{AnalysisError, AnalysisResult};
use crate::models::adf::{self, Deterministic};
use crate::models::mackinnon::{self, CriticalValues};
use crate::models::{mean, population_std, sample_std};
use crate::models::ols;
use crate::series::{AlignedPair, PriceSeries};
use chrono::NaiveDate;

/// Minimum joined sample before any statistic is computed.
pub const MIN_OBSERVATIONS: usize = 30;

/// Below this R² shortfall the cointegrating regression is treated as a
/// perfect fit and the residual test is skipped.
const COLLINEAR_TOLERANCE: f64 = 100.0 * 1.490_116_119_384_765_6e-8;

/// Spread dispersion below this is treated as zero.
const MIN_SPREAD_STD: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CointegrationResult {
    pub is_cointegrated: bool,
    pub coint_statistic: f64,
    pub p_value: f64,
    pub critical_values: CriticalValues,
    /// Hedge ratio: slope of log(p2) on log(p1).
    pub beta: f64,
    pub alpha: f64,
    pub adf_statistic: f64,
    pub adf_p_value: f64,
    pub adf_used_lag: usize,
    pub residuals_mean: f64,
    pub residuals_std: f64,
    /// Periods for a residual shock to decay by half; `None` if non-reverting.
    pub half_life: Option<f64>,
    pub n_obs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SpreadPoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    pub spread: f64,
    pub z_score: f64,
    pub spread_mean: f64,
    pub spread_std: f64,
}

/// Engle-Granger two-step test on log prices plus the hedge-ratio fit.
///
/// The Engle-Granger p-value is the only gate on `is_cointegrated`; the
/// residual ADF test is reported for diagnostics.
pub fn test_cointegration(
    series1: &PriceSeries,
    series2: &PriceSeries,
    significance: f64,
) -> AnalysisResult<CointegrationResult> {
    let pair = AlignedPair::join(series1, series2);
    if pair.len() < MIN_OBSERVATIONS {
        return Err(AnalysisError::InsufficientData(format!(
            "{} overlapping observations for {}/{}, need at least {MIN_OBSERVATIONS}",
            pair.len(),
            series1.symbol(),
            series2.symbol()
        )));
    }

    let (log1, log2) = pair.log_closes();
    let n = pair.len();

    let (coint_statistic, p_value) = engle_granger(&log1, &log2)?;
    let critical_values = mackinnon::critical_values(2, n - 1);

    let (alpha, beta, _) = ols::simple(&log1, &log2);
    let residuals: Vec<f64> = log1
        .iter()
        .zip(&log2)
        .map(|(x, y)| y - (alpha + beta * x))
        .collect();

    // Diagnostic only: a degenerate residual regression must not fail the test.
    let (adf_statistic, adf_used_lag) = match adf::adf(&residuals, Deterministic::Constant, None) {
        Ok(reg) => (reg.statistic, reg.used_lag),
        Err(AnalysisError::Numeric(e)) => {
            tracing::warn!(error = %e, "residual ADF regression is degenerate");
            (f64::NAN, 0)
        }
        Err(e) => return Err(e),
    };
    let adf_p_value = mackinnon::p_value(adf_statistic, 1);

    let result = CointegrationResult {
        is_cointegrated: p_value < significance,
        coint_statistic,
        p_value,
        critical_values,
        beta,
        alpha,
        adf_statistic,
        adf_p_value,
        adf_used_lag,
        residuals_mean: mean(&residuals),
        residuals_std: population_std(&residuals),
        half_life: adf::half_life(&residuals),
        n_obs: n,
    };

    tracing::info!(
        pair = %format!("{}/{}", series1.symbol(), series2.symbol()),
        n_obs = n,
        stat = result.coint_statistic,
        p_value = result.p_value,
        beta = result.beta,
        cointegrated = result.is_cointegrated,
        "cointegration test complete"
    );

    Ok(result)
}

/// Regress `y0` on `[1, y1]` and run a no-constant ADF on the residuals.
/// Returns (statistic, p-value) against the two-variable MacKinnon surface.
fn engle_granger(y0: &[f64], y1: &[f64]) -> AnalysisResult<(f64, f64)> {
    let (c, b, r_squared) = ols::simple(y1, y0);

    if r_squared >= 1.0 - COLLINEAR_TOLERANCE {
        tracing::warn!(r_squared, "series are perfectly collinear; cointegration is trivial");
        return Ok((f64::NEG_INFINITY, 0.0));
    }

    let residuals: Vec<f64> = y0.iter().zip(y1).map(|(a, x)| a - c - b * x).collect();
    let reg = adf::adf(&residuals, Deterministic::None, None)?;
    tracing::debug!(lag = reg.used_lag, nobs = reg.nobs, stat = reg.statistic, "engle-granger residual ADF");

    Ok((reg.statistic, mackinnon::p_value(reg.statistic, 2)))
}

/// Hedged log spread `ln(p2) - beta·ln(p1)` and its full-sample z-score.
///
/// Uses the sample standard deviation. If the spread has no dispersion
/// (std below `MIN_SPREAD_STD` or non-finite) every z-score is 0 and
/// `spread_std` reports 0, which keeps the signal generator flat.
pub fn calculate_spread(
    series1: &PriceSeries,
    series2: &PriceSeries,
    beta: f64,
) -> AnalysisResult<Vec<SpreadPoint>> {
    let pair = AlignedPair::join(series1, series2);
    if pair.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "no overlapping dates for {}/{}",
            series1.symbol(),
            series2.symbol()
        )));
    }

    let (log1, log2) = pair.log_closes();
    let spread: Vec<f64> = log1.iter().zip(&log2).map(|(x, y)| y - beta * x).collect();

    let spread_mean = mean(&spread);
    let std = sample_std(&spread);
    let degenerate = !(std.is_finite() && std >= MIN_SPREAD_STD);
    if degenerate {
        tracing::warn!(n = spread.len(), "spread has no dispersion; z-scores set to 0");
    }
    let spread_std = if degenerate { 0.0 } else { std };

    Ok(pair
        .dates
        .iter()
        .zip(&spread)
        .map(|(&date, &s)| SpreadPoint {
            date,
            spread: s,
            z_score: if degenerate { 0.0 } else { (s - spread_mean) / spread_std },
            spread_mean,
            spread_std,
        })
        .collect())
}
