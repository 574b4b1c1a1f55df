use crate::errors::{AnalysisError, AnalysisResult};
use crate::models::ols;
use nalgebra::DMatrix;

/// Deterministic terms in the test regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deterministic {
    /// No constant. Used on regression residuals, which are mean-zero.
    None,
    Constant,
}

impl Deterministic {
    #[inline]
    fn n_terms(self) -> usize {
        match self {
            Deterministic::None => 0,
            Deterministic::Constant => 1,
        }
    }
}

/// Outcome of the Augmented Dickey-Fuller regression
///
///   Δx_t = [c] + γ·x_{t-1} + Σ_{i=1..p} φ_i·Δx_{t-i} + ε_t
///
/// `statistic` is the t-value of γ. p-values depend on how many series
/// produced `x`, so they are left to the caller (see `mackinnon`).
#[derive(Debug, Clone, Copy)]
pub struct AdfRegression {
    pub statistic: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

/// Schwert-style default lag ceiling: ⌈12·(n/100)^¼⌉, capped so the
/// longest candidate regression keeps enough degrees of freedom.
pub fn default_max_lag(n: usize, det: Deterministic) -> Option<usize> {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let cap = (n / 2).checked_sub(det.n_terms() + 1)?;
    Some(schwert.min(cap))
}

/// Run the ADF regression on `x`, choosing the number of lagged
/// differences in `0..=max_lag` by minimum AIC. All candidates are fitted
/// on the common sample implied by `max_lag`; the winner is re-fitted on
/// the longest sample its own lag allows.
pub fn adf(x: &[f64], det: Deterministic, max_lag: Option<usize>) -> AnalysisResult<AdfRegression> {
    let max_lag = match max_lag {
        Some(l) => l,
        None => default_max_lag(x.len(), det).ok_or_else(|| {
            AnalysisError::InsufficientData(format!("{} observations too few for ADF", x.len()))
        })?,
    };

    let diff: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    if diff.len() <= max_lag + det.n_terms() + 1 {
        return Err(AnalysisError::InsufficientData(format!(
            "{} observations too few for ADF with {max_lag} lags",
            x.len()
        )));
    }

    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=max_lag {
        let (y, design) = lagged_design(x, &diff, det, max_lag, lag);
        let fit = match ols::fit(&y, &design) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(lag, error = %e, "skipping ADF lag candidate");
                continue;
            }
        };
        let aic = fit.aic();
        // Strict `<` keeps the shortest lag on ties.
        if best.map_or(true, |(b, _)| aic < b) {
            best = Some((aic, lag));
        }
    }

    let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);
    let (y, design) = lagged_design(x, &diff, det, used_lag, used_lag);
    let fit = ols::fit(&y, &design)?;

    Ok(AdfRegression {
        statistic: fit.t_value(0),
        used_lag,
        nobs: y.len(),
    })
}

/// Build the response Δx_t and regressors `[x_{t-1}, Δx_{t-1}..Δx_{t-lag}, (1)]`
/// for t in `sample_lag..diff.len()`. The level always sits in column 0.
fn lagged_design(
    x: &[f64],
    diff: &[f64],
    det: Deterministic,
    sample_lag: usize,
    lag: usize,
) -> (Vec<f64>, DMatrix<f64>) {
    let rows = diff.len() - sample_lag;
    let cols = 1 + lag + det.n_terms();

    let y = diff[sample_lag..].to_vec();
    let design = DMatrix::from_fn(rows, cols, |r, c| {
        let t = sample_lag + r;
        match c {
            0 => x[t],
            c if c <= lag => diff[t - c],
            _ => 1.0,
        }
    });
    (y, design)
}

/// Mean-reversion half-life from `Δx_t = c + γ·x_{t-1}`: `-ln 2 / ln(1 + γ)`.
/// `None` if the series does not revert (γ outside (-1, 0)).
pub fn half_life(x: &[f64]) -> Option<f64> {
    if x.len() < 3 {
        return None;
    }
    let lagged = &x[..x.len() - 1];
    let diff: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let (_, gamma, _) = ols::simple(lagged, &diff);

    if gamma >= 0.0 || gamma <= -1.0 {
        return None;
    }
    let hl = -std::f64::consts::LN_2 / (1.0 + gamma).ln();
    hl.is_finite().then_some(hl)
}
