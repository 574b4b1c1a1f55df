//! Strategy performance computation.
//! All functions are pure: they take price and signal series and return
//! freshly computed metrics.

use crate::errors::{AnalysisError, AnalysisResult};
use crate::models::sample_std;
use crate::series::{AlignedPair, PriceSeries};
use crate::strategy::signals::SignalPoint;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Trading days per year, for annualization.
pub const TRADING_DAYS: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct CumulativeReturnPoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    pub cumulative_return: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PerformanceResult {
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub num_trades: usize,
    pub cumulative_returns: Vec<CumulativeReturnPoint>,
}

/// Realized returns of holding `position_{t-1}` units of the hedged spread
/// over `[t-1, t]`.
///
/// Dates missing from either price series or from `signals` are dropped
/// before returns are taken. The first joined date has no return and is
/// excluded from every statistic.
pub fn calculate_performance(
    series1: &PriceSeries,
    series2: &PriceSeries,
    signals: &[SignalPoint],
    beta: f64,
) -> AnalysisResult<PerformanceResult> {
    let pair = AlignedPair::join(series1, series2);
    let positions: BTreeMap<NaiveDate, i8> = signals.iter().map(|s| (s.date, s.position)).collect();

    let rows: Vec<(NaiveDate, f64, f64, f64)> = pair
        .dates
        .iter()
        .zip(pair.closes_1.iter().zip(&pair.closes_2))
        .filter_map(|(date, (&p1, &p2))| {
            positions.get(date).map(|&pos| (*date, p1, p2, f64::from(pos)))
        })
        .collect();

    if rows.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "{} dated rows with prices and positions, need at least 2",
            rows.len()
        )));
    }

    let strategy_returns: Vec<f64> = rows
        .windows(2)
        .map(|w| {
            let (_, prev1, prev2, prev_pos) = w[0];
            let (_, p1, p2, _) = w[1];
            let r1 = p1 / prev1 - 1.0;
            let r2 = p2 / prev2 - 1.0;
            prev_pos * (r2 - beta * r1)
        })
        .collect();

    let valid = &rows[1..];
    let n = strategy_returns.len();

    let mut cumulative_returns = Vec::with_capacity(n);
    let mut equity = 1.0;
    for ((date, ..), r) in valid.iter().zip(&strategy_returns) {
        equity *= 1.0 + r;
        cumulative_returns.push(CumulativeReturnPoint {
            date: *date,
            cumulative_return: equity,
        });
    }

    let total_return = equity - 1.0;
    let annualized_return = (1.0 + total_return).powf(TRADING_DAYS / n as f64) - 1.0;
    let volatility = if n < 2 {
        0.0
    } else {
        sample_std(&strategy_returns) * TRADING_DAYS.sqrt()
    };
    let sharpe_ratio = if volatility > 0.0 {
        annualized_return / volatility
    } else {
        0.0
    };

    let result = PerformanceResult {
        total_return,
        annualized_return,
        volatility,
        sharpe_ratio,
        max_drawdown: max_drawdown(&cumulative_returns),
        win_rate: win_rate(&strategy_returns),
        num_trades: count_position_changes(valid.iter().map(|row| row.3)),
        cumulative_returns,
    };

    tracing::debug!(
        periods = n,
        total_return = result.total_return,
        sharpe = result.sharpe_ratio,
        trades = result.num_trades,
        "performance computed"
    );

    Ok(result)
}

/// Most negative `(equity - running_peak) / running_peak`. The peak starts
/// at the first equity value, not at 1.
fn max_drawdown(curve: &[CumulativeReturnPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for point in curve {
        peak = peak.max(point.cumulative_return);
        let dd = (point.cumulative_return - peak) / peak;
        worst = worst.min(dd);
    }
    worst
}

/// Winning periods over periods with a non-zero return.
fn win_rate(returns: &[f64]) -> f64 {
    let active = returns.iter().filter(|&&r| r != 0.0).count();
    if active == 0 {
        return 0.0;
    }
    returns.iter().filter(|&&r| r > 0.0).count() as f64 / active as f64
}

/// Rows whose position differs from the row before. The first row has no
/// predecessor and always counts.
fn count_position_changes(positions: impl Iterator<Item = f64>) -> usize {
    let mut prev: Option<f64> = None;
    let mut changes = 0;
    for pos in positions {
        if prev != Some(pos) {
            changes += 1;
        }
        prev = Some(pos);
    }
    changes
}
