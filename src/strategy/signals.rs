use crate::models::cointegration::SpreadPoint;
use chrono::NaiveDate;

/// Held exposure to the spread `ln(p2) - beta·ln(p1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    /// Long the spread: expecting it to rise back to its mean.
    Long,
    /// Short the spread: expecting it to fall back to its mean.
    Short,
}

impl Position {
    #[inline]
    pub fn as_i8(self) -> i8 {
        match self {
            Position::Flat => 0,
            Position::Long => 1,
            Position::Short => -1,
        }
    }
}

/// One step of the scan. `signal` is the action taken at this date,
/// `position` the state held after it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SignalPoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    pub z_score: f64,
    pub signal: i8,
    pub position: i8,
    pub trade_reason: String,
}

/// Entry/exit bands on |z|.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub entry: f64,
    pub exit: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { entry: 2.0, exit: 0.5 }
    }
}

/// Mealy transition: (state, z) -> (next state, signal, reason).
#[inline]
fn step(current: Position, z: f64, th: Thresholds) -> (Position, i8, String) {
    match current {
        Position::Flat if z > th.entry => (Position::Short, -1, format!("Short spread (z={z:.2})")),
        Position::Flat if z < -th.entry => (Position::Long, 1, format!("Long spread (z={z:.2})")),
        Position::Flat => (Position::Flat, 0, String::new()),
        held if z.abs() < th.exit => (
            Position::Flat,
            -held.as_i8(),
            format!("Close position (z={z:.2})"),
        ),
        held => (held, 0, String::new()),
    }
}

/// Causal left-to-right scan over the spread. Each output depends on the
/// position carried from the previous date, so this is a fold, not a map.
///
/// Thresholds are not validated: with `exit >= entry` a position may close
/// and reopen on every step, or never close. NaN z-scores never trigger
/// an entry or an exit.
pub fn generate_signals(spread: &[SpreadPoint], thresholds: Thresholds) -> Vec<SignalPoint> {
    let (_, signals) = spread.iter().fold(
        (Position::Flat, Vec::with_capacity(spread.len())),
        |(current, mut out), point| {
            let (next, signal, trade_reason) = step(current, point.z_score, thresholds);
            out.push(SignalPoint {
                date: point.date,
                z_score: point.z_score,
                signal,
                position: next.as_i8(),
                trade_reason,
            });
            (next, out)
        },
    );

    tracing::debug!(
        points = signals.len(),
        actions = signals.iter().filter(|s| s.signal != 0).count(),
        "signals generated"
    );
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::fixtures::day;

    fn spread_from_z(zs: &[f64]) -> Vec<SpreadPoint> {
        zs.iter()
            .enumerate()
            .map(|(i, &z)| SpreadPoint {
                date: day(i),
                spread: z,
                z_score: z,
                spread_mean: 0.0,
                spread_std: 1.0,
            })
            .collect()
    }

    fn columns(signals: &[SignalPoint]) -> (Vec<i8>, Vec<i8>) {
        (
            signals.iter().map(|s| s.signal).collect(),
            signals.iter().map(|s| s.position).collect(),
        )
    }

    #[test]
    fn test_reference_scenario() {
        let spread = spread_from_z(&[0.1, 2.5, 2.1, 0.3, -2.6, 0.05]);
        let out = generate_signals(&spread, Thresholds::default());
        let (signals, positions) = columns(&out);
        assert_eq!(signals, vec![0, -1, 0, 1, 1, -1]);
        assert_eq!(positions, vec![0, -1, -1, 0, 1, 0]);
        assert_eq!(out[1].trade_reason, "Short spread (z=2.50)");
        assert_eq!(out[3].trade_reason, "Close position (z=0.30)");
        assert_eq!(out[4].trade_reason, "Long spread (z=-2.60)");
        assert!(out[2].trade_reason.is_empty());
    }

    #[test]
    fn test_quiet_spread_stays_flat() {
        let spread = spread_from_z(&[0.0, 1.9, -1.99, 2.0, -2.0, 0.7, -1.2]);
        let (signals, positions) = columns(&generate_signals(&spread, Thresholds::default()));
        assert!(signals.iter().all(|&s| s == 0));
        assert!(positions.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_position_holds_through_further_excursions() {
        // once short, neither a deeper move nor an opposite extreme changes it
        let spread = spread_from_z(&[2.4, 3.5, -3.0, 0.8, -0.6, 0.49]);
        let (signals, positions) = columns(&generate_signals(&spread, Thresholds::default()));
        assert_eq!(positions, vec![-1, -1, -1, -1, -1, 0]);
        assert_eq!(signals, vec![-1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_inverted_thresholds_reopen_every_step() {
        let th = Thresholds { entry: 0.5, exit: 2.0 };
        let spread = spread_from_z(&[1.0, 1.0, 1.0, 1.0]);
        let (signals, positions) = columns(&generate_signals(&spread, th));
        assert_eq!(positions, vec![-1, 0, -1, 0]);
        assert_eq!(signals, vec![-1, 1, -1, 1]);
    }

    #[test]
    fn test_nan_zscore_is_inert() {
        let spread = spread_from_z(&[f64::NAN, 2.5, f64::NAN, 0.1]);
        let (_, positions) = columns(&generate_signals(&spread, Thresholds::default()));
        assert_eq!(positions, vec![0, -1, -1, 0]);
    }

    #[test]
    fn test_empty_input() {
        assert!(generate_signals(&[], Thresholds::default()).is_empty());
    }
}
