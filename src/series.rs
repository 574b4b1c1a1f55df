use crate::errors::{AnalysisError, AnalysisResult};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// One daily close. Field names follow the dashboard's wire format.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PricePoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Close")]
    pub close: f64,
}

/// Daily closes for one symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts by date and validates. Closes must be finite and positive
    /// (they are log-transformed downstream); dates must be unique.
    pub fn new(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> AnalysisResult<Self> {
        let symbol = symbol.into();

        if let Some(bad) = points.iter().find(|p| !(p.close.is_finite() && p.close > 0.0)) {
            return Err(AnalysisError::InvalidInput(format!(
                "{symbol}: non-positive close {} on {}",
                bad.close, bad.date
            )));
        }

        points.sort_by_key(|p| p.date);
        if let Some(w) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(AnalysisError::InvalidInput(format!(
                "{symbol}: duplicate date {}",
                w[0].date
            )));
        }

        Ok(Self { symbol, points })
    }

    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[inline]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Inner join of two series on date. Column-oriented, ascending by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedPair {
    pub dates: Vec<NaiveDate>,
    pub closes_1: Vec<f64>,
    pub closes_2: Vec<f64>,
}

impl AlignedPair {
    /// Merge-join over the two sorted series. O(n + m), no hashing.
    pub fn join(a: &PriceSeries, b: &PriceSeries) -> Self {
        let (xs, ys) = (a.points(), b.points());
        let cap = xs.len().min(ys.len());
        let mut out = Self {
            dates: Vec::with_capacity(cap),
            closes_1: Vec::with_capacity(cap),
            closes_2: Vec::with_capacity(cap),
        };

        let (mut i, mut j) = (0, 0);
        while i < xs.len() && j < ys.len() {
            match xs[i].date.cmp(&ys[j].date) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    out.dates.push(xs[i].date);
                    out.closes_1.push(xs[i].close);
                    out.closes_2.push(ys[j].close);
                    i += 1;
                    j += 1;
                }
            }
        }
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn log_closes(&self) -> (Vec<f64>, Vec<f64>) {
        (
            self.closes_1.iter().map(|p| p.ln()).collect(),
            self.closes_2.iter().map(|p| p.ln()).collect(),
        )
    }
}

/// Deterministic synthetic price data shared by the unit tests.
#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// 64-bit linear congruential generator with fixed seeds.
    pub struct Lcg(u64);

    impl Lcg {
        pub fn new(seed: u64) -> Self {
            Self(seed)
        }

        /// Uniform in [0, 1).
        pub fn next_f64(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }

        /// Approximately standard normal (Irwin-Hall with 12 draws).
        pub fn next_gauss(&mut self) -> f64 {
            (0..12).map(|_| self.next_f64()).sum::<f64>() - 6.0
        }
    }

    pub fn day(offset: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 2)
            .map(|d| d + chrono::Days::new(offset as u64))
            .expect("valid fixture date")
    }

    pub fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint { date: day(i), close })
            .collect();
        PriceSeries::new(symbol, points).expect("valid fixture series")
    }

    /// A random walk and a second leg tied to it by a stationary AR(1) spread.
    pub fn cointegrated_pair(n: usize, seed: u64) -> (PriceSeries, PriceSeries) {
        let mut rng = Lcg::new(seed);
        let mut log_x = 4.0_f64;
        let mut spread = 0.0_f64;
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for _ in 0..n {
            log_x += 0.015 * rng.next_gauss();
            spread = 0.5 * spread + 0.01 * rng.next_gauss();
            xs.push(log_x.exp());
            ys.push((0.3 + 0.8 * log_x + spread).exp());
        }
        (series("AAA", &xs), series("BBB", &ys))
    }

    /// Two independent random walks.
    pub fn independent_pair(n: usize, seed: u64) -> (PriceSeries, PriceSeries) {
        let mut rng = Lcg::new(seed);
        let (mut a, mut b) = (4.0_f64, 3.0_f64);
        let mut xs = Vec::with_capacity(n);
        let mut ys = Vec::with_capacity(n);
        for _ in 0..n {
            a += 0.02 * rng.next_gauss();
            b += 0.02 * rng.next_gauss();
            xs.push(a.exp());
            ys.push(b.exp());
        }
        (series("AAA", &xs), series("BBB", &ys))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_new_sorts_by_date() {
        let s = PriceSeries::new(
            "X",
            vec![
                PricePoint { date: day(2), close: 3.0 },
                PricePoint { date: day(0), close: 1.0 },
                PricePoint { date: day(1), close: 2.0 },
            ],
        )
        .unwrap();
        let closes: Vec<f64> = s.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rejects_duplicate_dates_and_bad_closes() {
        let dup = PriceSeries::new(
            "X",
            vec![
                PricePoint { date: day(0), close: 1.0 },
                PricePoint { date: day(0), close: 2.0 },
            ],
        );
        assert!(matches!(dup, Err(AnalysisError::InvalidInput(_))));

        let neg = PriceSeries::new("X", vec![PricePoint { date: day(0), close: -1.0 }]);
        assert!(matches!(neg, Err(AnalysisError::InvalidInput(_))));

        let nan = PriceSeries::new("X", vec![PricePoint { date: day(0), close: f64::NAN }]);
        assert!(matches!(nan, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_join_keeps_only_shared_dates() {
        let a = PriceSeries::new(
            "A",
            vec![
                PricePoint { date: day(0), close: 10.0 },
                PricePoint { date: day(1), close: 11.0 },
                PricePoint { date: day(3), close: 13.0 },
            ],
        )
        .unwrap();
        let b = PriceSeries::new(
            "B",
            vec![
                PricePoint { date: day(1), close: 21.0 },
                PricePoint { date: day(2), close: 22.0 },
                PricePoint { date: day(3), close: 23.0 },
            ],
        )
        .unwrap();

        let pair = AlignedPair::join(&a, &b);
        assert_eq!(pair.dates, vec![day(1), day(3)]);
        assert_eq!(pair.closes_1, vec![11.0, 13.0]);
        assert_eq!(pair.closes_2, vec![21.0, 23.0]);
    }
}
