pub mod adf;
pub mod cointegration;
pub mod mackinnon;
pub mod ols;

/// Arithmetic mean. 0 for an empty slice.
#[inline]
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Standard deviation with `ddof` degrees of freedom removed.
/// NaN when fewer than `ddof + 1` values.
fn std_dev(xs: &[f64], ddof: usize) -> f64 {
    if xs.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(xs);
    let ss = xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>();
    (ss / (xs.len() - ddof) as f64).sqrt()
}

/// Population standard deviation (divide by n).
#[inline]
pub fn population_std(xs: &[f64]) -> f64 {
    std_dev(xs, 0)
}

/// Sample standard deviation (divide by n - 1).
#[inline]
pub fn sample_std(xs: &[f64]) -> f64 {
    std_dev(xs, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_variants() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&xs) - 5.0).abs() < 1e-12);
        assert!((population_std(&xs) - 2.0).abs() < 1e-12);
        assert!((sample_std(&xs) - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert!(sample_std(&[1.0]).is_nan());
        assert!(population_std(&[]).is_nan());
        assert_eq!(population_std(&[3.0]), 0.0);
    }
}
