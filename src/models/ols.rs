use crate::errors::{AnalysisError, AnalysisResult};
use nalgebra::{DMatrix, DVector};

/// Ordinary least squares fit with the inference pieces the unit-root
/// tests need: coefficient standard errors and the Gaussian log-likelihood.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub params: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub ssr: f64,
    pub nobs: usize,
}

impl OlsFit {
    /// t-statistic of coefficient `i`.
    #[inline]
    pub fn t_value(&self, i: usize) -> f64 {
        self.params[i] / self.std_errors[i]
    }

    /// Gaussian log-likelihood at the MLE of the error variance.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        let half = n / 2.0;
        -half * (2.0 * std::f64::consts::PI).ln() - half * (self.ssr / n).ln() - half
    }

    /// Akaike information criterion, counting every column as a parameter.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.params.len() as f64
    }
}

/// Solve `y = X b + e` via the normal equations.
/// `x` is row-major: one observation per row.
pub fn fit(y: &[f64], x: &DMatrix<f64>) -> AnalysisResult<OlsFit> {
    let (n, k) = x.shape();
    if n != y.len() {
        return Err(AnalysisError::Numeric(format!(
            "design has {n} rows but response has {} values",
            y.len()
        )));
    }
    if n <= k {
        return Err(AnalysisError::InsufficientData(format!(
            "{n} observations for {k} regressors"
        )));
    }

    let y = DVector::from_column_slice(y);
    let xt = x.transpose();
    let xtx_inv = (&xt * x)
        .try_inverse()
        .ok_or_else(|| AnalysisError::Numeric("singular design matrix".into()))?;

    let params = &xtx_inv * (&xt * &y);
    let residuals = &y - x * &params;
    let ssr = residuals.dot(&residuals);

    let sigma_sq = ssr / (n - k) as f64;
    let std_errors = DVector::from_fn(k, |i, _| (sigma_sq * xtx_inv[(i, i)]).sqrt());

    Ok(OlsFit {
        params,
        std_errors,
        ssr,
        nobs: n,
    })
}

/// Closed-form simple regression `y = alpha + beta * x`.
/// Returns `(alpha, beta, r_squared)`. A constant `x` gives beta 0.
pub fn simple(x: &[f64], y: &[f64]) -> (f64, f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (0.0, 0.0, 0.0);
    }
    let nf = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / nf;
    let mean_y = y[..n].iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let beta = if sxx.abs() < 1e-300 { 0.0 } else { sxy / sxx };
    let alpha = mean_y - beta * mean_x;
    let r_squared = if sxx.abs() < 1e-300 || syy.abs() < 1e-300 {
        0.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    (alpha, beta, r_squared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_recovers_exact_line() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.5 + 0.75 * v).collect();
        let (alpha, beta, r2) = simple(&x, &y);
        assert!((alpha - 1.5).abs() < 1e-10, "alpha={alpha}");
        assert!((beta - 0.75).abs() < 1e-10, "beta={beta}");
        assert!((r2 - 1.0).abs() < 1e-10, "r2={r2}");
    }

    #[test]
    fn test_simple_constant_regressor() {
        let (alpha, beta, r2) = simple(&[2.0; 10], &[1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(beta, 0.0);
        assert!((alpha - 3.0).abs() < 1e-12);
        assert_eq!(r2, 0.0);
    }

    #[test]
    fn test_fit_matches_closed_form() {
        let x: Vec<f64> = (0..40).map(|i| ((i * 7) % 13) as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .enumerate()
            .map(|(i, v)| 2.0 - 0.5 * v + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let design = DMatrix::from_fn(x.len(), 2, |r, c| if c == 0 { 1.0 } else { x[r] });

        let fit = fit(&y, &design).unwrap();
        let (alpha, beta, _) = simple(&x, &y);
        assert!((fit.params[0] - alpha).abs() < 1e-9);
        assert!((fit.params[1] - beta).abs() < 1e-9);
        assert!(fit.std_errors.iter().all(|s| s.is_finite() && *s > 0.0));
        assert!(fit.aic().is_finite());
    }

    #[test]
    fn test_fit_rejects_singular_design() {
        let design = DMatrix::from_fn(10, 2, |_, _| 1.0);
        let y = vec![1.0; 10];
        assert!(matches!(fit(&y, &design), Err(AnalysisError::Numeric(_))));
    }

    #[test]
    fn test_fit_requires_more_rows_than_columns() {
        let design = DMatrix::from_fn(2, 2, |r, c| (r + c) as f64);
        assert!(matches!(
            fit(&[1.0, 2.0], &design),
            Err(AnalysisError::InsufficientData(_))
        ));
    }
}
