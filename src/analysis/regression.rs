//! Ordinary least squares regressions with the usual summary statistics.
//!
//! Three fits feed the report:
//! - `rank ~ poly(total, d)`: the polynomial trend drawn over the scatter plot
//! - `rank ~ HP + Atk + Def + SpA + SpD + Speed` (with intercept)
//! - `rank ~ s_HP + … + s_Speed` without intercept, since the six ratios
//!   already sum to one and an intercept would be collinear with them

use nalgebra::{DMatrix, DVector};

use crate::error::AppError;
use crate::math::{mean, normal_inverse, solve_least_squares, std_dev};

/// One estimated coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
}

/// Fitted linear model summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Regression {
    pub label: String,
    pub intercept: bool,
    pub coefficients: Vec<Coefficient>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Residual standard error.
    pub sigma: f64,
    pub n: usize,
    /// Residual degrees of freedom.
    pub df: usize,
}

impl Regression {
    pub fn estimates(&self) -> Vec<f64> {
        self.coefficients.iter().map(|c| c.estimate).collect()
    }
}

/// Polynomial fit on a standardized predictor `z = (x - center) / scale`.
///
/// Fitting on `z` instead of raw `x` keeps the design well conditioned for
/// stat totals in the hundreds.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyFit {
    pub degree: usize,
    pub center: f64,
    pub scale: f64,
    pub model: Regression,
}

impl PolyFit {
    pub fn predict(&self, x: f64) -> f64 {
        let z = (x - self.center) / self.scale;
        self.model
            .coefficients
            .iter()
            .enumerate()
            .map(|(power, c)| c.estimate * z.powi(power as i32))
            .sum()
    }
}

/// Fit `y ~ columns` by least squares.
///
/// `terms` names the columns (same order). An intercept column is prepended
/// when `intercept` is set.
pub fn fit_linear(
    label: &str,
    terms: &[String],
    columns: &[Vec<f64>],
    y: &[f64],
    intercept: bool,
) -> Result<Regression, AppError> {
    if terms.len() != columns.len() {
        return Err(AppError::analysis(format!(
            "{label}: {} term names for {} columns",
            terms.len(),
            columns.len()
        )));
    }
    let n = y.len();
    if let Some(col) = columns.iter().find(|c| c.len() != n) {
        return Err(AppError::analysis(format!(
            "{label}: column length {} does not match response length {n}",
            col.len()
        )));
    }

    let p = columns.len() + usize::from(intercept);
    if p == 0 {
        return Err(AppError::analysis(format!("{label}: model has no terms")));
    }
    if n <= p {
        return Err(AppError::analysis(format!(
            "{label}: {n} observations are not enough for {p} parameters"
        )));
    }

    let x = DMatrix::from_fn(n, p, |i, j| {
        if intercept {
            if j == 0 { 1.0 } else { columns[j - 1][i] }
        } else {
            columns[j][i]
        }
    });
    let yv = DVector::from_column_slice(y);

    let cov_unscaled = normal_inverse(&x)
        .ok_or_else(|| AppError::analysis(format!("{label}: design matrix is singular")))?;
    let beta = solve_least_squares(&x, &yv)
        .ok_or_else(|| AppError::analysis(format!("{label}: least squares solve failed")))?;

    let fitted = &x * &beta;
    let sse: f64 = yv
        .iter()
        .zip(fitted.iter())
        .map(|(obs, fit)| (obs - fit).powi(2))
        .sum();

    let sst = if intercept {
        let m = mean(y).unwrap_or(0.0);
        y.iter().map(|v| (v - m).powi(2)).sum::<f64>()
    } else {
        y.iter().map(|v| v * v).sum::<f64>()
    };

    let df = n - p;
    let sigma2 = sse / df as f64;
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { f64::NAN };
    let df_total = (n - usize::from(intercept)) as f64;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * df_total / df as f64;

    let mut names = Vec::with_capacity(p);
    if intercept {
        names.push("(Intercept)".to_string());
    }
    names.extend(terms.iter().cloned());

    let coefficients = names
        .into_iter()
        .enumerate()
        .map(|(j, term)| {
            let std_error = (sigma2 * cov_unscaled[(j, j)]).sqrt();
            let estimate = beta[j];
            Coefficient {
                term,
                estimate,
                std_error,
                t_value: estimate / std_error,
            }
        })
        .collect();

    let fit = Regression {
        label: label.to_string(),
        intercept,
        coefficients,
        r_squared,
        adj_r_squared,
        sigma: sigma2.sqrt(),
        n,
        df,
    };

    if !fit.estimates().iter().all(|v| v.is_finite()) {
        return Err(AppError::analysis(format!("{label}: non-finite coefficient")));
    }
    Ok(fit)
}

/// Fit `y ~ poly(x, degree)` on the standardized predictor.
pub fn fit_polynomial(
    label: &str,
    x: &[f64],
    y: &[f64],
    degree: usize,
) -> Result<PolyFit, AppError> {
    if degree == 0 {
        return Err(AppError::analysis(format!("{label}: polynomial degree must be >= 1")));
    }
    let center = mean(x).ok_or_else(|| AppError::analysis(format!("{label}: no observations")))?;
    let scale = std_dev(x)
        .filter(|s| *s > 0.0)
        .ok_or_else(|| AppError::analysis(format!("{label}: predictor has no spread")))?;

    let z: Vec<f64> = x.iter().map(|v| (v - center) / scale).collect();
    let columns: Vec<Vec<f64>> = (1..=degree)
        .map(|power| z.iter().map(|v| v.powi(power as i32)).collect())
        .collect();
    let terms: Vec<String> = (1..=degree)
        .map(|power| if power == 1 { "z".to_string() } else { format!("z^{power}") })
        .collect();

    let model = fit_linear(label, &terms, &columns, y, true)?;
    Ok(PolyFit {
        degree,
        center,
        scale,
        model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_relationship() {
        let x1 = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let x2 = vec![2.0, 1.0, 4.0, 3.0, 6.0];
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.0 + 2.0 * a - 0.5 * b).collect();

        let fit = fit_linear("exact", &["x1".into(), "x2".into()], &[x1, x2], &y, true).unwrap();
        let b = fit.estimates();
        assert!((b[0] - 1.0).abs() < 1e-9);
        assert!((b[1] - 2.0).abs() < 1e-9);
        assert!((b[2] + 0.5).abs() < 1e-9);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert_eq!(fit.df, 2);
        assert_eq!(fit.coefficients[0].term, "(Intercept)");
    }

    #[test]
    fn noisy_fit_reports_standard_errors() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![1.1, 1.9, 3.2, 3.8, 5.1, 6.0];
        let fit = fit_linear("noisy", &["x".into()], &[x], &y, true).unwrap();
        assert!(fit.r_squared > 0.98 && fit.r_squared < 1.0);
        assert!(fit.adj_r_squared < fit.r_squared);
        assert!(fit.sigma > 0.0);
        assert!(fit.coefficients[1].std_error > 0.0);
        assert!(fit.coefficients[1].t_value > 10.0);
    }

    #[test]
    fn too_few_observations_is_an_analysis_error() {
        let err =
            fit_linear("tiny", &["x".into()], &[vec![1.0, 2.0]], &[1.0, 2.0], true).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Analysis);
    }

    #[test]
    fn collinear_design_is_rejected() {
        let x1 = vec![1.0, 2.0, 3.0, 4.0];
        let x2: Vec<f64> = x1.iter().map(|v| v * 2.0).collect();
        let y = vec![1.0, 3.0, 2.0, 5.0];
        assert!(fit_linear("collinear", &["a".into(), "b".into()], &[x1, x2], &y, true).is_err());
    }

    #[test]
    fn polynomial_fit_predicts_on_original_scale() {
        let x: Vec<f64> = (0..10).map(|i| 300.0 + 40.0 * i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 5.0 + 0.01 * (v - 480.0).powi(2)).collect();

        let fit = fit_polynomial("quad", &x, &y, 2).unwrap();
        assert_eq!(fit.model.coefficients.len(), 3);
        for (xi, yi) in x.iter().zip(&y) {
            assert!((fit.predict(*xi) - yi).abs() < 1e-6);
        }
        assert!(fit_polynomial("flat", &[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 1).is_err());
    }
}
