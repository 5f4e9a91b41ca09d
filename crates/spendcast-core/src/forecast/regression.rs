//! Feature standardization and ordinary least squares
//!
//! Histories are short (a handful of months) and wide (five base features
//! plus one column per category), so the normal equations are usually
//! singular. Fits use the Moore-Penrose pseudo-inverse, which yields the
//! minimum-norm least-squares solution in both the over- and under-determined
//! case. The pseudo-inverse is built from a Jacobi eigendecomposition of the
//! smaller Gram matrix.

use crate::error::{Error, Result};

/// Relative eigenvalue cutoff below which a direction is treated as null
const EIGEN_CUTOFF: f64 = 1e-10;

/// Jacobi sweeps before giving up
const MAX_SWEEPS: usize = 100;

fn ensure_finite(matrix: &[Vec<f64>], what: &str) -> Result<()> {
    if matrix.iter().flatten().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Error::Numerical(format!("{} contains non-finite values", what)))
    }
}

/// Column-wise standardization to zero mean and unit population variance
///
/// Constant columns keep a scale of 1 so they are centered but not blown up.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn per-column mean and scale from the training rows
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(Error::Numerical("cannot standardize an empty matrix".into()));
        }
        ensure_finite(rows, "feature matrix")?;

        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(Error::Numerical("ragged feature matrix".into()));
        }

        let mut means = vec![0.0; width];
        for row in rows {
            for (m, v) in means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut means {
            *m /= n as f64;
        }

        let mut scales = vec![0.0; width];
        for row in rows {
            for ((s, v), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (v - m).powi(2);
            }
        }
        for (s, m) in scales.iter_mut().zip(&means) {
            let std = (*s / n as f64).sqrt();
            *s = if std <= 1e-10 * m.abs().max(1.0) { 1.0 } else { std };
        }

        Ok(Self { means, scales })
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(Error::Numerical(format!(
                "expected {} features, got {}",
                self.width(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}

/// A fitted linear model `y = intercept + coefficients · x`
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }

    /// Coefficient of determination over the given rows
    pub fn score(&self, rows: &[Vec<f64>], targets: &[f64]) -> f64 {
        let predictions: Vec<f64> = rows.iter().map(|r| self.predict(r)).collect();
        r_squared(targets, &predictions)
    }
}

/// R² of `predicted` against `actual`
///
/// A constant `actual` scores 1.0 when matched exactly and 0.0 otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let n = actual.len() as f64;
    let mean = actual.iter().sum::<f64>() / n;
    let ss_tot: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    let tolerance = 1e-12 * actual.iter().map(|y| y * y).sum::<f64>().max(1.0);
    if ss_tot <= tolerance {
        return if ss_res <= tolerance { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Least-squares solver for a fixed design matrix
///
/// Holds the pseudo-inverse of the column-centered matrix so any number of
/// targets can be fit against the same features.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    column_means: Vec<f64>,
    /// p × n
    pinv: Vec<Vec<f64>>,
}

impl LeastSquares {
    pub fn new(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(Error::Numerical("cannot fit an empty matrix".into()));
        }
        ensure_finite(rows, "design matrix")?;
        let p = rows[0].len();
        if rows.iter().any(|r| r.len() != p) {
            return Err(Error::Numerical("ragged design matrix".into()));
        }

        let mut column_means = vec![0.0; p];
        for row in rows {
            for (m, v) in column_means.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut column_means {
            *m /= n as f64;
        }

        let centered: Vec<Vec<f64>> = rows
            .iter()
            .map(|r| r.iter().zip(&column_means).map(|(v, m)| v - m).collect())
            .collect();

        let pinv = pseudo_inverse(&centered, p)?;
        Ok(Self { column_means, pinv })
    }

    /// Fit one target column
    pub fn fit(&self, targets: &[f64]) -> Result<LinearModel> {
        let n = self.pinv.first().map(|r| r.len()).unwrap_or(0);
        if targets.len() != n {
            return Err(Error::Numerical(format!(
                "expected {} targets, got {}",
                n,
                targets.len()
            )));
        }
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(Error::Numerical("targets contain non-finite values".into()));
        }

        let mean = targets.iter().sum::<f64>() / n as f64;
        let centered: Vec<f64> = targets.iter().map(|t| t - mean).collect();

        let coefficients: Vec<f64> = self
            .pinv
            .iter()
            .map(|row| row.iter().zip(&centered).map(|(a, y)| a * y).sum())
            .collect();
        let intercept = mean
            - coefficients
                .iter()
                .zip(&self.column_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(Error::Numerical("least-squares fit diverged".into()));
        }
        Ok(LinearModel {
            coefficients,
            intercept,
        })
    }
}

fn transpose(m: &[Vec<f64>], cols: usize) -> Vec<Vec<f64>> {
    (0..cols).map(|j| m.iter().map(|r| r[j]).collect()).collect()
}

fn multiply(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let cols = b.first().map(|r| r.len()).unwrap_or(0);
    a.iter()
        .map(|row| {
            (0..cols)
                .map(|j| row.iter().zip(b).map(|(x, brow)| x * brow[j]).sum())
                .collect()
        })
        .collect()
}

/// Pseudo-inverse of a symmetric positive semi-definite matrix
///
/// Eigenvalues below `EIGEN_CUTOFF` of the largest are treated as zero.
fn gram_pinv(gram: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
    let size = gram.len();
    let (values, vectors) = symmetric_eigen(gram)?;
    let largest = values.iter().fold(0.0_f64, |acc, v| acc.max(*v));

    let mut out = vec![vec![0.0; size]; size];
    if largest <= 0.0 {
        return Ok(out);
    }
    let cutoff = largest * EIGEN_CUTOFF;
    for (k, &lambda) in values.iter().enumerate() {
        if lambda <= cutoff {
            continue;
        }
        for i in 0..size {
            let scaled = vectors[i][k] / lambda;
            for j in 0..size {
                out[i][j] += scaled * vectors[j][k];
            }
        }
    }
    Ok(out)
}

/// Moore-Penrose pseudo-inverse of an n × p matrix, returned as p × n
fn pseudo_inverse(a: &[Vec<f64>], p: usize) -> Result<Vec<Vec<f64>>> {
    let n = a.len();
    let at = transpose(a, p);
    if n <= p {
        // A⁺ = Aᵀ (A Aᵀ)⁺
        let gram = multiply(a, &at);
        Ok(multiply(&at, &gram_pinv(gram)?))
    } else {
        // A⁺ = (Aᵀ A)⁺ Aᵀ
        let gram = multiply(&at, a);
        Ok(multiply(&gram_pinv(gram)?, &at))
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix
///
/// Returns eigenvalues and a matrix whose columns are the matching
/// eigenvectors.
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let norm: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().sqrt();
    if norm == 0.0 {
        return Ok((vec![0.0; n], v));
    }

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off += a[i][j] * a[i][j];
            }
        }
        if off.sqrt() <= 1e-14 * norm {
            let values = (0..n).map(|i| a[i][i]).collect();
            return Ok((values, v));
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p][q];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    Err(Error::Numerical(
        "eigendecomposition did not converge".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_scaler_zero_mean_unit_variance() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows).unwrap();

        let col0: Vec<f64> = scaled.iter().map(|r| r[0]).collect();
        let mean: f64 = col0.iter().sum::<f64>() / 3.0;
        let var: f64 = col0.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 3.0;
        assert!(close(mean, 0.0));
        assert!(close(var, 1.0));

        // Constant column is centered, not divided by zero
        assert!(scaled.iter().all(|r| r[1] == 0.0));
    }

    #[test]
    fn test_scaler_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(Error::Numerical(_))
        ));
    }

    #[test]
    fn test_scaler_rejects_non_finite() {
        let rows = vec![vec![1.0], vec![f64::INFINITY]];
        assert!(StandardScaler::fit(&rows).is_err());
    }

    #[test]
    fn test_exact_fit_overdetermined() {
        // y = 3 + 2a - b
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![2.0, 3.0],
            vec![4.0, 1.0],
        ];
        let y: Vec<f64> = rows.iter().map(|r| 3.0 + 2.0 * r[0] - r[1]).collect();

        let model = LeastSquares::new(&rows).unwrap().fit(&y).unwrap();
        assert!(close(model.intercept, 3.0));
        assert!(close(model.coefficients[0], 2.0));
        assert!(close(model.coefficients[1], -1.0));
        assert!(close(model.score(&rows, &y), 1.0));
    }

    #[test]
    fn test_noisy_fit_matches_closed_form() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.5, 5.5, 8.0];
        let rows: Vec<Vec<f64>> = xs.iter().map(|x| vec![*x]).collect();

        let model = LeastSquares::new(&rows).unwrap().fit(&ys).unwrap();
        // slope = cov(x, y) / var(x) = 1.9, intercept = mean(y) - slope * mean(x)
        assert!(close(model.coefficients[0], 1.9));
        assert!(close(model.intercept, 5.0 - 1.9 * 2.5));
    }

    #[test]
    fn test_underdetermined_uses_minimum_norm() {
        // Two observations, three identical columns: weight is shared equally
        let rows = vec![vec![-1.0, -1.0, -1.0], vec![1.0, 1.0, 1.0]];
        let y = vec![10.0, 16.0];

        let model = LeastSquares::new(&rows).unwrap().fit(&y).unwrap();
        for c in &model.coefficients {
            assert!(close(*c, 1.0));
        }
        assert!(close(model.intercept, 13.0));
        assert!(close(model.predict(&[1.0, 1.0, 1.0]), 16.0));
    }

    #[test]
    fn test_constant_design_predicts_mean() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let model = LeastSquares::new(&rows).unwrap().fit(&[1.0, 2.0, 6.0]).unwrap();
        assert!(close(model.coefficients[0], 0.0));
        assert!(close(model.predict(&[5.0]), 3.0));
    }

    #[test]
    fn test_fit_rejects_mismatched_targets() {
        let solver = LeastSquares::new(&[vec![1.0], vec![2.0]]).unwrap();
        assert!(solver.fit(&[1.0]).is_err());
        assert!(solver.fit(&[1.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_r_squared_edge_cases() {
        assert!(close(r_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0));
        assert!(close(r_squared(&[5.0, 5.0], &[5.0, 5.0]), 1.0));
        assert!(close(r_squared(&[5.0, 5.0], &[4.0, 6.0]), 0.0));
        // Worse than the mean goes negative
        assert!(r_squared(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) < 0.0);
        assert_eq!(r_squared(&[], &[]), 0.0);
    }

    #[test]
    fn test_symmetric_eigen_reconstructs() {
        let a = vec![
            vec![4.0, 1.0, 2.0],
            vec![1.0, 3.0, 0.5],
            vec![2.0, 0.5, 5.0],
        ];
        let (values, vectors) = symmetric_eigen(a.clone()).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let rebuilt: f64 = (0..3).map(|k| vectors[i][k] * values[k] * vectors[j][k]).sum();
                assert!(close(rebuilt, a[i][j]));
            }
        }
    }
}
