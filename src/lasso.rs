//! L1-penalized least squares by cyclic coordinate descent.
//!
//! The objective is `1/(2n) |y - b0 - X b|^2 + alpha |b|_1`. The intercept
//! is left unpenalized by centering `X` and `y` before the sweeps and
//! recovering `b0 = mean(y) - mean(X) . b` afterwards.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Error, Result};

/// `sign(z) * max(|z| - threshold, 0)`
pub fn soft_threshold(z: f64, threshold: f64) -> f64 {
    if z > threshold {
        z - threshold
    } else if z < -threshold {
        z + threshold
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LassoConfig {
    pub alpha: f64,
    /// Stop once no coefficient moves by more than this during a sweep.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for LassoConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            tolerance: 1e-10,
            max_iterations: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LassoFit {
    pub intercept: f64,
    pub coefficients: Array1<f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl LassoFit {
    pub fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        if features.ncols() != self.coefficients.len() {
            return Err(Error::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: features.ncols(),
            });
        }

        Ok(features.dot(&self.coefficients) + self.intercept)
    }

    /// Indices of the non-zero coefficients.
    pub fn support(&self) -> Vec<usize> {
        self.coefficients
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != 0.0)
            .map(|(j, _)| j)
            .collect()
    }
}

/// Centered copy of the problem shared by single fits and the path.
struct CenteredProblem {
    features: Array2<f64>,
    targets: Array1<f64>,
    feature_means: Array1<f64>,
    target_mean: f64,
    /// `|x_j|^2 / n` for every centered column.
    column_norms: Array1<f64>,
}

impl CenteredProblem {
    fn new(features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self> {
        if features.nrows() != targets.len() {
            return Err(Error::DimensionMismatch {
                expected: features.nrows(),
                actual: targets.len(),
            });
        }

        let feature_means = features
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::InvalidInput("no samples".to_string()))?;
        let target_mean = targets.mean().unwrap_or(0.0);

        let features = &features - &feature_means;
        let targets = &targets - target_mean;

        let n_samples = features.nrows() as f64;
        let column_norms = features
            .columns()
            .into_iter()
            .map(|column| column.dot(&column) / n_samples)
            .collect();

        Ok(Self {
            features,
            targets,
            feature_means,
            target_mean,
            column_norms,
        })
    }

    fn lambda_max(&self) -> f64 {
        let n_samples = self.features.nrows() as f64;

        self.features
            .columns()
            .into_iter()
            .map(|column| column.dot(&self.targets).abs() / n_samples)
            .fold(0.0, f64::max)
    }

    /// Coordinate descent from `coefficients`, updated in place.
    fn solve(&self, config: &LassoConfig, coefficients: &mut Array1<f64>) -> (usize, bool) {
        let n_samples = self.features.nrows() as f64;

        let mut residuals = &self.targets - &self.features.dot(&*coefficients);

        for iteration in 1..=config.max_iterations {
            let mut max_change: f64 = 0.0;

            for (j, column) in self.features.columns().into_iter().enumerate() {
                let norm = self.column_norms[j];
                if norm == 0.0 {
                    coefficients[j] = 0.0;
                    continue;
                }

                let previous = coefficients[j];
                let rho = column.dot(&residuals) / n_samples + norm * previous;
                let updated = soft_threshold(rho, config.alpha) / norm;

                let change = updated - previous;
                if change != 0.0 {
                    residuals.scaled_add(-change, &column);
                    coefficients[j] = updated;
                }

                max_change = max_change.max(change.abs());
            }

            if max_change < config.tolerance {
                return (iteration, true);
            }
        }

        (config.max_iterations, false)
    }

    fn intercept(&self, coefficients: &Array1<f64>) -> f64 {
        self.target_mean - self.feature_means.dot(coefficients)
    }
}

/// Smallest `alpha` for which every coefficient is zero.
pub fn lambda_max(features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<f64> {
    Ok(CenteredProblem::new(features, targets)?.lambda_max())
}

pub struct Lasso {
    pub config: LassoConfig,
}

impl Lasso {
    pub fn new(config: LassoConfig) -> Result<Self> {
        if config.alpha < 0.0 || config.alpha.is_nan() {
            return Err(Error::InvalidInput(format!(
                "alpha must be non-negative, got {}",
                config.alpha
            )));
        }

        Ok(Self { config })
    }

    pub fn fit(&self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<LassoFit> {
        let problem = CenteredProblem::new(features, targets)?;

        let mut coefficients = Array1::zeros(features.ncols());
        let (iterations, converged) = problem.solve(&self.config, &mut coefficients);

        if converged {
            log::debug!(
                "lasso alpha={} converged after {iterations} sweeps",
                self.config.alpha
            );
        } else {
            log::warn!(
                "lasso alpha={} did not converge within {iterations} sweeps",
                self.config.alpha
            );
        }

        Ok(LassoFit {
            intercept: problem.intercept(&coefficients),
            coefficients,
            iterations,
            converged,
        })
    }
}

#[derive(Debug, Clone)]
pub struct LassoPath {
    /// Decreasing penalties, starting at `lambda_max`.
    pub alphas: Array1<f64>,
    /// One row of coefficients per entry of `alphas`.
    pub coefficients: Array2<f64>,
    pub intercepts: Array1<f64>,
}

impl LassoPath {
    /// Non-zero coefficient count at each point of the path.
    pub fn active_counts(&self) -> Vec<usize> {
        self.coefficients
            .rows()
            .into_iter()
            .map(|row| row.iter().filter(|&&c| c != 0.0).count())
            .collect()
    }
}

/// Fits the lasso along a geometric grid from `lambda_max` down to
/// `lambda_max * lambda_min_ratio`, warm starting each fit from the previous one.
pub fn lasso_path(
    features: ArrayView2<f64>,
    targets: ArrayView1<f64>,
    n_alphas: usize,
    lambda_min_ratio: f64,
    config: LassoConfig,
) -> Result<LassoPath> {
    if n_alphas < 2 {
        return Err(Error::InvalidInput(
            "a path needs at least two penalties".to_string(),
        ));
    }
    if lambda_min_ratio <= 0.0 || !(..1.0).contains(&lambda_min_ratio) {
        return Err(Error::InvalidInput(format!(
            "lambda_min_ratio must lie in (0, 1), got {lambda_min_ratio}"
        )));
    }

    let problem = CenteredProblem::new(features, targets)?;
    let alpha_max = problem.lambda_max();

    let alphas = Array1::from_shape_fn(n_alphas, |k| {
        alpha_max * lambda_min_ratio.powf(k as f64 / (n_alphas - 1) as f64)
    });

    let mut path = Array2::zeros((n_alphas, features.ncols()));
    let mut intercepts = Array1::zeros(n_alphas);
    let mut coefficients = Array1::zeros(features.ncols());

    for (k, &alpha) in alphas.iter().enumerate() {
        let config = LassoConfig { alpha, ..config };
        let (iterations, converged) = problem.solve(&config, &mut coefficients);

        if !converged {
            log::warn!("lasso path: alpha={alpha:.4e} did not converge in {iterations} sweeps");
        }

        path.row_mut(k).assign(&coefficients);
        intercepts[k] = problem.intercept(&coefficients);
    }

    log::info!(
        "lasso path over {n_alphas} penalties from {alpha_max:.4e} to {:.4e}",
        alpha_max * lambda_min_ratio
    );

    Ok(LassoPath {
        alphas,
        coefficients: path,
        intercepts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{load_iris, regression_subset, synthetic_sparse_regression, IrisFeature};
    use crate::least_squares::RidgeRegression;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn iris_petal_width() -> (Array2<f64>, Array1<f64>) {
        let samples = load_iris().unwrap();
        let dataset = regression_subset(
            &samples,
            &[
                IrisFeature::SepalLength,
                IrisFeature::SepalWidth,
                IrisFeature::PetalLength,
            ],
            IrisFeature::PetalWidth,
        )
        .unwrap();

        (dataset.features, dataset.targets)
    }

    #[test]
    fn soft_threshold_shrinks_towards_zero() {
        assert_abs_diff_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_abs_diff_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_abs_diff_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_abs_diff_eq!(soft_threshold(-1.0, 1.0), 0.0);
    }

    #[test]
    fn penalty_at_lambda_max_zeroes_every_coefficient() {
        let (features, targets) = iris_petal_width();
        let alpha = lambda_max(features.view(), targets.view()).unwrap();

        let fit = Lasso::new(LassoConfig {
            alpha,
            ..LassoConfig::default()
        })
        .unwrap()
        .fit(features.view(), targets.view())
        .unwrap();

        assert!(fit.support().is_empty());
        assert_abs_diff_eq!(fit.intercept, targets.mean().unwrap(), epsilon = 1e-12);

        let fit = Lasso::new(LassoConfig {
            alpha: alpha * 0.99,
            ..LassoConfig::default()
        })
        .unwrap()
        .fit(features.view(), targets.view())
        .unwrap();
        assert_eq!(fit.support().len(), 1);
    }

    #[test]
    fn zero_penalty_matches_ordinary_least_squares() {
        let (features, targets) = iris_petal_width();

        let fit = Lasso::new(LassoConfig {
            alpha: 0.0,
            ..LassoConfig::default()
        })
        .unwrap()
        .fit(features.view(), targets.view())
        .unwrap();
        assert!(fit.converged);

        let mut ols = RidgeRegression::ordinary();
        ols.fit(features.view(), targets.view()).unwrap();

        assert_abs_diff_eq!(fit.intercept, ols.intercept().unwrap(), epsilon = 1e-6);
        for (lasso, ols) in fit
            .coefficients
            .iter()
            .zip(ols.coefficients().unwrap().iter())
        {
            assert_abs_diff_eq!(lasso, ols, epsilon = 1e-6);
        }
        // petal.width ~ sepal.length + sepal.width + petal.length
        assert_abs_diff_eq!(fit.intercept, -0.2403, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.coefficients[0], -0.2073, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.coefficients[1], 0.2228, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.coefficients[2], 0.5241, epsilon = 1e-4);
    }

    #[test]
    fn solution_satisfies_optimality_conditions() {
        let (features, targets) = iris_petal_width();
        let alpha = 0.01;

        let fit = Lasso::new(LassoConfig {
            alpha,
            ..LassoConfig::default()
        })
        .unwrap()
        .fit(features.view(), targets.view())
        .unwrap();

        let residuals = &targets - &fit.predict(features.view()).unwrap();
        let correlations = features.t().dot(&residuals) / targets.len() as f64;

        for (j, &coefficient) in fit.coefficients.iter().enumerate() {
            if coefficient == 0.0 {
                assert!(correlations[j].abs() <= alpha + 1e-8);
            } else {
                assert_abs_diff_eq!(
                    correlations[j],
                    alpha * coefficient.signum(),
                    epsilon = 1e-8
                );
            }
        }
    }

    #[test]
    fn orthogonal_design_is_soft_thresholded_least_squares() {
        // centered, orthogonal columns with |x_j|^2 / n == 1
        let features = array![[1.0, 1.0], [-1.0, 1.0], [1.0, -1.0], [-1.0, -1.0]];
        let targets = array![3.0, -1.0, 1.0, -3.0];

        let fit = Lasso::new(LassoConfig {
            alpha: 0.5,
            ..LassoConfig::default()
        })
        .unwrap()
        .fit(features.view(), targets.view())
        .unwrap();

        // least squares gives [2, 1]
        assert_abs_diff_eq!(fit.coefficients[0], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.coefficients[1], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.intercept, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn recovers_support_of_sparse_model() {
        let truth = [3.0, 0.0, 0.0, -2.0, 0.0, 0.0, 0.0, 1.5];
        let dataset = synthetic_sparse_regression(200, &truth, 0.1, 42).unwrap();

        let fit = Lasso::new(LassoConfig {
            alpha: 0.2,
            ..LassoConfig::default()
        })
        .unwrap()
        .fit(dataset.features.view(), dataset.targets.view())
        .unwrap();

        assert_eq!(fit.support(), vec![0, 3, 7]);
    }

    #[test]
    fn path_starts_empty_and_grows() {
        let (features, targets) = iris_petal_width();

        let path = lasso_path(
            features.view(),
            targets.view(),
            20,
            1e-3,
            LassoConfig::default(),
        )
        .unwrap();

        assert_eq!(path.coefficients.nrows(), 20);
        assert_abs_diff_eq!(
            path.alphas[0],
            lambda_max(features.view(), targets.view()).unwrap()
        );
        assert!(path.alphas.windows(2).into_iter().all(|w| w[1] < w[0]));

        let counts = path.active_counts();
        assert_eq!(counts[0], 0);
        assert_eq!(counts[19], 3);
    }

    #[test]
    fn rejects_negative_alpha_and_bad_grid() {
        assert!(Lasso::new(LassoConfig {
            alpha: -1.0,
            ..LassoConfig::default()
        })
        .is_err());

        let (features, targets) = iris_petal_width();
        let config = LassoConfig::default();
        assert!(lasso_path(features.view(), targets.view(), 1, 1e-3, config).is_err());
        assert!(lasso_path(features.view(), targets.view(), 10, 1.5, config).is_err());
    }
}
