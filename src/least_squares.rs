use nalgebra::{DMatrix, DVector};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

use crate::dataset::design_matrix;
use crate::error::{Error, Result};

/// Closed-form ridge regression with an unpenalized intercept. A
/// regularization of zero gives ordinary least squares.
#[derive(Debug, Clone, Default)]
pub struct RidgeRegression {
    weights: Option<Array1<f64>>,
    regularization: f64,
}

impl RidgeRegression {
    pub fn new(regularization: f64) -> Self {
        Self {
            weights: None,
            regularization,
        }
    }

    pub fn ordinary() -> Self {
        Self::new(0.0)
    }

    pub fn fit(&mut self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()> {
        if features.nrows() != targets.len() {
            return Err(Error::DimensionMismatch {
                expected: features.nrows(),
                actual: targets.len(),
            });
        }

        // X
        let design = design_matrix(features);
        let dimension = design.ncols();

        // (tau * I)
        let mut regularization: Array2<f64> = Array2::eye(dimension) * self.regularization;
        regularization[(0, 0)] = 0.0;

        // (X^T * X + tau * I)
        let covariance = design.t().dot(&design) + regularization;

        // X^T * y
        let features_targets_product = design.t().dot(&targets);

        let covariance = DMatrix::from_fn(dimension, dimension, |i, j| covariance[(i, j)]);
        let features_targets_product =
            DVector::from_iterator(dimension, features_targets_product.iter().copied());

        // (X^T * X + tau * I)^-1
        let covariance_inverse = covariance
            .try_inverse()
            .ok_or(Error::Singular("normal equations"))?;

        // (X^T * X + tau * I)^-1 * (X^T * y)
        let weights = covariance_inverse * features_targets_product;

        self.weights = Some(weights.iter().copied().collect());

        Ok(())
    }

    /// Intercept first, then one coefficient per feature.
    pub fn weights(&self) -> Option<ArrayView1<f64>> {
        self.weights.as_ref().map(Array1::view)
    }

    pub fn intercept(&self) -> Option<f64> {
        self.weights.as_ref().map(|w| w[0])
    }

    pub fn coefficients(&self) -> Option<ArrayView1<f64>> {
        self.weights.as_ref().map(|w| w.slice(s![1..]))
    }

    pub fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("model has not been fitted".to_string()))?;

        if features.ncols() + 1 != weights.len() {
            return Err(Error::DimensionMismatch {
                expected: weights.len() - 1,
                actual: features.ncols(),
            });
        }

        Ok(design_matrix(features).dot(weights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn recovers_exact_linear_relationship() {
        let beta = array![0.3, 1.2, -0.5];
        let features = array![[-0.1, 0.2], [0.7, 0.5], [3.2, 0.1], [1.0, -2.0]];
        let targets = design_matrix(features.view()).dot(&beta);

        let mut model = RidgeRegression::ordinary();
        model.fit(features.view(), targets.view()).unwrap();

        let weights = model.weights().unwrap();
        for (fitted, expected) in weights.iter().zip(beta.iter()) {
            assert_abs_diff_eq!(fitted, expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn penalty_shrinks_slopes_but_not_intercept() {
        let features = array![[1.0], [2.0], [3.0], [4.0]];
        let targets = array![12.0, 14.0, 16.0, 18.0];

        let mut model = RidgeRegression::new(1e6);
        model.fit(features.view(), targets.view()).unwrap();

        assert_abs_diff_eq!(model.coefficients().unwrap()[0], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(model.intercept().unwrap(), 15.0, epsilon = 1e-3);
    }

    #[test]
    fn duplicated_column_is_singular_without_penalty() {
        let features = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let targets = array![1.0, 2.0, 3.0];

        let mut model = RidgeRegression::ordinary();
        assert!(model.fit(features.view(), targets.view()).is_err());

        let mut model = RidgeRegression::new(0.1);
        assert!(model.fit(features.view(), targets.view()).is_ok());
    }

    #[test]
    fn unfitted_model_cannot_predict() {
        let model = RidgeRegression::ordinary();
        assert!(model.predict(array![[1.0]].view()).is_err());
    }
}
