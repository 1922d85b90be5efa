use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::dataset::design_matrix;
use crate::error::{Error, Result};

/// Logistic function, evaluated without overflowing for large `|z|`.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp = z.exp();
        exp / (1.0 + exp)
    }
}

/// `ln(1 + e^z)`
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

fn l2_term(weights: ArrayView1<f64>, l2_penalty: f64) -> f64 {
    let slopes = weights.slice(s![1..]);

    0.5 * l2_penalty * slopes.dot(&slopes)
}

pub(crate) fn check_dimensions(
    design: ArrayView2<f64>,
    targets: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> Result<()> {
    if design.nrows() != targets.len() {
        return Err(Error::DimensionMismatch {
            expected: design.nrows(),
            actual: targets.len(),
        });
    }
    if design.ncols() != weights.len() {
        return Err(Error::DimensionMismatch {
            expected: design.ncols(),
            actual: weights.len(),
        });
    }
    if design.nrows() == 0 {
        return Err(Error::InvalidInput("no samples".to_string()));
    }

    Ok(())
}

/// Mean negative log-likelihood over the rows of `design` (intercept column
/// included) plus `l2_penalty / 2 * |w[1..]|^2`.
pub fn cross_entropy(
    design: ArrayView2<f64>,
    targets: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    l2_penalty: f64,
) -> Result<f64> {
    check_dimensions(design, targets, weights)?;

    let scores = design.dot(&weights);
    let log_likelihood: f64 = scores
        .iter()
        .zip(targets.iter())
        .map(|(&z, &y)| (1.0 - y) * softplus(z) + y * softplus(-z))
        .sum();

    Ok(log_likelihood / targets.len() as f64 + l2_term(weights, l2_penalty))
}

/// `X^T (sigmoid(Xw) - y) / n + l2 * w`, with the intercept left unpenalized.
pub fn gradient(
    design: ArrayView2<f64>,
    targets: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    l2_penalty: f64,
) -> Result<Array1<f64>> {
    check_dimensions(design, targets, weights)?;

    let residuals = design.dot(&weights).mapv(sigmoid) - targets;
    let mut gradient = design.t().dot(&residuals) / targets.len() as f64;

    gradient
        .slice_mut(s![1..])
        .scaled_add(l2_penalty, &weights.slice(s![1..]));

    Ok(gradient)
}

/// `X^T W X / n + l2 * I'` with `W = diag(p (1 - p))`; `I'` skips the intercept.
pub fn hessian(
    design: ArrayView2<f64>,
    targets: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    l2_penalty: f64,
) -> Result<Array2<f64>> {
    check_dimensions(design, targets, weights)?;

    let variances = design
        .dot(&weights)
        .mapv(|z| {
            let p = sigmoid(z);
            p * (1.0 - p)
        })
        .insert_axis(Axis(1));

    let weighted = &design * &variances;
    let mut hessian = design.t().dot(&weighted) / targets.len() as f64;

    for i in 1..hessian.nrows() {
        hessian[(i, i)] += l2_penalty;
    }

    Ok(hessian)
}

/// Binary classifier `P(y = 1 | x) = sigmoid(w0 + w[1..] . x)`.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub weights: Array1<f64>,
}

impl LogisticRegression {
    pub fn new(weights: Array1<f64>) -> Self {
        Self { weights }
    }

    pub fn intercept(&self) -> f64 {
        self.weights[0]
    }

    pub fn coefficients(&self) -> ArrayView1<f64> {
        self.weights.slice(s![1..])
    }

    pub fn n_features(&self) -> usize {
        self.weights.len() - 1
    }

    pub fn predict_proba(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        if features.ncols() != self.n_features() {
            return Err(Error::DimensionMismatch {
                expected: self.n_features(),
                actual: features.ncols(),
            });
        }

        Ok(design_matrix(features).dot(&self.weights).mapv(sigmoid))
    }

    pub fn predict(&self, features: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .predict_proba(features)?
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    /// Second feature on the `p = 0.5` line of a two-feature model, or `None`
    /// when that line is vertical.
    pub fn decision_boundary(&self, x1: f64) -> Option<f64> {
        if self.n_features() != 2 || self.weights[2].abs() <= f64::EPSILON {
            return None;
        }

        Some(-(self.weights[0] + self.weights[1] * x1) / self.weights[2])
    }
}
