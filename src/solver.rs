use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::dataset::{design_matrix, Dataset};
use crate::error::{Error, Result};
use crate::logistic::LogisticRegression;

/// How a fit went: every solver records the loss before the first update and
/// after each iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub iterations: usize,
    pub converged: bool,
    pub loss_history: Vec<f64>,
}

impl FitReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}

pub trait LogisticSolver {
    fn name(&self) -> &'static str;

    fn fit(
        &self,
        features: ArrayView2<f64>,
        targets: ArrayView1<f64>,
    ) -> Result<(LogisticRegression, FitReport)>;

    fn fit_dataset(&self, dataset: &Dataset) -> Result<(LogisticRegression, FitReport)> {
        self.fit(dataset.features.view(), dataset.targets.view())
    }
}

/// Builds the intercept-augmented design matrix and validates the 0/1 targets.
pub(crate) fn prepare(
    features: ArrayView2<f64>,
    targets: ArrayView1<f64>,
) -> Result<Array2<f64>> {
    if features.nrows() != targets.len() {
        return Err(Error::DimensionMismatch {
            expected: features.nrows(),
            actual: targets.len(),
        });
    }
    if features.nrows() == 0 {
        return Err(Error::InvalidInput("no samples".to_string()));
    }
    #[allow(clippy::float_cmp)]
    if let Some(value) = targets.iter().find(|&&y| y != 0.0 && y != 1.0) {
        return Err(Error::InvalidInput(format!(
            "targets must be 0 or 1, found {value}"
        )));
    }

    Ok(design_matrix(features))
}

pub(crate) fn step_norm(step: &Array1<f64>) -> f64 {
    step.dot(step).sqrt()
}
