use ndarray::ArrayView1;

use crate::error::{Error, Result};

fn check_lengths(expected: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<()> {
    if expected.len() != predicted.len() {
        return Err(Error::DimensionMismatch {
            expected: expected.len(),
            actual: predicted.len(),
        });
    }
    if expected.is_empty() {
        return Err(Error::InvalidInput("no predictions to score".to_string()));
    }

    Ok(())
}

#[allow(clippy::float_cmp)]
pub fn misclassifications(expected: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<usize> {
    check_lengths(expected, predicted)?;

    Ok(expected
        .iter()
        .zip(predicted.iter())
        .filter(|(e, p)| e != p)
        .count())
}

pub fn accuracy(expected: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<f64> {
    let wrong = misclassifications(expected, predicted)?;

    Ok(1.0 - wrong as f64 / expected.len() as f64)
}

/// Counts for 0/1 labels, class 1 being positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn new(expected: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<Self> {
        check_lengths(expected, predicted)?;

        let mut matrix = Self::default();
        for (&e, &p) in expected.iter().zip(predicted.iter()) {
            match (e > 0.5, p > 0.5) {
                (true, true) => matrix.true_positives += 1,
                (false, true) => matrix.false_positives += 1,
                (false, false) => matrix.true_negatives += 1,
                (true, false) => matrix.false_negatives += 1,
            }
        }

        Ok(matrix)
    }

    pub fn precision(&self) -> Option<f64> {
        let predicted_positive = self.true_positives + self.false_positives;
        (predicted_positive > 0).then(|| self.true_positives as f64 / predicted_positive as f64)
    }

    pub fn recall(&self) -> Option<f64> {
        let actual_positive = self.true_positives + self.false_negatives;
        (actual_positive > 0).then(|| self.true_positives as f64 / actual_positive as f64)
    }
}

pub fn mean_squared_error(expected: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<f64> {
    check_lengths(expected, predicted)?;

    let errors = &expected - &predicted;

    Ok(errors.dot(&errors) / expected.len() as f64)
}

/// Coefficient of determination; `None` when the targets are constant.
pub fn r_squared(expected: ArrayView1<f64>, predicted: ArrayView1<f64>) -> Result<Option<f64>> {
    let mse = mean_squared_error(expected, predicted)?;
    let variance = expected.var(0.0);

    Ok((variance > 0.0).then(|| 1.0 - mse / variance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn counts_binary_outcomes() {
        let expected = array![1.0, 1.0, 0.0, 0.0, 1.0];
        let predicted = array![1.0, 0.0, 0.0, 1.0, 1.0];

        let matrix = ConfusionMatrix::new(expected.view(), predicted.view()).unwrap();
        assert_eq!(
            matrix,
            ConfusionMatrix {
                true_positives: 2,
                false_positives: 1,
                true_negatives: 1,
                false_negatives: 1,
            }
        );
        assert_abs_diff_eq!(matrix.precision().unwrap(), 2.0 / 3.0);
        assert_abs_diff_eq!(matrix.recall().unwrap(), 2.0 / 3.0);

        assert_eq!(misclassifications(expected.view(), predicted.view()).unwrap(), 2);
        assert_abs_diff_eq!(accuracy(expected.view(), predicted.view()).unwrap(), 0.6);
    }

    #[test]
    fn regression_scores() {
        let expected = array![1.0, 2.0, 3.0, 4.0];
        let predicted = array![1.0, 2.0, 3.0, 6.0];

        assert_abs_diff_eq!(
            mean_squared_error(expected.view(), predicted.view()).unwrap(),
            1.0
        );
        // variance 1.25
        assert_abs_diff_eq!(
            r_squared(expected.view(), predicted.view()).unwrap().unwrap(),
            0.2,
            epsilon = 1e-12
        );
        assert!(r_squared(array![2.0, 2.0].view(), array![1.0, 3.0].view())
            .unwrap()
            .is_none());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = accuracy(array![1.0, 0.0].view(), array![1.0].view());
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(accuracy(empty.view(), empty.view()).is_err());
    }
}
