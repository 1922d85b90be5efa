use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{Error, Result};
use crate::logistic::{cross_entropy, gradient, LogisticRegression};
use crate::solver::{prepare, step_norm, FitReport, LogisticSolver};

#[derive(Debug, Clone, Copy)]
pub struct GradientDescentConfig {
    pub learning_rate: f64,
    /// Stop once the Euclidean norm of an update falls below this.
    pub tolerance: f64,
    pub max_iterations: usize,
    pub l2_penalty: f64,
}

impl Default for GradientDescentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            tolerance: 1e-7,
            max_iterations: 10_000,
            l2_penalty: 0.01,
        }
    }
}

/// Batch gradient descent on the penalized cross-entropy, starting from zero weights.
pub struct GradientDescent {
    pub config: GradientDescentConfig,
}

impl GradientDescent {
    pub fn new(config: GradientDescentConfig) -> Result<Self> {
        if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "learning rate must be positive, got {}",
                config.learning_rate
            )));
        }
        if !config.l2_penalty.is_finite() || config.l2_penalty < 0.0 {
            return Err(Error::InvalidInput(format!(
                "l2 penalty must be non-negative, got {}",
                config.l2_penalty
            )));
        }

        Ok(Self { config })
    }

    fn step(
        &self,
        design: ArrayView2<f64>,
        targets: ArrayView1<f64>,
        weights: &mut Array1<f64>,
    ) -> Result<f64> {
        let step = self.config.learning_rate
            * gradient(design, targets, weights.view(), self.config.l2_penalty)?;

        *weights -= &step;

        Ok(step_norm(&step))
    }
}

impl LogisticSolver for GradientDescent {
    fn name(&self) -> &'static str {
        "gradient descent"
    }

    fn fit(
        &self,
        features: ArrayView2<f64>,
        targets: ArrayView1<f64>,
    ) -> Result<(LogisticRegression, FitReport)> {
        let design = prepare(features, targets)?;
        let l2_penalty = self.config.l2_penalty;

        let mut weights = Array1::zeros(design.ncols());
        let mut loss_history = vec![cross_entropy(
            design.view(),
            targets,
            weights.view(),
            l2_penalty,
        )?];

        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            let step_size = self.step(design.view(), targets, &mut weights)?;
            iterations += 1;

            let loss = cross_entropy(design.view(), targets, weights.view(), l2_penalty)?;
            loss_history.push(loss);

            if iterations % 1000 == 0 {
                log::debug!("iteration {iterations}: loss {loss:.6}, step {step_size:.3e}");
            }

            if !loss.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "loss diverged after {iterations} iterations, try a smaller learning rate"
                )));
            }

            if step_size < self.config.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            log::info!(
                "{} converged after {iterations} iterations, loss {:.6}",
                self.name(),
                loss_history.last().copied().unwrap_or(f64::NAN)
            );
        } else {
            log::warn!(
                "{} stopped after {iterations} iterations without converging",
                self.name()
            );
        }

        Ok((
            LogisticRegression::new(weights),
            FitReport {
                iterations,
                converged,
                loss_history,
            },
        ))
    }
}
