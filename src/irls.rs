use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::{Error, Result};
use crate::logistic::{cross_entropy, gradient, hessian, LogisticRegression};
use crate::solver::{prepare, step_norm, FitReport, LogisticSolver};

#[derive(Debug, Clone, Copy)]
pub struct IrlsConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub l2_penalty: f64,
    /// Added to every diagonal entry of the Hessian so the Newton system
    /// stays solvable once the probabilities saturate.
    pub jitter: f64,
}

impl Default for IrlsConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            l2_penalty: 0.01,
            jitter: 1e-10,
        }
    }
}

/// Newton-Raphson on the penalized cross-entropy. Each step solves the
/// weighted least squares system `(X^T W X / n + l2 I') dw = grad`.
pub struct Irls {
    pub config: IrlsConfig,
}

/// Solves `matrix * x = rhs` for a symmetric positive definite `matrix`.
fn solve_spd(matrix: &Array2<f64>, rhs: &Array1<f64>) -> Result<Array1<f64>> {
    let dimension = rhs.len();

    let matrix = DMatrix::from_fn(dimension, dimension, |i, j| matrix[(i, j)]);
    let rhs = DVector::from_iterator(dimension, rhs.iter().copied());

    let cholesky = matrix.cholesky().ok_or(Error::Singular("hessian"))?;
    let solution = cholesky.solve(&rhs);

    Ok(solution.iter().copied().collect())
}

impl Irls {
    pub fn new(config: IrlsConfig) -> Result<Self> {
        if !config.l2_penalty.is_finite()
            || config.l2_penalty < 0.0
            || !config.jitter.is_finite()
            || config.jitter < 0.0
        {
            return Err(Error::InvalidInput(
                "l2 penalty and jitter must be non-negative".to_string(),
            ));
        }

        Ok(Self { config })
    }

    fn newton_step(
        &self,
        design: ArrayView2<f64>,
        targets: ArrayView1<f64>,
        weights: &mut Array1<f64>,
    ) -> Result<f64> {
        let l2_penalty = self.config.l2_penalty;

        let gradient = gradient(design, targets, weights.view(), l2_penalty)?;
        let mut hessian = hessian(design, targets, weights.view(), l2_penalty)?;
        hessian.diag_mut().mapv_inplace(|d| d + self.config.jitter);

        let step = solve_spd(&hessian, &gradient)?;
        *weights -= &step;

        Ok(step_norm(&step))
    }
}

impl LogisticSolver for Irls {
    fn name(&self) -> &'static str {
        "irls"
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
            let step_size = self.newton_step(design.view(), targets, &mut weights)?;
            iterations += 1;

            let loss = cross_entropy(design.view(), targets, weights.view(), l2_penalty)?;
            loss_history.push(loss);

            log::debug!("newton iteration {iterations}: loss {loss:.8}, step {step_size:.3e}");

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
                "{} stopped after {iterations} iterations without converging, weights norm {:.3e}",
                self.name(),
                step_norm(&weights)
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
