//! Logistic regression (gradient descent and IRLS) and the lasso, written out
//! from the underlying math on top of `ndarray` and `nalgebra`.

pub mod dataset;
pub mod error;
pub mod gradient_descent;
pub mod irls;
pub mod lasso;
pub mod least_squares;
pub mod logistic;
pub mod metrics;
pub mod plot;
pub mod solver;

pub use error::{Error, Result};
