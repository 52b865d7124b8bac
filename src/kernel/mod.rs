//! Covariance kernels.
//!
//! Every kernel stores its hyperparameters in log-space (so that an
//! unconstrained gradient-ascent step can never push a length scale or
//! signal variance negative) and exposes `k`/`gradient` in terms of that
//! log-space layout, per the kernel state invariant in the data model.
//! Noise and the Cholesky jitter are tracked one level up, on
//! [`crate::gp::GaussianProcess`] itself, which keeps `noise` alongside
//! (not inside) its kernel.

mod exp;
mod matern;
mod squared_exp_ard;

pub use exp::ExpKernel;
pub use matern::{Matern32Kernel, Matern52Kernel};
pub use squared_exp_ard::SquaredExpArdKernel;

/// A covariance function `k(x, y)` together with its gradient with respect
/// to its own log-space hyperparameters.
///
/// `k(x, x)` must always be finite and non-negative; in particular it must
/// not blow up or divide by zero when `x == y`.
pub trait Kernel: Clone + std::fmt::Debug {
    /// Builds a kernel with default hyperparameters for the given input dimension.
    fn default_for_dim(dim: usize) -> Self;

    /// Number of hyperparameters (log-space), not counting noise.
    fn n_params(&self) -> usize;

    /// Current hyperparameters, in log-space.
    fn params(&self) -> Vec<f64>;

    /// Overwrites the hyperparameters; `params` must have length `n_params()`.
    fn set_params(&mut self, params: &[f64]);

    /// Covariance between two points, without the noise term.
    fn k(&self, x: &[f64], y: &[f64]) -> f64;

    /// Gradient of `k(x, y)` with respect to each log-space hyperparameter,
    /// in the same order as `params()`.
    fn gradient(&self, x: &[f64], y: &[f64]) -> Vec<f64>;
}

fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(a, b)| (a - b).powi(2)).sum()
}
