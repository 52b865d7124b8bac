//! Acquisition functions: scalar utilities over `[0, 1]^d`, maximized by
//! an inner optimizer to pick the next query point.
//!
//! Each acquisition borrows a [`Model`] immutably and exposes
//! `(x, aggregator, want_grad) -> (value, optional grad)`. Neither UCB nor
//! EI has a gradient with respect to `x` (UCB explicitly has none; EI's is
//! not implemented here), so in practice they are maximized with the
//! gradient-free inner optimizers (`GridSearch`, `ParallelRepeater`,
//! `RandomPoint`) rather than `Rprop`/`Adam`, which are reserved for
//! hyperparameter fitting, where the gradient is well-defined.
//! [`to_inner_objective`] adapts any `Acquisition` to the
//! [`crate::optimizer::DifferentiableObjective`] contract regardless,
//! substituting a zero vector when no gradient is available.

mod ei;
mod ucb;

#[cfg(feature = "experimental")]
mod eci;

pub use ei::Ei;
pub use ucb::Ucb;

#[cfg(feature = "experimental")]
pub use eci::Eci;

/// `R^m -> R`, collapsing a multi-output prediction to a scalar for a
/// scalar acquisition. Must be safe to share across the (possibly
/// parallel) inner-optimizer restarts.
pub type AggregatorFn<'a> = &'a (dyn Fn(&[f64]) -> f64 + Sync);

/// Collapses a multi-output vector to its first component, the default
/// aggregator, exposed as a first-class, user-replaceable callable.
pub fn first_elem(y: &[f64]) -> f64 {
    y[0]
}

/// A scalar utility over the input domain, maximized to choose the next query.
pub trait Acquisition: Sync {
    /// Returns `(value, grad)`; `grad` is `None` when this acquisition has
    /// no `x`-gradient, regardless of `want_grad`.
    fn evaluate(&self, x: &[f64], aggregator: AggregatorFn, want_grad: bool) -> (f64, Option<Vec<f64>>);
}

/// Adapts any [`Acquisition`] into the `(x) -> (value, grad)` contract the
/// inner optimizers expect, substituting an all-zero gradient when the
/// acquisition itself has none.
pub fn to_inner_objective<'a>(
    acquisition: &'a dyn Acquisition,
    aggregator: AggregatorFn<'a>,
) -> impl Fn(&[f64]) -> (f64, Vec<f64>) + Sync + 'a {
    move |x: &[f64]| {
        let (value, grad) = acquisition.evaluate(x, aggregator, true);
        match grad {
            Some(g) => (value, g),
            None => (value, vec![0.0; x.len()]),
        }
    }
}
