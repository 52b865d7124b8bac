//! Affine transform learned around an inner mean function.
//!
//! Wraps a mean function with an affine transform learned on top of it.
//! Every `Mean` in this crate is scalar (one GP = one output), so the
//! transform degenerates to `out = a * inner(x) + b`; [`MultiOutputGp`]
//! recovers the general multi-output case by holding one
//! `FunctionArdMean` per output.
//!
//! [`MultiOutputGp`]: crate::gp::multi::MultiOutputGp

use super::{GPContext, Mean};

#[derive(Clone, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionArdMean<Inner: Mean> {
    scale: f64,
    bias: f64,
    inner: Inner,
}

impl<Inner: Mean> FunctionArdMean<Inner> {
    pub fn new(inner: Inner) -> Self {
        FunctionArdMean { scale: 1.0, bias: 0.0, inner }
    }
}

impl<Inner: Mean> Mean for FunctionArdMean<Inner> {
    fn default_for_dim(dim_in: usize) -> Self {
        FunctionArdMean::new(Inner::default_for_dim(dim_in))
    }

    fn n_params(&self) -> usize {
        2 + self.inner.n_params()
    }

    fn params(&self) -> Vec<f64> {
        let mut p = vec![self.scale, self.bias];
        p.extend(self.inner.params());
        p
    }

    fn set_params(&mut self, params: &[f64]) {
        self.scale = params[0];
        self.bias = params[1];
        if self.inner.n_params() > 0 {
            self.inner.set_params(&params[2..]);
        }
    }

    fn mean(&self, x: &[f64], ctx: &dyn GPContext) -> f64 {
        self.scale * self.inner.mean(x, ctx) + self.bias
    }

    fn gradient(&self, x: &[f64], ctx: &dyn GPContext) -> Vec<f64> {
        let inner_mean = self.inner.mean(x, ctx);
        let mut grad = vec![inner_mean, 1.0];
        if self.inner.n_params() > 0 {
            grad.extend(self.inner.gradient(x, ctx).into_iter().map(|g| self.scale * g));
        }
        grad
    }
}
