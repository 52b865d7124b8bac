use super::{GPContext, Mean};

/// Always returns zero. No hyperparameters.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NullMean;

impl Mean for NullMean {
    fn default_for_dim(_dim_in: usize) -> Self {
        NullMean
    }

    fn n_params(&self) -> usize {
        0
    }

    fn params(&self) -> Vec<f64> {
        vec![]
    }

    fn set_params(&mut self, _params: &[f64]) {}

    fn mean(&self, _x: &[f64], _ctx: &dyn GPContext) -> f64 {
        0.0
    }

    fn gradient(&self, _x: &[f64], _ctx: &dyn GPContext) -> Vec<f64> {
        vec![]
    }
}
