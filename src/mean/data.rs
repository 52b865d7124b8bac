use super::{GPContext, Mean};

/// Returns the empirical mean of the observations the GP was last fit on.
/// No hyperparameters: it is derived from the data, not fit by gradient ascent.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataMean;

impl Mean for DataMean {
    fn default_for_dim(_dim_in: usize) -> Self {
        DataMean
    }

    fn n_params(&self) -> usize {
        0
    }

    fn params(&self) -> Vec<f64> {
        vec![]
    }

    fn set_params(&mut self, _params: &[f64]) {}

    fn mean(&self, _x: &[f64], ctx: &dyn GPContext) -> f64 {
        ctx.mean_observation()
    }

    fn gradient(&self, _x: &[f64], _ctx: &dyn GPContext) -> Vec<f64> {
        vec![]
    }
}
