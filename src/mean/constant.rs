use super::{GPContext, Mean};

/// Returns a single configured scalar, regardless of input.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstantMean {
    constant: f64,
}

impl ConstantMean {
    pub fn new(constant: f64) -> Self {
        ConstantMean { constant }
    }
}

impl Mean for ConstantMean {
    fn default_for_dim(_dim_in: usize) -> Self {
        // matches mean_constant.constant (1) in the configuration surface
        ConstantMean::new(1.0)
    }

    fn n_params(&self) -> usize {
        1
    }

    fn params(&self) -> Vec<f64> {
        vec![self.constant]
    }

    fn set_params(&mut self, params: &[f64]) {
        self.constant = params[0];
    }

    fn mean(&self, _x: &[f64], _ctx: &dyn GPContext) -> f64 {
        self.constant
    }

    fn gradient(&self, _x: &[f64], _ctx: &dyn GPContext) -> Vec<f64> {
        vec![1.0]
    }
}
