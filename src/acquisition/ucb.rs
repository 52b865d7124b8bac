//! Upper Confidence Bound: `mu_agg(x) + alpha * sqrt(sigma^2_agg(x))`.

use super::{Acquisition, AggregatorFn};
use crate::gp::Model;

#[derive(Debug)]
pub struct Ucb<'m, S: Model> {
    model: &'m S,
    pub alpha: f64,
}

impl<'m, S: Model> Ucb<'m, S> {
    /// `acqui_ucb.alpha` defaults to `0.5`.
    pub fn new(model: &'m S, alpha: f64) -> Self {
        Ucb { model, alpha }
    }
}

impl<'m, S: Model + Sync> Acquisition for Ucb<'m, S> {
    /// No gradient with respect to `x`.
    fn evaluate(&self, x: &[f64], aggregator: AggregatorFn, _want_grad: bool) -> (f64, Option<Vec<f64>>) {
        match self.model.query(x) {
            Ok((mu, var)) => {
                let mu_agg = aggregator(&mu);
                let var_agg = aggregator(&var).max(0.0);
                (mu_agg + self.alpha * var_agg.sqrt(), None)
            }
            Err(_) => (f64::NEG_INFINITY, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::first_elem;
    use crate::gp::{GaussianProcess, GaussianProcessConfig};
    use crate::kernel::Matern52Kernel;
    use crate::mean::NullMean;

    fn fitted_gp() -> GaussianProcess<Matern52Kernel, NullMean> {
        let mut gp = GaussianProcess::new(1, GaussianProcessConfig { noise: 1e-6, ..Default::default() });
        gp.compute(&[vec![0.0], vec![0.5], vec![1.0]], &[0.0, 1.0, 0.0]).unwrap();
        gp
    }

    #[test]
    fn monotonically_nondecreasing_in_alpha() {
        let gp = fitted_gp();
        let x = [0.25];
        let low = Ucb::new(&gp, 0.1).evaluate(&x, &first_elem, false).0;
        let high = Ucb::new(&gp, 2.0).evaluate(&x, &first_elem, false).0;
        assert!(high >= low);
    }
}
