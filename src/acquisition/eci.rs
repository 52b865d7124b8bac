//! Expected Constrained Improvement (experimental). Multiplies [`Ei`] by
//! the probability that a separate constraint GP's prediction is feasible;
//! gated behind the `experimental` feature since it only sketches the
//! hooks a full multi-objective/constrained optimizer would need.

use super::{Acquisition, AggregatorFn, Ei};
use crate::gp::Model;
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug)]
pub struct Eci<'m, S: Model, C: Model> {
    ei: Ei<'m, S>,
    constraint_model: &'m C,
}

impl<'m, S: Model, C: Model> Eci<'m, S, C> {
    pub fn new(model: &'m S, constraint_model: &'m C, jitter: f64) -> Self {
        Eci { ei: Ei::new(model, jitter), constraint_model }
    }
}

impl<'m, S: Model + Sync, C: Model + Sync> Acquisition for Eci<'m, S, C> {
    fn evaluate(&self, x: &[f64], aggregator: AggregatorFn, want_grad: bool) -> (f64, Option<Vec<f64>>) {
        let (ei_value, _) = self.ei.evaluate(x, aggregator, want_grad);
        if self.constraint_model.n_samples() == 0 {
            return (ei_value, None);
        }
        let feasibility = match self.constraint_model.query(x) {
            Ok((mu_c, var_c)) => {
                let mu = aggregator(&mu_c);
                let sigma = aggregator(&var_c).max(0.0).sqrt();
                if sigma < 1e-10 {
                    if mu >= 1.0 {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    let standard_normal = Normal::new(0.0, 1.0).expect("standard normal parameters are always valid");
                    standard_normal.cdf((mu - 1.0) / sigma)
                }
            }
            Err(_) => 0.0,
        };
        (ei_value * feasibility, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::first_elem;
    use crate::gp::{GaussianProcess, GaussianProcessConfig};
    use crate::kernel::Matern52Kernel;
    use crate::mean::NullMean;

    #[test]
    fn returns_plain_ei_when_constraint_model_is_empty() {
        let mut gp: GaussianProcess<Matern52Kernel, NullMean> =
            GaussianProcess::new(1, GaussianProcessConfig { noise: 1e-6, ..Default::default() });
        gp.compute(&[vec![0.0], vec![0.5], vec![1.0]], &[0.0, 1.0, 0.0]).unwrap();
        let constraint: GaussianProcess<Matern52Kernel, NullMean> = GaussianProcess::new(1, GaussianProcessConfig::default());
        let ei = Ei::new(&gp, 0.0);
        let eci = Eci::new(&gp, &constraint, 0.0);
        let x = [0.3];
        assert_eq!(ei.evaluate(&x, &first_elem, false).0, eci.evaluate(&x, &first_elem, false).0);
    }
}
