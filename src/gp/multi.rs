//! Multi-output Gaussian Process: `m` independent single-output GPs sharing
//! the same input dimension, behind one [`Model`] interface.

use super::{GaussianProcess, GaussianProcessConfig, Model};
use crate::errors::{check_finite, BoResult};
use crate::kernel::Kernel;
use crate::mean::{GPContext, Mean};
use rayon::prelude::*;

#[derive(Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiOutputGp<K: Kernel, M: Mean> {
    // persisted as plain integers, never as f64: these are loop bounds,
    // not continuous hyperparameters.
    dim_in: usize,
    dim_out: usize,
    gps: Vec<GaussianProcess<K, M>>,
}

impl<K: Kernel + Send + Sync, M: Mean + Send + Sync> MultiOutputGp<K, M> {
    pub fn new(dim_in: usize, dim_out: usize, config: GaussianProcessConfig) -> Self {
        let gps = (0..dim_out).map(|_| GaussianProcess::new(dim_in, config.clone())).collect();
        MultiOutputGp { dim_in, dim_out, gps }
    }

    /// The `dim_out` independent underlying scalar GPs, for per-output
    /// hyperparameter fitting (`ParallelLf`).
    pub fn gps(&self) -> &[GaussianProcess<K, M>] {
        &self.gps
    }

    pub fn gps_mut(&mut self) -> &mut [GaussianProcess<K, M>] {
        &mut self.gps
    }
}

impl<K: Kernel + Send + Sync, M: Mean + Send + Sync> Model for MultiOutputGp<K, M> {
    fn dim_in(&self) -> usize {
        self.dim_in
    }

    fn dim_out(&self) -> usize {
        self.dim_out
    }

    fn n_samples(&self) -> usize {
        self.gps.first().map(|g| g.n_samples()).unwrap_or(0)
    }

    fn samples(&self) -> &[Vec<f64>] {
        self.gps.first().map(|g| g.samples()).unwrap_or(&[])
    }

    fn compute(&mut self, samples: &[Vec<f64>], observations: &[Vec<f64>]) -> BoResult<()> {
        for o in observations {
            check_finite(o)?;
        }
        self.gps
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(output, gp)| {
                let column: Vec<f64> = observations.iter().map(|o| o[output]).collect();
                gp.compute(samples, &column)
            })
    }

    fn add_sample(&mut self, x: &[f64], y: &[f64]) -> BoResult<()> {
        check_finite(y)?;
        self.gps.par_iter_mut().enumerate().try_for_each(|(output, gp)| gp.add_sample(x, y[output]))
    }

    fn query(&self, x: &[f64]) -> BoResult<(Vec<f64>, Vec<f64>)> {
        let results: Vec<BoResult<(f64, f64)>> = self.gps.par_iter().map(|gp| gp.predict(x)).collect();
        let mut mu = Vec::with_capacity(self.dim_out);
        let mut var = Vec::with_capacity(self.dim_out);
        for r in results {
            let (m, v) = r?;
            mu.push(m);
            var.push(v);
        }
        Ok((mu, var))
    }

    fn mean_observations(&self) -> Vec<f64> {
        self.gps.iter().map(|g| g.mean_observation()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::ExpKernel;
    use crate::mean::NullMean;

    #[test]
    fn fans_out_per_output() {
        let mut model: MultiOutputGp<ExpKernel, NullMean> = MultiOutputGp::new(1, 2, GaussianProcessConfig::default());
        model
            .compute(
                &[vec![0.0], vec![0.5], vec![1.0]],
                &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            )
            .unwrap();
        let (mu, var) = model.query(&[0.5]).unwrap();
        assert_eq!(mu.len(), 2);
        assert_eq!(var.len(), 2);
        assert!((mu[0] - 1.0).abs() < 0.2);
        assert!((mu[1] - 0.0).abs() < 0.2);
    }
}
