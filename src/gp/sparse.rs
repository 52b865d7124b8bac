//! Sparsified GP: wraps any [`Model`], capping the number of retained
//! samples by repeatedly pruning the "densest" point.
//!
//! Observations are kept as a dense `n_samples x dim_out` matrix so a
//! pruned row drops out in `O(n)` rather than needing a vector-of-vectors
//! remove-and-shift.

use super::Model;
use crate::errors::BoResult;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::sync::Mutex;

#[derive(Debug)]
pub struct SparsifiedGp<Inner: Model> {
    inner: Inner,
    max_points: usize,
    samples: Vec<Vec<f64>>,
    observations: DMatrix<f64>,
}

impl<Inner: Model + Send + Sync> SparsifiedGp<Inner> {
    pub fn new(inner: Inner, max_points: usize) -> Self {
        let dim_out = inner.dim_out();
        SparsifiedGp { inner, max_points, samples: Vec::new(), observations: DMatrix::zeros(0, dim_out) }
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Removes the densest point (the one whose `dim_in` smallest non-self
    /// pairwise distances sum to a minimum) until at most `max_points` remain.
    fn sparsify(&mut self) -> BoResult<()> {
        let dim_in = self.inner.dim_in().max(1);
        while self.samples.len() > self.max_points {
            let n = self.samples.len();
            let best = Mutex::new((usize::MAX, f64::INFINITY));
            (0..n).into_par_iter().for_each(|i| {
                let mut distances: Vec<f64> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| euclidean_distance(&self.samples[i], &self.samples[j]))
                    .collect();
                distances.sort_by(|a, b| a.partial_cmp(b).unwrap());
                let density: f64 = distances.iter().take(dim_in).sum();
                let mut guard = best.lock().unwrap();
                if density < guard.1 {
                    *guard = (i, density);
                }
            });
            let (remove_idx, _) = best.into_inner().unwrap();
            self.samples.remove(remove_idx);
            self.observations = self.observations.clone().remove_row(remove_idx);
        }
        self.inner.compute(&self.samples, &matrix_to_rows(&self.observations))
    }
}

fn euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt()
}

fn matrix_to_rows(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    (0..m.nrows()).map(|i| m.row(i).iter().copied().collect()).collect()
}

impl<Inner: Model + Send + Sync> Model for SparsifiedGp<Inner> {
    fn dim_in(&self) -> usize {
        self.inner.dim_in()
    }

    fn dim_out(&self) -> usize {
        self.inner.dim_out()
    }

    fn n_samples(&self) -> usize {
        self.samples.len()
    }

    fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    fn compute(&mut self, samples: &[Vec<f64>], observations: &[Vec<f64>]) -> BoResult<()> {
        self.samples = samples.to_vec();
        let dim_out = self.inner.dim_out();
        self.observations = DMatrix::from_fn(samples.len(), dim_out, |i, j| observations[i][j]);
        if self.samples.len() > self.max_points {
            self.sparsify()
        } else {
            self.inner.compute(samples, observations)
        }
    }

    fn add_sample(&mut self, x: &[f64], y: &[f64]) -> BoResult<()> {
        self.samples.push(x.to_vec());
        let mut grown = self.observations.clone().insert_row(self.observations.nrows(), 0.0);
        for (j, &v) in y.iter().enumerate() {
            grown[(grown.nrows() - 1, j)] = v;
        }
        self.observations = grown;
        if self.samples.len() > self.max_points {
            self.sparsify()
        } else {
            self.inner.add_sample(x, y)
        }
    }

    fn query(&self, x: &[f64]) -> BoResult<(Vec<f64>, Vec<f64>)> {
        self.inner.query(x)
    }

    fn mean_observations(&self) -> Vec<f64> {
        self.inner.mean_observations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::{GaussianProcess, GaussianProcessConfig};
    use crate::kernel::ExpKernel;
    use crate::mean::NullMean;

    #[test]
    fn caps_at_max_points() {
        let base: GaussianProcess<ExpKernel, NullMean> = GaussianProcess::new(1, GaussianProcessConfig::default());
        let mut sparse = SparsifiedGp::new(base, 5);
        let samples: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 20.0]).collect();
        let obs: Vec<Vec<f64>> = samples.iter().map(|s| vec![s[0].sin()]).collect();
        sparse.compute(&samples, &obs).unwrap();
        assert_eq!(sparse.n_samples(), 5);
    }
}
