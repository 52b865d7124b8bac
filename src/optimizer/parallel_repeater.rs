//! Runs a wrapped optimizer from `R` independent, perturbed starting points
//! and keeps the best result, the `R` runs executing in parallel via
//! `rayon`.

use super::{DifferentiableObjective, InnerOptimizer};
use crate::numeric::perturb;
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct ParallelRepeater<Inner: InnerOptimizer + Sync> {
    pub inner: Inner,
    pub repeats: usize,
    pub epsilon: f64,
}

impl<Inner: InnerOptimizer + Sync> ParallelRepeater<Inner> {
    pub fn new(inner: Inner, repeats: usize, epsilon: f64) -> Self {
        ParallelRepeater { inner, repeats, epsilon }
    }
}

impl<Inner: InnerOptimizer + Sync> InnerOptimizer for ParallelRepeater<Inner> {
    fn optimize(&self, f: &dyn DifferentiableObjective, x0: &[f64], bounded: bool) -> Vec<f64> {
        let repeats = self.repeats.max(1);
        let candidates: Vec<Vec<f64>> = (0..repeats)
            .into_par_iter()
            .map(|i| {
                let start = if i == 0 { x0.to_vec() } else { perturb(x0, self.epsilon) };
                self.inner.optimize(f, &start, bounded)
            })
            .collect();
        candidates
            .into_iter()
            .max_by(|a, b| f.eval(a).0.partial_cmp(&f.eval(b).0).unwrap())
            .unwrap_or_else(|| x0.to_vec())
    }
}
