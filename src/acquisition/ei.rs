//! Expected Improvement, with a lazily-refreshed cache of the best
//! aggregated observation so far (`f+`), invalidated whenever `nb_samples`
//! changes rather than via an equality heuristic.

use super::{Acquisition, AggregatorFn};
use crate::gp::Model;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use std::cell::Cell;

#[derive(Debug)]
pub struct Ei<'m, S: Model> {
    model: &'m S,
    pub jitter: f64,
    /// `f+ = max_i aggregator(mu(x_i))`, refreshed when `nb_samples` changes.
    /// Single-writer semantics are the caller's responsibility if an `Ei` is
    /// shared across threads.
    best: Cell<f64>,
    cached_n: Cell<usize>,
}

impl<'m, S: Model> Ei<'m, S> {
    /// `acqui_ei.jitter` defaults to `0`.
    pub fn new(model: &'m S, jitter: f64) -> Self {
        Ei { model, jitter, best: Cell::new(f64::NEG_INFINITY), cached_n: Cell::new(usize::MAX) }
    }

    fn refresh_best(&self, aggregator: AggregatorFn) {
        let n = self.model.n_samples();
        if n == self.cached_n.get() {
            return;
        }
        let mut best = f64::NEG_INFINITY;
        for x in self.model.samples() {
            if let Ok((mu, _)) = self.model.query(x) {
                let v = aggregator(&mu);
                if v > best {
                    best = v;
                }
            }
        }
        self.best.set(best);
        self.cached_n.set(n);
    }
}

impl<'m, S: Model + Sync> Acquisition for Ei<'m, S> {
    fn evaluate(&self, x: &[f64], aggregator: AggregatorFn, _want_grad: bool) -> (f64, Option<Vec<f64>>) {
        if self.model.n_samples() == 0 {
            return (0.0, None);
        }
        self.refresh_best(aggregator);
        let (mu, var) = match self.model.query(x) {
            Ok(result) => result,
            Err(_) => return (0.0, None),
        };
        let sigma = aggregator(&var).max(0.0).sqrt();
        if sigma < 1e-10 {
            return (0.0, None);
        }
        let improvement = aggregator(&mu) - self.best.get() - self.jitter;
        let z = improvement / sigma;
        let standard_normal = Normal::new(0.0, 1.0).expect("standard normal parameters are always valid");
        let ei = improvement * standard_normal.cdf(z) + sigma * standard_normal.pdf(z);
        (ei.max(0.0), None)
    }
}
