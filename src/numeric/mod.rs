//! Numeric utilities shared by initialization, the inner optimizers and
//! sparsification: a thread-local RNG with a deterministic seed channel,
//! Latin Hypercube sampling, a dense grid enumerator, and small
//! vector-math helpers.
//!
//! The RNG is a per-thread generator, auto-seeded from OS entropy by
//! default but reseedable for reproducible tests, rather than shared
//! global mutable state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Deterministically reseeds this thread's RNG; every subsequent call to
/// the functions below, on this thread, becomes reproducible.
pub fn seed_rng(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// A uniform draw in `[0, 1)`.
pub fn uniform01() -> f64 {
    RNG.with(|rng| rng.borrow_mut().gen_range(0.0..1.0))
}

/// A uniform index in `[0, n)`. Panics if `n == 0`.
pub fn uniform_index(n: usize) -> usize {
    RNG.with(|rng| rng.borrow_mut().gen_range(0..n))
}

/// A uniform point in `[0, 1]^dim`.
pub fn uniform_point(dim: usize) -> Vec<f64> {
    (0..dim).map(|_| uniform01()).collect()
}

/// Perturbs `x` by an independent `U(-epsilon, epsilon)` offset per
/// coordinate, used by `ParallelRepeater`'s restart points.
pub fn perturb(x: &[f64], epsilon: f64) -> Vec<f64> {
    x.iter().map(|&v| v + (uniform01() * 2.0 - 1.0) * epsilon).collect()
}

fn shuffle(v: &mut [usize]) {
    // Fisher-Yates, using the same thread-local generator as the rest of this module.
    for i in (1..v.len()).rev() {
        let j = uniform_index(i + 1);
        v.swap(i, j);
    }
}

/// Latin Hypercube Sampling: `n` points in `[0, 1]^dim`. Each axis is
/// partitioned into `n` strata `[i/n, (i+1)/n)`; every stratum receives
/// exactly one (uniformly offset) sample, and each axis's stratum
/// assignment is permuted independently of the others.
pub fn random_lhs(dim: usize, n: usize) -> Vec<Vec<f64>> {
    if n == 0 {
        return Vec::new();
    }
    let mut points = vec![vec![0.0; dim]; n];
    for d in 0..dim {
        let mut strata: Vec<usize> = (0..n).collect();
        shuffle(&mut strata);
        for (point, &stratum) in points.iter_mut().zip(strata.iter()) {
            point[d] = (stratum as f64 + uniform01()) / n as f64;
        }
    }
    points
}

/// Enumerates every point of the `bins^dim` grid on `[0, 1]^dim`
/// (`bins == 1` collapses each axis to `0.0`), in odometer order. Shared by
/// `GridSampling` and `GridSearch` so both agree on grid layout.
pub fn grid_points(dim: usize, bins: usize) -> Vec<Vec<f64>> {
    let bins = bins.max(1);
    let denom = (bins.max(2) - 1) as f64;
    let total = bins.pow(dim as u32);
    let mut points = Vec::with_capacity(total);
    let mut idx = vec![0usize; dim];
    for _ in 0..total {
        points.push(idx.iter().map(|&i| i as f64 / denom).collect());
        let mut carry = true;
        for slot in idx.iter_mut() {
            if carry {
                *slot += 1;
                if *slot == bins {
                    *slot = 0;
                } else {
                    carry = false;
                }
            }
        }
    }
    points
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}
