//! Initialization strategies. Each generates a design in `[0, 1]^d`; the
//! orchestrator evaluates the objective at every generated point and
//! appends it to the dataset, aborting the whole strategy on the first
//! NaN/Inf observation.

use crate::numeric::{grid_points, random_lhs, uniform_index, uniform_point};

pub trait InitStrategy: std::fmt::Debug {
    /// The initial design, in `[0, 1]^dim`.
    fn generate(&self, dim: usize) -> Vec<Vec<f64>>;
}

/// `N` i.i.d. uniform samples in `[0, 1]^d`.
#[derive(Clone, Copy, Debug)]
pub struct RandomSampling {
    pub samples: usize,
}

impl Default for RandomSampling {
    fn default() -> Self {
        RandomSampling { samples: 10 }
    }
}

impl InitStrategy for RandomSampling {
    fn generate(&self, dim: usize) -> Vec<Vec<f64>> {
        (0..self.samples).map(|_| uniform_point(dim)).collect()
    }
}

/// `N` samples via Latin Hypercube sampling.
#[derive(Clone, Copy, Debug)]
pub struct Lhs {
    pub samples: usize,
}

impl Default for Lhs {
    fn default() -> Self {
        Lhs { samples: 10 }
    }
}

impl InitStrategy for Lhs {
    fn generate(&self, dim: usize) -> Vec<Vec<f64>> {
        random_lhs(dim, self.samples)
    }
}

/// Evaluates the full `bins^d` grid.
#[derive(Clone, Copy, Debug)]
pub struct GridSampling {
    pub bins: usize,
}

impl Default for GridSampling {
    fn default() -> Self {
        GridSampling { bins: 5 }
    }
}

impl InitStrategy for GridSampling {
    fn generate(&self, dim: usize) -> Vec<Vec<f64>> {
        grid_points(dim, self.bins)
    }
}

/// `N` samples drawn uniformly from the `bins^d` grid (with replacement).
#[derive(Clone, Copy, Debug)]
pub struct RandomSamplingGrid {
    pub samples: usize,
    pub bins: usize,
}

impl Default for RandomSamplingGrid {
    fn default() -> Self {
        RandomSamplingGrid { samples: 10, bins: 5 }
    }
}

impl InitStrategy for RandomSamplingGrid {
    fn generate(&self, dim: usize) -> Vec<Vec<f64>> {
        let grid = grid_points(dim, self.bins);
        if grid.is_empty() {
            return Vec::new();
        }
        (0..self.samples).map(|_| grid[uniform_index(grid.len())].clone()).collect()
    }
}

/// No-op: generates no samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInit;

impl InitStrategy for NoInit {
    fn generate(&self, _dim: usize) -> Vec<Vec<f64>> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_sampling_respects_bounds_and_count() {
        let design = RandomSampling { samples: 7 }.generate(3);
        assert_eq!(design.len(), 7);
        assert!(design.iter().all(|p| p.len() == 3 && p.iter().all(|&v| (0.0..1.0).contains(&v))));
    }

    #[test]
    fn grid_sampling_covers_every_cell() {
        let design = GridSampling { bins: 4 }.generate(2);
        assert_eq!(design.len(), 16);
    }

    #[test]
    fn no_init_generates_nothing() {
        assert!(NoInit.generate(5).is_empty());
    }
}
