//! Uniform-random control baseline: ignores the objective entirely.

use super::{DifferentiableObjective, InnerOptimizer};
use crate::numeric::uniform_point;

#[derive(Clone, Copy, Debug, Default)]
pub struct RandomPoint;

impl InnerOptimizer for RandomPoint {
    fn optimize(&self, _f: &dyn DifferentiableObjective, x0: &[f64], _bounded: bool) -> Vec<f64> {
        uniform_point(x0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_a_point_of_the_right_dimension_in_bounds() {
        let opt = RandomPoint;
        let f = |x: &[f64]| (x[0], vec![0.0]);
        let x = opt.optimize(&f, &[0.5, 0.5, 0.5], true);
        assert_eq!(x.len(), 3);
        assert!(x.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }
}
