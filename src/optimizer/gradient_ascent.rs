//! Plain gradient ascent with optional Nesterov momentum, generalized from
//! the same family of GP hyperparameter update rules as [`super::adam::Adam`]
//! but without the per-coordinate second-moment adaptation.

use super::{clamp01_in_place, gradient_norm, DifferentiableObjective, InnerOptimizer};

#[derive(Clone, Debug)]
pub struct GradientAscent {
    pub iterations: usize,
    pub alpha: f64,
    pub gamma: f64,
    pub nesterov: bool,
    pub eps_stop: f64,
}

impl Default for GradientAscent {
    fn default() -> Self {
        GradientAscent { iterations: 300, alpha: 0.01, gamma: 0.0, nesterov: false, eps_stop: 0.0 }
    }
}

impl GradientAscent {
    pub fn new(iterations: usize, alpha: f64) -> Self {
        GradientAscent { iterations, alpha, ..Default::default() }
    }

    pub fn with_momentum(iterations: usize, alpha: f64, gamma: f64, nesterov: bool) -> Self {
        GradientAscent { iterations, alpha, gamma, nesterov, ..Default::default() }
    }
}

impl InnerOptimizer for GradientAscent {
    fn optimize(&self, f: &dyn DifferentiableObjective, x0: &[f64], bounded: bool) -> Vec<f64> {
        let dim = x0.len();
        let mut params = x0.to_vec();
        clamp01_in_place(&mut params, bounded);
        let mut velocity = vec![0.0; dim];

        let mut best_params = params.clone();
        let mut best = f64::NEG_INFINITY;

        for _ in 0..self.iterations {
            // Nesterov: evaluate the gradient at the momentum-ahead point,
            // not at the current parameters.
            let lookahead: Vec<f64> = if self.nesterov {
                params.iter().zip(&velocity).map(|(p, v)| p + self.gamma * v).collect()
            } else {
                params.clone()
            };
            let (value, grad) = f.eval(&lookahead);
            if value > best {
                best = value;
                best_params = params.clone();
            }
            for j in 0..dim {
                velocity[j] = self.gamma * velocity[j] + self.alpha * grad[j];
                params[j] += velocity[j];
            }
            clamp01_in_place(&mut params, bounded);
            if gradient_norm(&grad) < self.eps_stop {
                break;
            }
        }

        best_params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_quadratic_maximum() {
        let opt = GradientAscent::new(500, 0.05);
        let f = |x: &[f64]| {
            let v = -(x[0] - 0.4).powi(2);
            let g = vec![-2.0 * (x[0] - 0.4)];
            (v, g)
        };
        let x_star = opt.optimize(&f, &[0.9], true);
        assert!((x_star[0] - 0.4).abs() < 1e-2);
    }

    #[test]
    fn nesterov_momentum_still_converges() {
        let opt = GradientAscent::with_momentum(500, 0.02, 0.9, true);
        let f = |x: &[f64]| {
            let v = -(x[0] - 0.6).powi(2);
            let g = vec![-2.0 * (x[0] - 0.6)];
            (v, g)
        };
        let x_star = opt.optimize(&f, &[0.1], true);
        assert!((x_star[0] - 0.6).abs() < 5e-2);
    }
}
