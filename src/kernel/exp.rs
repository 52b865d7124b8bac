//! Squared-exponential (a.k.a. Gaussian / RBF) kernel, isotropic.

use super::{squared_distance, Kernel};

/// `k(x,y) = sigma² exp(-||x-y||² / (2 l²))`.
///
/// Parameters, in log-space: `(log l, log sqrt(sigma²))`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpKernel {
    log_length: f64,
    log_sigma: f64,
}

impl ExpKernel {
    /// Builds a kernel from plain (non-log) length scale and signal variance.
    pub fn new(length: f64, signal_variance: f64) -> Self {
        ExpKernel { log_length: length.ln(), log_sigma: 0.5 * signal_variance.ln() }
    }

    fn length(&self) -> f64 {
        self.log_length.exp()
    }

    fn sigma_sq(&self) -> f64 {
        (2.0 * self.log_sigma).exp()
    }
}

impl Kernel for ExpKernel {
    fn default_for_dim(_dim: usize) -> Self {
        // matches kernel_exp.{sigma_sq,l} (1,1) in the configuration surface
        ExpKernel::new(1.0, 1.0)
    }

    fn n_params(&self) -> usize {
        2
    }

    fn params(&self) -> Vec<f64> {
        vec![self.log_length, self.log_sigma]
    }

    fn set_params(&mut self, params: &[f64]) {
        self.log_length = params[0];
        self.log_sigma = params[1];
    }

    fn k(&self, x: &[f64], y: &[f64]) -> f64 {
        let d2 = squared_distance(x, y);
        let l = self.length();
        self.sigma_sq() * (-d2 / (2.0 * l * l)).exp()
    }

    fn gradient(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let d2 = squared_distance(x, y);
        let l = self.length();
        let k_val = self.k(x, y);
        let d_log_length = k_val * d2 / (l * l);
        let d_log_sigma = 2.0 * k_val;
        vec![d_log_length, d_log_sigma]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_is_signal_variance() {
        let k = ExpKernel::new(0.7, 2.5);
        let x = vec![0.3, 0.8];
        assert!((k.k(&x, &x) - 2.5).abs() < 1e-10);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let k = ExpKernel::new(0.9, 1.4);
        let x = vec![0.1, 0.4];
        let y = vec![0.6, 0.2];
        let analytic = k.gradient(&x, &y);
        let eps = 1e-6;
        for (i, &g) in analytic.iter().enumerate() {
            let mut params = k.params();
            params[i] += eps;
            let mut k_plus = k.clone();
            k_plus.set_params(&params);
            let mut params_minus = k.params();
            params_minus[i] -= eps;
            let mut k_minus = k.clone();
            k_minus.set_params(&params_minus);
            let fd = (k_plus.k(&x, &y) - k_minus.k(&x, &y)) / (2.0 * eps);
            assert!((fd - g).abs() < 1e-4, "param {i}: analytic {g}, fd {fd}");
        }
    }
}
