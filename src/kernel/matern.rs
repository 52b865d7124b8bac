//! Matern 3/2 and 5/2 kernels, isotropic.

use super::{squared_distance, Kernel};

/// `k(x,y) = sigma² (1 + sqrt(3) d/l) exp(-sqrt(3) d/l)`, `d = ||x-y||`.
///
/// Parameters, in log-space: `(log l, log sqrt(sigma²))`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matern32Kernel {
    log_length: f64,
    log_sigma: f64,
}

impl Matern32Kernel {
    pub fn new(length: f64, signal_variance: f64) -> Self {
        Matern32Kernel { log_length: length.ln(), log_sigma: 0.5 * signal_variance.ln() }
    }

    fn length(&self) -> f64 {
        self.log_length.exp()
    }

    fn sigma_sq(&self) -> f64 {
        (2.0 * self.log_sigma).exp()
    }
}

impl Kernel for Matern32Kernel {
    fn default_for_dim(_dim: usize) -> Self {
        Matern32Kernel::new(1.0, 1.0)
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
        let d = squared_distance(x, y).sqrt();
        let l = self.length();
        let r = 3f64.sqrt() * d / l;
        self.sigma_sq() * (1.0 + r) * (-r).exp()
    }

    fn gradient(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let d = squared_distance(x, y).sqrt();
        let l = self.length();
        let sigma_sq = self.sigma_sq();
        let r = 3f64.sqrt() * d / l;
        let d_log_length = sigma_sq * r * r * (-r).exp();
        let d_log_sigma = 2.0 * self.k(x, y);
        vec![d_log_length, d_log_sigma]
    }
}

/// `k(x,y) = sigma² (1 + sqrt(5) d/l + 5 d²/(3 l²)) exp(-sqrt(5) d/l)`.
///
/// Parameters, in log-space: `(log l, log sqrt(sigma²))`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matern52Kernel {
    log_length: f64,
    log_sigma: f64,
}

impl Matern52Kernel {
    pub fn new(length: f64, signal_variance: f64) -> Self {
        Matern52Kernel { log_length: length.ln(), log_sigma: 0.5 * signal_variance.ln() }
    }

    fn length(&self) -> f64 {
        self.log_length.exp()
    }

    fn sigma_sq(&self) -> f64 {
        (2.0 * self.log_sigma).exp()
    }
}

impl Kernel for Matern52Kernel {
    fn default_for_dim(_dim: usize) -> Self {
        Matern52Kernel::new(1.0, 1.0)
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
        let d = squared_distance(x, y).sqrt();
        let l = self.length();
        let r = 5f64.sqrt() * d / l;
        self.sigma_sq() * (1.0 + r + r * r / 3.0) * (-r).exp()
    }

    fn gradient(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let d = squared_distance(x, y).sqrt();
        let l = self.length();
        let sigma_sq = self.sigma_sq();
        let r = 5f64.sqrt() * d / l;
        let d_log_length = sigma_sq * (-r).exp() * r * r * (1.0 + r) / 3.0;
        let d_log_sigma = 2.0 * self.k(x, y);
        vec![d_log_length, d_log_sigma]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finite_difference_check<K: Kernel>(k: &K, x: &[f64], y: &[f64]) {
        let analytic = k.gradient(x, y);
        let eps = 1e-6;
        for (i, &g) in analytic.iter().enumerate() {
            let mut params_plus = k.params();
            params_plus[i] += eps;
            let mut k_plus = k.clone();
            k_plus.set_params(&params_plus);
            let mut params_minus = k.params();
            params_minus[i] -= eps;
            let mut k_minus = k.clone();
            k_minus.set_params(&params_minus);
            let fd = (k_plus.k(x, y) - k_minus.k(x, y)) / (2.0 * eps);
            assert!((fd - g).abs() < 1e-4, "param {i}: analytic {g}, fd {fd}");
        }
    }

    #[test]
    fn matern32_gradient_matches_finite_difference() {
        let k = Matern32Kernel::new(0.8, 1.6);
        finite_difference_check(&k, &[0.1, 0.4], &[0.9, 0.2]);
    }

    #[test]
    fn matern52_gradient_matches_finite_difference() {
        let k = Matern52Kernel::new(1.2, 0.9);
        finite_difference_check(&k, &[0.2, 0.3], &[0.4, 0.7]);
    }

    #[test]
    fn matern_kernels_nonnegative_on_diagonal() {
        let k32 = Matern32Kernel::new(1.0, 1.0);
        let k52 = Matern52Kernel::new(1.0, 1.0);
        let x = vec![0.5, 0.5];
        assert!(k32.k(&x, &x) >= 0.0);
        assert!(k52.k(&x, &x) >= 0.0);
    }
}
