//! The core, single-output Gaussian Process surrogate.
//!
//! Fits `D = {(x_i, y_i)}` with a kernel and a mean function, caches the
//! Cholesky factor `L` of the (noisy, jittered) Gram matrix and the
//! `alpha = K^-1 (y - m(X))` vector, and answers `mu`/`sigma^2` queries,
//! the log marginal likelihood and its gradient, and the LOO-CV log
//! predictive density.
//!
//! Splits responsibilities between a kernel, a mean function and a cached
//! factorization; stores hyperparameters in log-space throughout and
//! exposes an incremental `add_sample` alongside the usual full `compute`.

pub mod multi;
pub mod sparse;

use crate::algebra::{
    cholesky_solve, cholesky_with_retries, extend_cholesky, forward_solve, inverse_from_cholesky,
    log_det_from_cholesky, DEFAULT_JITTER,
};
use crate::errors::{check_finite, BoError, BoResult};
use crate::kernel::Kernel;
use crate::mean::{GPContext, Mean};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

/// Generic surrogate-model contract used by the orchestrator and by the
/// acquisition layer: fit on (possibly multi-output) data, query mu/sigma^2
/// per output, and accept one new observation at a time.
pub trait Model: std::fmt::Debug {
    fn dim_in(&self) -> usize;
    fn dim_out(&self) -> usize;
    fn n_samples(&self) -> usize;

    /// The training inputs the model was last fit on (empty if none).
    /// Used by acquisition functions to recompute `f+` when `nb_samples` changes.
    fn samples(&self) -> &[Vec<f64>];

    /// Full (re)fit on the given dataset. Replaces any previously fit data.
    fn compute(&mut self, samples: &[Vec<f64>], observations: &[Vec<f64>]) -> BoResult<()>;

    /// Incrementally extends the fit with one new observation.
    fn add_sample(&mut self, x: &[f64], y: &[f64]) -> BoResult<()>;

    /// Predicts `(mu, sigma^2)` per output at `x`.
    fn query(&self, x: &[f64]) -> BoResult<(Vec<f64>, Vec<f64>)>;

    /// The empirical mean of each output's observations (`0` per output if empty).
    fn mean_observations(&self) -> Vec<f64>;
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussianProcessConfig {
    /// `kernel.noise`: additive observation noise variance.
    pub noise: f64,
    /// `kernel.optimize_noise`: whether the noise variance is a fittable hyperparameter.
    pub optimize_noise: bool,
    /// Base Cholesky jitter (`epsilon` in the data model).
    pub cholesky_epsilon: f64,
    /// Bounded number of jitter-escalation retries before signalling a fatal numeric error.
    pub max_cholesky_retries: usize,
}

impl Default for GaussianProcessConfig {
    fn default() -> Self {
        GaussianProcessConfig {
            noise: 0.01,
            optimize_noise: false,
            cholesky_epsilon: DEFAULT_JITTER,
            max_cholesky_retries: 6,
        }
    }
}

/// A single-output Gaussian Process.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussianProcess<K: Kernel, M: Mean> {
    kernel: K,
    mean: M,
    noise: f64,
    optimize_noise: bool,
    cholesky_epsilon: f64,
    max_cholesky_retries: usize,
    dim_in: usize,
    samples: Vec<Vec<f64>>,
    observations: Vec<f64>,
    obs_mean: f64,
    #[cfg_attr(feature = "mop_serde", serde(skip))]
    cholesky: Option<DMatrix<f64>>,
    #[cfg_attr(feature = "mop_serde", serde(skip))]
    alpha: Option<DVector<f64>>,
    /// `false` exactly when the last `compute`/`add_sample`/`recompute` hit
    /// an unrecoverable Cholesky failure; cleared back to `true` by the next
    /// successful fit.
    valid: bool,
}

impl<K: Kernel, M: Mean> GaussianProcess<K, M> {
    /// Builds an empty GP (no training data yet) with default hyperparameters for `dim_in`.
    pub fn new(dim_in: usize, config: GaussianProcessConfig) -> Self {
        GaussianProcess {
            kernel: K::default_for_dim(dim_in),
            mean: M::default_for_dim(dim_in),
            noise: config.noise,
            optimize_noise: config.optimize_noise,
            cholesky_epsilon: config.cholesky_epsilon,
            max_cholesky_retries: config.max_cholesky_retries,
            dim_in,
            samples: Vec::new(),
            observations: Vec::new(),
            obs_mean: 0.0,
            cholesky: None,
            alpha: None,
            valid: true,
        }
    }

    pub fn with_kernel_and_mean(dim_in: usize, kernel: K, mean: M, config: GaussianProcessConfig) -> Self {
        GaussianProcess {
            kernel,
            mean,
            noise: config.noise,
            optimize_noise: config.optimize_noise,
            cholesky_epsilon: config.cholesky_epsilon,
            max_cholesky_retries: config.max_cholesky_retries,
            dim_in,
            samples: Vec::new(),
            observations: Vec::new(),
            obs_mean: 0.0,
            cholesky: None,
            alpha: None,
            valid: true,
        }
    }

    pub fn dim_in(&self) -> usize {
        self.dim_in
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    pub fn observations(&self) -> &[f64] {
        &self.observations
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn mean_fn(&self) -> &M {
        &self.mean
    }

    pub fn noise(&self) -> f64 {
        self.noise
    }

    pub fn optimize_noise(&self) -> bool {
        self.optimize_noise
    }

    /// The kernel's hyperparameters (log-space), with the noise appended in the
    /// same `log(sqrt(.))` convention as the signal-variance parameters, when
    /// `optimize_noise` is enabled.
    pub fn kernel_params_with_noise(&self) -> Vec<f64> {
        let mut p = self.kernel.params();
        if self.optimize_noise {
            p.push(0.5 * self.noise.ln());
        }
        p
    }

    pub fn set_kernel_params_with_noise(&mut self, params: &[f64]) {
        let n_kernel = self.kernel.n_params();
        self.kernel.set_params(&params[..n_kernel]);
        if self.optimize_noise {
            self.noise = (2.0 * params[n_kernel]).exp();
        }
    }

    pub fn mean_params(&self) -> Vec<f64> {
        self.mean.params()
    }

    pub fn set_mean_params(&mut self, params: &[f64]) {
        self.mean.set_params(params);
    }

    /// Full (re)fit on the given dataset.
    pub fn compute(&mut self, samples: &[Vec<f64>], observations: &[f64]) -> BoResult<()> {
        for &y in observations {
            check_finite(&[y])?;
        }
        self.samples = samples.to_vec();
        self.observations = observations.to_vec();
        self.recompute(true, true)
    }

    /// Recomputes the caches. `update_obs_mean` refreshes the empirical
    /// observation mean (used by [`crate::mean::DataMean`]); `update_full_kernel`
    /// rebuilds the Gram matrix and its Cholesky factor from scratch (skip it
    /// when only mean hyperparameters changed, since `L` is unaffected by `theta_m`).
    pub fn recompute(&mut self, update_obs_mean: bool, update_full_kernel: bool) -> BoResult<()> {
        let n = self.samples.len();
        if update_obs_mean {
            self.obs_mean =
                if n == 0 { 0.0 } else { self.observations.iter().sum::<f64>() / n as f64 };
        }
        if n == 0 {
            self.cholesky = None;
            self.alpha = None;
            self.valid = true;
            return Ok(());
        }
        if update_full_kernel || self.cholesky.is_none() {
            let gram = self.gram_matrix();
            match cholesky_with_retries(&gram, self.cholesky_epsilon, self.max_cholesky_retries) {
                Some(l) => self.cholesky = Some(l),
                None => {
                    tracing::warn!(n_samples = n, "Cholesky factorization failed after all jitter retries");
                    self.cholesky = None;
                    self.alpha = None;
                    self.valid = false;
                    return Ok(());
                }
            }
        }
        self.rebuild_alpha();
        self.valid = true;
        Ok(())
    }

    fn gram_matrix(&self) -> DMatrix<f64> {
        let n = self.samples.len();
        DMatrix::from_fn(n, n, |i, j| {
            let base = self.kernel.k(&self.samples[i], &self.samples[j]);
            if i == j {
                base + self.noise
            } else {
                base
            }
        })
    }

    fn rebuild_alpha(&mut self) {
        let n = self.samples.len();
        let mut r = DVector::zeros(n);
        for i in 0..n {
            r[i] = self.observations[i] - self.mean.mean(&self.samples[i], self);
        }
        let l = self.cholesky.as_ref().expect("cholesky present after a successful factorization");
        self.alpha = Some(cholesky_solve(l, &r));
    }

    /// Incrementally extends the fit with one new observation, via a rank-1
    /// extension of the Cholesky factor. Falls back to a full recompute if
    /// the extension would be ill-conditioned, or if the mean function's
    /// value for existing points shifted (e.g. [`crate::mean::DataMean`]'s
    /// observation-mean changing makes every residual stale, not just the
    /// new point's).
    pub fn add_sample(&mut self, x: &[f64], y: f64) -> BoResult<()> {
        check_finite(&[y])?;
        if self.samples.is_empty() {
            self.samples.push(x.to_vec());
            self.observations.push(y);
            return self.recompute(true, true);
        }

        let probe = self.samples[0].clone();
        let mean_before = self.mean.mean(&probe, self);

        let k_star = DVector::from_fn(self.samples.len(), |i, _| self.kernel.k(x, &self.samples[i]));
        let k_new_new = self.kernel.k(x, x) + self.noise + self.cholesky_epsilon;

        self.samples.push(x.to_vec());
        self.observations.push(y);
        self.obs_mean = self.observations.iter().sum::<f64>() / self.observations.len() as f64;

        let mean_after = self.mean.mean(&probe, self);
        if (mean_after - mean_before).abs() > 1e-12 {
            return self.recompute(true, true);
        }

        let extended = match self.cholesky.as_ref() {
            Some(l) => extend_cholesky(l, &k_star, k_new_new),
            None => None,
        };
        match extended {
            Some(new_l) => {
                self.cholesky = Some(new_l);
                self.rebuild_alpha();
                self.valid = true;
                Ok(())
            }
            None => self.recompute(true, true),
        }
    }

    /// Predicts `(mu, sigma^2)` at `x`. Returns `(m(x), k(x,x))` on an empty dataset.
    pub fn predict(&self, x: &[f64]) -> BoResult<(f64, f64)> {
        if !self.valid {
            return Err(BoError::Misuse("cannot query a Gaussian Process with stale/invalid caches"));
        }
        if self.samples.is_empty() {
            let mu = self.mean.mean(x, self);
            let var = self.kernel.k(x, x);
            return Ok((mu, var));
        }
        let l = self.cholesky.as_ref().expect("valid GP with samples has a Cholesky factor");
        let alpha = self.alpha.as_ref().expect("valid GP with samples has alpha");
        let k_star = DVector::from_fn(self.samples.len(), |i, _| self.kernel.k(x, &self.samples[i]));
        let mu = self.mean.mean(x, self) + k_star.dot(alpha);
        let v = forward_solve(l, &k_star);
        let k_xx = self.kernel.k(x, x);
        let var = (k_xx - v.dot(&v)).max(0.0);
        Ok((mu, var))
    }

    /// `log p(y|X, theta)`. Returns `f64::NEG_INFINITY` on any numeric failure
    /// (collapsed Cholesky, non-finite result) rather than propagating an error.
    pub fn log_marginal_likelihood(&self) -> f64 {
        if !self.valid || self.samples.is_empty() {
            return if self.valid { 0.0 } else { f64::NEG_INFINITY };
        }
        let l = self.cholesky.as_ref().unwrap();
        let alpha = self.alpha.as_ref().unwrap();
        let n = self.samples.len();
        let r = DVector::from_fn(n, |i, _| self.observations[i] - self.mean.mean(&self.samples[i], self));
        let data_fit = -0.5 * r.dot(alpha);
        let complexity = -0.5 * log_det_from_cholesky(l);
        let normalizer = -(n as f64 / 2.0) * (2.0 * PI).ln();
        let result = data_fit + complexity + normalizer;
        if result.is_finite() {
            result
        } else {
            f64::NEG_INFINITY
        }
    }

    fn gradient_covariance_matrices(&self) -> Vec<DMatrix<f64>> {
        let n = self.samples.len();
        let n_params = self.kernel.n_params();
        let mut mats = vec![DMatrix::<f64>::zeros(n, n); n_params];
        for i in 0..n {
            for j in 0..n {
                let g = self.kernel.gradient(&self.samples[i], &self.samples[j]);
                for (p, mat) in mats.iter_mut().enumerate() {
                    mat[(i, j)] = g[p];
                }
            }
        }
        mats
    }

    /// Gradient of the log marginal likelihood with respect to the kernel's
    /// log-space hyperparameters, with the noise gradient appended last when
    /// `optimize_noise` is set (see [`Self::kernel_params_with_noise`]).
    /// Empty (and meaningless) if the GP is not valid or has no samples.
    pub fn gradient_log_marginal_likelihood_kernel(&self) -> Vec<f64> {
        if !self.valid || self.samples.is_empty() {
            return vec![0.0; self.kernel_params_with_noise().len()];
        }
        let l = self.cholesky.as_ref().unwrap();
        let alpha = self.alpha.as_ref().unwrap();
        let k_inv = inverse_from_cholesky(l);
        let alpha_outer = alpha * alpha.transpose();
        let m = &alpha_outer - &k_inv;

        let mut grads: Vec<f64> =
            self.gradient_covariance_matrices().iter().map(|dk| 0.5 * m.component_mul(dk).sum()).collect();

        if self.optimize_noise {
            grads.push(self.noise * (alpha.dot(alpha) - k_inv.trace()));
        }
        grads
    }

    /// Gradient of the log marginal likelihood with respect to the mean
    /// function's hyperparameters.
    pub fn gradient_log_marginal_likelihood_mean(&self) -> Vec<f64> {
        let n_params = self.mean.n_params();
        if n_params == 0 || !self.valid || self.samples.is_empty() {
            return vec![0.0; n_params];
        }
        let alpha = self.alpha.as_ref().unwrap();
        let mut grads = vec![0.0; n_params];
        for i in 0..self.samples.len() {
            let g = self.mean.gradient(&self.samples[i], self);
            for (p, grad) in grads.iter_mut().enumerate() {
                *grad += alpha[i] * g[p];
            }
        }
        grads
    }

    /// Leave-one-out cross-validation log predictive density (Rasmussen & Williams §5.4.2).
    pub fn loo_cv_log_predictive(&self) -> f64 {
        if !self.valid || self.samples.is_empty() {
            return if self.valid { 0.0 } else { f64::NEG_INFINITY };
        }
        let l = self.cholesky.as_ref().unwrap();
        let alpha = self.alpha.as_ref().unwrap();
        let k_inv = inverse_from_cholesky(l);
        let mut total = 0.0;
        for i in 0..self.samples.len() {
            let k_inv_ii = k_inv[(i, i)];
            if !(k_inv_ii > 0.0) {
                return f64::NEG_INFINITY;
            }
            let sigma2_i = 1.0 / k_inv_ii;
            let mu_i = self.observations[i] - alpha[i] / k_inv_ii;
            let residual = self.observations[i] - mu_i;
            let log_p = -0.5 * sigma2_i.ln() - residual * residual / (2.0 * sigma2_i) - 0.5 * (2.0 * PI).ln();
            if !log_p.is_finite() {
                return f64::NEG_INFINITY;
            }
            total += log_p;
        }
        total
    }
}

impl<K: Kernel, M: Mean> GPContext for GaussianProcess<K, M> {
    fn mean_observation(&self) -> f64 {
        self.obs_mean
    }
}

impl<K: Kernel, M: Mean> Model for GaussianProcess<K, M> {
    fn dim_in(&self) -> usize {
        self.dim_in
    }

    fn dim_out(&self) -> usize {
        1
    }

    fn n_samples(&self) -> usize {
        self.n_samples()
    }

    fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    fn compute(&mut self, samples: &[Vec<f64>], observations: &[Vec<f64>]) -> BoResult<()> {
        let scalar: Vec<f64> = observations.iter().map(|o| o[0]).collect();
        GaussianProcess::compute(self, samples, &scalar)
    }

    fn add_sample(&mut self, x: &[f64], y: &[f64]) -> BoResult<()> {
        GaussianProcess::add_sample(self, x, y[0])
    }

    fn query(&self, x: &[f64]) -> BoResult<(Vec<f64>, Vec<f64>)> {
        let (mu, var) = self.predict(x)?;
        Ok((vec![mu], vec![var]))
    }

    fn mean_observations(&self) -> Vec<f64> {
        vec![self.obs_mean]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Matern52Kernel;
    use crate::mean::NullMean;

    fn gp() -> GaussianProcess<Matern52Kernel, NullMean> {
        GaussianProcess::new(1, GaussianProcessConfig { noise: 1e-6, ..Default::default() })
    }

    #[test]
    fn empty_gp_degenerates_to_prior() {
        let g = gp();
        let (mu, var) = g.predict(&[0.3]).unwrap();
        assert_eq!(mu, 0.0);
        assert!((var - g.kernel().k(&[0.3], &[0.3])).abs() < 1e-12);
    }

    #[test]
    fn fits_training_point_closely() {
        let mut g = gp();
        g.compute(&[vec![0.0], vec![0.5], vec![1.0]], &[0.0, 1.0, 0.0]).unwrap();
        let (mu, var) = g.predict(&[0.5]).unwrap();
        assert!((mu - 1.0).abs() < 1e-3);
        assert!(var < 1e-3);
    }

    #[test]
    fn log_likelihood_finite_after_compute() {
        let mut g = gp();
        g.compute(&[vec![0.0], vec![0.5], vec![1.0]], &[0.0, 1.0, 0.0]).unwrap();
        assert!(g.log_marginal_likelihood().is_finite());
        assert!(g.loo_cv_log_predictive().is_finite());
    }

    #[test]
    fn incremental_matches_full_recompute() {
        let points = vec![vec![0.1], vec![0.3], vec![0.5], vec![0.6], vec![0.7], vec![0.8], vec![0.9], vec![1.0]];
        let obs: Vec<f64> = points.iter().map(|p| (p[0] * 6.0).sin()).collect();

        let mut incremental = gp();
        for i in 0..points.len() {
            incremental.add_sample(&points[i], obs[i]).unwrap();
        }

        let mut full = gp();
        full.compute(&points, &obs).unwrap();

        let (mu_i, var_i) = incremental.predict(&[0.45]).unwrap();
        let (mu_f, var_f) = full.predict(&[0.45]).unwrap();
        assert!((mu_i - mu_f).abs() < 1e-6);
        assert!((var_i - var_f).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_finite_observation() {
        let mut g = gp();
        let err = g.add_sample(&[0.2], f64::NAN).unwrap_err();
        assert!(matches!(err, BoError::Evaluation(_)));
        assert_eq!(g.n_samples(), 0);
    }
}
