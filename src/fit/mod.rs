//! Hyperparameter fitters: maximize the log marginal likelihood (or the
//! LOO-CV log predictive density) over the kernel's and/or mean's
//! hyperparameters, using an inner optimizer (`Rprop` by default). Every
//! fitter leaves the GP's caches refreshed.

use crate::errors::{BoError, BoResult};
use crate::gp::{GaussianProcess, Model, MultiOutputGp};
use crate::kernel::Kernel;
use crate::mean::Mean;
use crate::optimizer::{InnerOptimizer, Rprop};
use rayon::prelude::*;

/// Maximizes over some subset of `(theta_k, theta_m)` and commits the
/// result back onto the GP. Hyperparameters live in an unrestricted
/// (log-space) domain, so fitters always call their inner optimizer
/// unbounded.
pub trait HpFitter<K: Kernel, M: Mean>: std::fmt::Debug {
    fn fit(&self, gp: &mut GaussianProcess<K, M>) -> BoResult<()>;
}

/// Never invoked; calling it signals a misuse error.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpt;

impl<K: Kernel, M: Mean> HpFitter<K, M> for NoOpt {
    fn fit(&self, _gp: &mut GaussianProcess<K, M>) -> BoResult<()> {
        Err(BoError::Misuse("NoOpt hyperparameter fitter was invoked"))
    }
}

/// Maximizes `log p(y|X, theta_k)` over the kernel's hyperparameters
/// (noise included when `optimize_noise` is set).
#[derive(Clone, Debug)]
pub struct KernelLf<Opt: InnerOptimizer = Rprop> {
    pub optimizer: Opt,
}

impl Default for KernelLf<Rprop> {
    fn default() -> Self {
        KernelLf { optimizer: Rprop::default() }
    }
}

impl<Opt: InnerOptimizer> KernelLf<Opt> {
    pub fn new(optimizer: Opt) -> Self {
        KernelLf { optimizer }
    }
}

impl<K, M, Opt> HpFitter<K, M> for KernelLf<Opt>
where
    K: Kernel + Sync,
    M: Mean + Sync,
    Opt: InnerOptimizer,
{
    fn fit(&self, gp: &mut GaussianProcess<K, M>) -> BoResult<()> {
        let x0 = gp.kernel_params_with_noise();
        if x0.is_empty() {
            return Ok(());
        }
        let base = gp.clone();
        let objective = move |p: &[f64]| -> (f64, Vec<f64>) {
            let mut probe = base.clone();
            probe.set_kernel_params_with_noise(p);
            let _ = probe.recompute(false, true);
            (probe.log_marginal_likelihood(), probe.gradient_log_marginal_likelihood_kernel())
        };
        let best = self.optimizer.optimize(&objective, &x0, false);
        gp.set_kernel_params_with_noise(&best);
        gp.recompute(false, true)
    }
}

/// Maximizes `log p(y|X, theta_m)` over the mean's hyperparameters only.
/// Only the residual vector depends on `theta_m`, so the Cholesky factor
/// `L` is never rebuilt.
#[derive(Clone, Debug)]
pub struct MeanLf<Opt: InnerOptimizer = Rprop> {
    pub optimizer: Opt,
}

impl Default for MeanLf<Rprop> {
    fn default() -> Self {
        MeanLf { optimizer: Rprop::default() }
    }
}

impl<Opt: InnerOptimizer> MeanLf<Opt> {
    pub fn new(optimizer: Opt) -> Self {
        MeanLf { optimizer }
    }
}

impl<K, M, Opt> HpFitter<K, M> for MeanLf<Opt>
where
    K: Kernel + Sync,
    M: Mean + Sync,
    Opt: InnerOptimizer,
{
    fn fit(&self, gp: &mut GaussianProcess<K, M>) -> BoResult<()> {
        let x0 = gp.mean_params();
        if x0.is_empty() {
            return Ok(());
        }
        let base = gp.clone();
        let objective = move |p: &[f64]| -> (f64, Vec<f64>) {
            let mut probe = base.clone();
            probe.set_mean_params(p);
            let _ = probe.recompute(false, false);
            (probe.log_marginal_likelihood(), probe.gradient_log_marginal_likelihood_mean())
        };
        let best = self.optimizer.optimize(&objective, &x0, false);
        gp.set_mean_params(&best);
        gp.recompute(false, false)
    }
}

/// Joint maximization over `(theta_k, theta_m)`, kernel parameters first
/// in the concatenated vector.
#[derive(Clone, Debug)]
pub struct KernelMeanLf<Opt: InnerOptimizer = Rprop> {
    pub optimizer: Opt,
}

impl Default for KernelMeanLf<Rprop> {
    fn default() -> Self {
        KernelMeanLf { optimizer: Rprop::default() }
    }
}

impl<Opt: InnerOptimizer> KernelMeanLf<Opt> {
    pub fn new(optimizer: Opt) -> Self {
        KernelMeanLf { optimizer }
    }
}

impl<K, M, Opt> HpFitter<K, M> for KernelMeanLf<Opt>
where
    K: Kernel + Sync,
    M: Mean + Sync,
    Opt: InnerOptimizer,
{
    fn fit(&self, gp: &mut GaussianProcess<K, M>) -> BoResult<()> {
        let mut x0 = gp.kernel_params_with_noise();
        let n_kernel = x0.len();
        x0.extend(gp.mean_params());
        if x0.is_empty() {
            return Ok(());
        }
        let base = gp.clone();
        let objective = move |p: &[f64]| -> (f64, Vec<f64>) {
            let mut probe = base.clone();
            probe.set_kernel_params_with_noise(&p[..n_kernel]);
            probe.set_mean_params(&p[n_kernel..]);
            let _ = probe.recompute(true, true);
            let mut grad = probe.gradient_log_marginal_likelihood_kernel();
            grad.extend(probe.gradient_log_marginal_likelihood_mean());
            (probe.log_marginal_likelihood(), grad)
        };
        let best = self.optimizer.optimize(&objective, &x0, false);
        gp.set_kernel_params_with_noise(&best[..n_kernel]);
        gp.set_mean_params(&best[n_kernel..]);
        gp.recompute(true, true)
    }
}

/// Maximizes the LOO-CV log predictive density over the kernel's
/// hyperparameters. No analytic gradient of that quantity is available,
/// so this fitter estimates it by central finite differences in
/// log-space, acceptable since hyperparameter fitting runs only every
/// `hp_period` iterations, not per acquisition evaluation.
#[derive(Clone, Debug)]
pub struct KernelLoo<Opt: InnerOptimizer = Rprop> {
    pub optimizer: Opt,
    pub finite_difference_step: f64,
}

impl Default for KernelLoo<Rprop> {
    fn default() -> Self {
        KernelLoo { optimizer: Rprop::default(), finite_difference_step: 1e-5 }
    }
}

impl<Opt: InnerOptimizer> KernelLoo<Opt> {
    pub fn new(optimizer: Opt) -> Self {
        KernelLoo { optimizer, ..Default::default() }
    }
}

impl<K, M, Opt> HpFitter<K, M> for KernelLoo<Opt>
where
    K: Kernel + Sync,
    M: Mean + Sync,
    Opt: InnerOptimizer,
{
    fn fit(&self, gp: &mut GaussianProcess<K, M>) -> BoResult<()> {
        let x0 = gp.kernel_params_with_noise();
        if x0.is_empty() {
            return Ok(());
        }
        let base = gp.clone();
        let step = self.finite_difference_step;
        let loo_at = {
            let base = base.clone();
            move |p: &[f64]| -> f64 {
                let mut probe = base.clone();
                probe.set_kernel_params_with_noise(p);
                let _ = probe.recompute(false, true);
                probe.loo_cv_log_predictive()
            }
        };
        let objective = move |p: &[f64]| -> (f64, Vec<f64>) {
            let value = loo_at(p);
            let mut grad = vec![0.0; p.len()];
            for i in 0..p.len() {
                let mut plus = p.to_vec();
                plus[i] += step;
                let mut minus = p.to_vec();
                minus[i] -= step;
                grad[i] = (loo_at(&plus) - loo_at(&minus)) / (2.0 * step);
            }
            (value, grad)
        };
        let best = self.optimizer.optimize(&objective, &x0, false);
        gp.set_kernel_params_with_noise(&best);
        gp.recompute(false, true)
    }
}

/// Applies a per-output fitter to every scalar GP of a [`MultiOutputGp`] in
/// parallel.
#[derive(Clone, Debug)]
pub struct ParallelLf<F> {
    pub inner: F,
}

impl<F> ParallelLf<F> {
    pub fn new(inner: F) -> Self {
        ParallelLf { inner }
    }

    pub fn fit_multi<K, M>(&self, model: &mut MultiOutputGp<K, M>) -> BoResult<()>
    where
        K: Kernel + Send + Sync,
        M: Mean + Send + Sync,
        F: HpFitter<K, M> + Sync,
    {
        model.gps_mut().par_iter_mut().try_for_each(|gp| self.inner.fit(gp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Matern52Kernel;
    use crate::mean::NullMean;

    fn noisy_sine_gp() -> GaussianProcess<Matern52Kernel, NullMean> {
        let mut gp = GaussianProcess::new(1, crate::gp::GaussianProcessConfig { noise: 0.05, ..Default::default() });
        let xs: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64 / 9.0]).collect();
        let ys: Vec<f64> = xs.iter().map(|x| (x[0] * std::f64::consts::TAU).sin()).collect();
        gp.compute(&xs, &ys).unwrap();
        gp
    }

    #[test]
    fn kernel_lf_improves_or_maintains_log_likelihood() {
        let mut gp = noisy_sine_gp();
        let before = gp.log_marginal_likelihood();
        KernelLf::default().fit(&mut gp).unwrap();
        assert!(gp.log_marginal_likelihood() >= before - 1e-6);
        assert!(gp.log_marginal_likelihood().is_finite());
    }

    #[test]
    fn no_opt_is_a_misuse_error() {
        let mut gp = noisy_sine_gp();
        let err = NoOpt.fit(&mut gp).unwrap_err();
        assert!(matches!(err, BoError::Misuse(_)));
    }
}
