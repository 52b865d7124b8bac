//! Squared-exponential kernel with automatic relevance determination
//! (per-dimension length scales) and an optional low-rank correction.

use super::Kernel;
use nalgebra::{DMatrix, DVector};

/// `k(x,y) = sigma² exp(-1/2 (x-y)^T M (x-y))`, `M = Lambda Lambda^T + diag(l_i^-2)`.
///
/// Parameters: `(log l_1 .. log l_d, vec(Lambda) [row-major, d x rank], log sqrt(sigma²))`.
/// `Lambda`'s entries are learned directly (not in log-space): they may be negative.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SquaredExpArdKernel {
    log_length: Vec<f64>,
    /// `d x rank`, row-major; `rank == 0` disables the low-rank correction.
    lambda: Vec<f64>,
    rank: usize,
    log_sigma: f64,
}

impl SquaredExpArdKernel {
    pub fn new(dim: usize, rank: usize, length: f64, signal_variance: f64) -> Self {
        SquaredExpArdKernel {
            log_length: vec![length.ln(); dim],
            lambda: vec![0.0; dim * rank],
            rank,
            log_sigma: 0.5 * signal_variance.ln(),
        }
    }

    fn dim(&self) -> usize {
        self.log_length.len()
    }

    fn sigma_sq(&self) -> f64 {
        (2.0 * self.log_sigma).exp()
    }

    /// Only valid to call when `rank > 0`.
    fn lambda_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.dim(), self.rank, &self.lambda)
    }

    fn quadratic_form(&self, u: &DVector<f64>) -> (f64, DVector<f64>) {
        // q = ||Lambda^T u||^2 + sum_i u_i^2 / l_i^2 ; also returns w = Lambda^T u for the gradient.
        let diag_term: f64 =
            u.iter().zip(self.log_length.iter()).map(|(ui, &ll)| (ui * ui) / (2.0 * ll).exp()).sum();
        if self.rank == 0 {
            return (diag_term, DVector::zeros(0));
        }
        let lambda = self.lambda_matrix();
        let w = lambda.transpose() * u;
        let low_rank_term: f64 = w.iter().map(|wi| wi * wi).sum();
        (diag_term + low_rank_term, w)
    }
}

impl Kernel for SquaredExpArdKernel {
    fn default_for_dim(dim: usize) -> Self {
        // matches kernel_sq_exp_ard.{sigma_sq,k} (1, 0) in the configuration surface
        SquaredExpArdKernel::new(dim, 0, 1.0, 1.0)
    }

    fn n_params(&self) -> usize {
        self.dim() + self.dim() * self.rank + 1
    }

    fn params(&self) -> Vec<f64> {
        let mut p = self.log_length.clone();
        p.extend_from_slice(&self.lambda);
        p.push(self.log_sigma);
        p
    }

    fn set_params(&mut self, params: &[f64]) {
        let d = self.dim();
        self.log_length.copy_from_slice(&params[..d]);
        self.lambda.copy_from_slice(&params[d..d + d * self.rank]);
        self.log_sigma = params[d + d * self.rank];
    }

    fn k(&self, x: &[f64], y: &[f64]) -> f64 {
        let u = DVector::from_fn(x.len(), |i, _| x[i] - y[i]);
        let (q, _) = self.quadratic_form(&u);
        self.sigma_sq() * (-0.5 * q).exp()
    }

    fn gradient(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let d = self.dim();
        let u = DVector::from_fn(d, |i, _| x[i] - y[i]);
        let (_, w) = self.quadratic_form(&u);
        let k_val = self.k(x, y);

        let mut grad = Vec::with_capacity(self.n_params());
        // d k / d(log l_i) = k * u_i^2 / l_i^2
        for (i, &ll) in self.log_length.iter().enumerate() {
            grad.push(k_val * (u[i] * u[i]) / (2.0 * ll).exp());
        }
        // d k / d Lambda_{i,j} = -k * w_j * u_i
        for i in 0..d {
            for j in 0..self.rank {
                grad.push(-k_val * w[j] * u[i]);
            }
        }
        // d k / d(log sigma) = 2 k
        grad.push(2.0 * k_val);
        grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_is_signal_variance() {
        let k = SquaredExpArdKernel::new(3, 0, 1.0, 2.0);
        let x = vec![0.1, 0.2, 0.3];
        assert!((k.k(&x, &x) - 2.0).abs() < 1e-10);
    }

    #[test]
    fn gradient_matches_finite_difference_no_low_rank() {
        let k = SquaredExpArdKernel::new(2, 0, 0.8, 1.3);
        let x = vec![0.1, 0.6];
        let y = vec![0.4, 0.2];
        let analytic = k.gradient(&x, &y);
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
            let fd = (k_plus.k(&x, &y) - k_minus.k(&x, &y)) / (2.0 * eps);
            assert!((fd - g).abs() < 1e-4, "param {i}: analytic {g}, fd {fd}");
        }
    }

    #[test]
    fn gradient_matches_finite_difference_with_low_rank() {
        let mut k = SquaredExpArdKernel::new(2, 1, 0.8, 1.3);
        k.lambda = vec![0.3, -0.2];
        let x = vec![0.1, 0.6];
        let y = vec![0.4, 0.2];
        let analytic = k.gradient(&x, &y);
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
            let fd = (k_plus.k(&x, &y) - k_minus.k(&x, &y)) / (2.0 * eps);
            assert!((fd - g).abs() < 1e-4, "param {i}: analytic {g}, fd {fd}");
        }
    }
}
