//! Dense linear algebra helpers shared by the Gaussian Process models:
//! jittered Cholesky factorization, triangular solves, and the rank-1
//! extension used by incremental `add_sample`.

use nalgebra::{DMatrix, DVector};

/// Default Cholesky jitter added to every diagonal entry for numerical PSD
/// (see the Gram-matrix invariant in the data model).
pub const DEFAULT_JITTER: f64 = 1e-8;

/// Attempts a Cholesky factorization of `k`, adding successively larger
/// jitter to the diagonal on failure. Returns the lower-triangular factor
/// `L` such that `k + jitter*I ≈ L L^T`, or `None` if every retry failed
/// (a fatal numeric error, left for the caller to turn into `-inf` log-lik).
pub fn cholesky_with_retries(k: &DMatrix<f64>, base_jitter: f64, max_retries: usize) -> Option<DMatrix<f64>> {
    let n = k.nrows();
    let mut jitter = base_jitter.max(1e-12);
    for attempt in 0..=max_retries {
        let mut attempt_matrix = k.clone();
        for i in 0..n {
            attempt_matrix[(i, i)] += jitter;
        }
        if let Some(chol) = attempt_matrix.clone().cholesky() {
            return Some(chol.l());
        }
        tracing::warn!(attempt, jitter, "cholesky factorization failed, retrying with larger jitter");
        jitter *= 10.0;
    }
    None
}

/// Solves `L L^T alpha = r` given the lower-triangular Cholesky factor `L`.
pub fn cholesky_solve(l: &DMatrix<f64>, r: &DVector<f64>) -> DVector<f64> {
    let z = l.solve_lower_triangular(r).expect("L has a nonzero diagonal by construction");
    l.transpose().solve_upper_triangular(&z).expect("L^T has a nonzero diagonal by construction")
}

/// Forward substitution `L v = b`, used to project a test-point covariance
/// vector into the whitened basis (e.g. `v = L^-1 k*` for the predictive variance).
pub fn forward_solve(l: &DMatrix<f64>, b: &DVector<f64>) -> DVector<f64> {
    l.solve_lower_triangular(b).expect("L has a nonzero diagonal by construction")
}

/// `K^-1`, computed from its Cholesky factor via two triangular solves against the identity.
pub fn inverse_from_cholesky(l: &DMatrix<f64>) -> DMatrix<f64> {
    let n = l.nrows();
    let id = DMatrix::<f64>::identity(n, n);
    let z = l.solve_lower_triangular(&id).expect("L has a nonzero diagonal by construction");
    l.transpose().solve_upper_triangular(&z).expect("L^T has a nonzero diagonal by construction")
}

/// `log det(K)` from the Cholesky factor: `2 * sum(log(L_ii))`.
pub fn log_det_from_cholesky(l: &DMatrix<f64>) -> f64 {
    2.0 * (0..l.nrows()).map(|i| l[(i, i)].ln()).sum::<f64>()
}

/// Rank-1 extension of a Cholesky factor when one new training point is
/// appended. `k_star` holds the covariance between the new point and each
/// existing point, `k_new_new` is the noisy self-covariance of the new point.
/// Returns `None` if the update would be ill-conditioned (non-positive new
/// diagonal entry); callers fall back to a full recompute in that case.
pub fn extend_cholesky(l: &DMatrix<f64>, k_star: &DVector<f64>, k_new_new: f64) -> Option<DMatrix<f64>> {
    let n = l.nrows();
    if n == 0 {
        return Some(DMatrix::from_element(1, 1, k_new_new.sqrt()));
    }
    let ell = l.solve_lower_triangular(k_star)?;
    let diag_new = k_new_new - ell.dot(&ell);
    if !(diag_new > 0.0) || !diag_new.is_finite() {
        return None;
    }
    let l_nn = diag_new.sqrt();
    let mut new_l = DMatrix::<f64>::zeros(n + 1, n + 1);
    new_l.index_mut((..n, ..n)).copy_from(l);
    new_l.index_mut((n, ..n)).copy_from(&ell.transpose());
    new_l[(n, n)] = l_nn;
    Some(new_l)
}
