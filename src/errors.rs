//! Error taxonomy
//!
//! Recoverable conditions (a non-finite objective evaluation, an external
//! solver bailing out, programmer misuse) all surface as `BoError` rather
//! than panics, so that a caller of `optimize` can decide what to do next.
//! Numeric failures internal to the GP (a collapsed Cholesky factor, a
//! non-finite log-likelihood) are not represented here: they are handled
//! locally by returning `f64::NEG_INFINITY`, per the propagation policy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoError {
    /// The objective function returned a NaN or infinite observation.
    #[error("objective evaluation produced a non-finite observation: {0:?}")]
    Evaluation(Vec<f64>),

    /// An external nonlinear-programming solver reported a non-fatal failure.
    #[error("external solver failed: {0}")]
    Solver(String),

    /// The caller used the API in a way the contract forbids
    /// (e.g. querying an uncomputed model, running `MaxPredictedValue` with no samples).
    #[error("misuse: {0}")]
    Misuse(&'static str),
}

pub type BoResult<T> = Result<T, BoError>;

/// Rejects a non-finite observation vector, per the `EvaluationError` contract.
pub fn check_finite(y: &[f64]) -> BoResult<()> {
    if y.iter().any(|v| !v.is_finite()) {
        Err(BoError::Evaluation(y.to_vec()))
    } else {
        Ok(())
    }
}
