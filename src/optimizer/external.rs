//! Adapter for an opaque external nonlinear-programming solver (e.g. DIRECT
//! or CMA-ES): this crate ships the trait boundary and the
//! fallible-to-infallible adapter only, no concrete binding.

use super::{DifferentiableObjective, InnerOptimizer};

/// An external solver's `(f, x0, bounded) -> x*` contract. May fail with a
/// recoverable numeric error (the underlying library threw, failed to
/// converge, ...); [`ExternalSolverAdapter`] turns that into the
/// infallible `InnerOptimizer` contract by logging and falling back to the
/// starting point.
pub trait ExternalSolver: std::fmt::Debug {
    fn solve(&self, f: &dyn DifferentiableObjective, x0: &[f64], bounded: bool) -> Result<Vec<f64>, String>;
}

#[derive(Debug)]
pub struct ExternalSolverAdapter<S: ExternalSolver> {
    solver: S,
}

impl<S: ExternalSolver> ExternalSolverAdapter<S> {
    pub fn new(solver: S) -> Self {
        ExternalSolverAdapter { solver }
    }
}

impl<S: ExternalSolver> InnerOptimizer for ExternalSolverAdapter<S> {
    fn optimize(&self, f: &dyn DifferentiableObjective, x0: &[f64], bounded: bool) -> Vec<f64> {
        match self.solver.solve(f, x0, bounded) {
            Ok(x) => x,
            Err(message) => {
                tracing::warn!(error = %message, "external solver failed, falling back to the starting point");
                x0.to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AlwaysFails;
    impl ExternalSolver for AlwaysFails {
        fn solve(&self, _f: &dyn DifferentiableObjective, _x0: &[f64], _bounded: bool) -> Result<Vec<f64>, String> {
            Err("numeric blowup".to_string())
        }
    }

    #[derive(Debug)]
    struct EchoesOffset(f64);
    impl ExternalSolver for EchoesOffset {
        fn solve(&self, _f: &dyn DifferentiableObjective, x0: &[f64], _bounded: bool) -> Result<Vec<f64>, String> {
            Ok(x0.iter().map(|v| v + self.0).collect())
        }
    }

    #[test]
    fn falls_back_to_start_on_solver_error() {
        let adapter = ExternalSolverAdapter::new(AlwaysFails);
        let f = |x: &[f64]| (x[0], vec![1.0]);
        let x = adapter.optimize(&f, &[0.5], true);
        assert_eq!(x, vec![0.5]);
    }

    #[test]
    fn forwards_successful_result() {
        let adapter = ExternalSolverAdapter::new(EchoesOffset(0.1));
        let f = |x: &[f64]| (x[0], vec![1.0]);
        let x = adapter.optimize(&f, &[0.5], true);
        assert!((x[0] - 0.6).abs() < 1e-12);
    }
}
