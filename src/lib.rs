//! Bayesian optimization of expensive, noisy black-box objectives over
//! `[0, 1]^d`.
//!
//! A [`GaussianProcess`](gp::GaussianProcess) (or [`MultiOutputGp`](gp::multi::MultiOutputGp),
//! or a density-pruned [`SparsifiedGp`](gp::sparse::SparsifiedGp)) surrogate
//! is driven by a [`BoOrchestrator`](orchestrator::BoOrchestrator): an
//! [`InitStrategy`](init::InitStrategy) seeds the dataset, an
//! [`Acquisition`](acquisition::Acquisition) is maximized every iteration by
//! an [`InnerOptimizer`](optimizer::InnerOptimizer) to choose the next
//! query, and a [`StopCriterion`](stop::StopCriterion) decides when to halt.
//! Hyperparameters are refit periodically by an
//! [`HpFitter`](fit::HpFitter).

mod algebra;
pub mod numeric;

pub mod errors;
pub mod kernel;
pub mod mean;
pub mod gp;
pub mod optimizer;
pub mod acquisition;
pub mod init;
pub mod stop;
pub mod fit;
pub mod config;
pub mod result_dir;
pub mod orchestrator;

#[cfg(feature = "mop_serde")]
pub mod persistence;

pub use config::BoConfig;
pub use errors::{BoError, BoResult};
pub use gp::{GaussianProcess, GaussianProcessConfig, Model};
pub use orchestrator::{BoOrchestrator, Objective, Observer};