//! The outer Bayesian-optimization loop: initialize, fit the surrogate,
//! maximize the acquisition function, evaluate the objective, update the
//! surrogate, periodically refit hyperparameters, stop-check.

pub mod observers;

use crate::acquisition::{to_inner_objective, Acquisition, AggregatorFn};
use crate::config::BoConfig;
use crate::errors::{check_finite, BoResult};
use crate::gp::Model;
use crate::numeric::uniform_point;
use crate::optimizer::InnerOptimizer;
use crate::stop::{StopContext, StopCriterion};

/// The user-supplied black-box objective `f: [0,1]^d -> R^m`.
pub trait Objective: Sync {
    fn dim_in(&self) -> usize;
    fn dim_out(&self) -> usize;
    fn evaluate(&self, x: &[f64]) -> Vec<f64>;
}

/// A statistics hook invoked once per iteration. Runs synchronously after
/// the new sample is appended to the dataset but before the surrogate
/// ingests it: observers see the fresh point but a model that hasn't
/// updated yet.
pub trait Observer<S: Model> {
    fn observe(&mut self, bo: &BoOrchestrator<S>, aggregator: AggregatorFn);
}

/// Builds the acquisition instance bound to the current model and
/// iteration index. A `for<'a>` higher-ranked closure so the returned
/// acquisition can borrow the model by reference without tying the
/// factory itself to one lifetime.
pub type AcquisitionFactory<S> = Box<dyn for<'a> Fn(&'a S, usize) -> Box<dyn Acquisition + 'a>>;

pub struct BoOrchestrator<S: Model> {
    config: BoConfig,
    model: S,
    samples: Vec<Vec<f64>>,
    observations: Vec<Vec<f64>>,
    current_iteration: usize,
    total_iterations: usize,
    res_dir: Option<std::path::PathBuf>,
    init: Box<dyn crate::init::InitStrategy>,
    stop: Box<dyn StopCriterion>,
    acqui_inner_optimizer: Box<dyn InnerOptimizer>,
    make_acquisition: AcquisitionFactory<S>,
    hp_fit: Option<Box<dyn FnMut(&mut S) -> BoResult<()>>>,
    observers: Vec<Box<dyn Observer<S>>>,
}

impl<S: Model> BoOrchestrator<S> {
    pub fn new(
        model: S,
        config: BoConfig,
        init: Box<dyn crate::init::InitStrategy>,
        stop: Box<dyn StopCriterion>,
        acqui_inner_optimizer: Box<dyn InnerOptimizer>,
        make_acquisition: AcquisitionFactory<S>,
    ) -> Self {
        BoOrchestrator {
            config,
            model,
            samples: Vec::new(),
            observations: Vec::new(),
            current_iteration: 0,
            total_iterations: 0,
            res_dir: None,
            init,
            stop,
            acqui_inner_optimizer,
            make_acquisition,
            hp_fit: None,
            observers: Vec::new(),
        }
    }

    pub fn with_hp_fitter(mut self, hp_fit: impl FnMut(&mut S) -> BoResult<()> + 'static) -> Self {
        self.hp_fit = Some(Box::new(hp_fit));
        self
    }

    pub fn with_observer(mut self, observer: impl Observer<S> + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn with_result_dir(mut self, dir: std::path::PathBuf) -> Self {
        self.res_dir = Some(dir);
        self
    }

    // --- Observer contract ---

    pub fn stats_enabled(&self) -> bool {
        self.config.stats_enabled
    }

    pub fn res_dir(&self) -> Option<&std::path::Path> {
        self.res_dir.as_deref()
    }

    pub fn current_iteration(&self) -> usize {
        self.current_iteration
    }

    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    pub fn samples(&self) -> &[Vec<f64>] {
        &self.samples
    }

    pub fn observations(&self) -> &[Vec<f64>] {
        &self.observations
    }

    pub fn model(&self) -> &S {
        &self.model
    }

    pub fn best_observation(&self, aggregator: AggregatorFn) -> Option<f64> {
        self.observations.iter().map(|o| aggregator(o)).fold(None, |acc, v| match acc {
            Some(a) if a >= v => Some(a),
            _ => Some(v),
        })
    }

    pub fn best_sample(&self, aggregator: AggregatorFn) -> Option<&[f64]> {
        self.observations
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| aggregator(a).partial_cmp(&aggregator(b)).unwrap())
            .map(|(i, _)| self.samples[i].as_slice())
    }

    /// Constrained variant of [`Self::best_observation`], a sketch, not a
    /// full constrained optimizer: no feasibility model is fit here, the
    /// caller supplies one constraint vector per sample. A sample is
    /// feasible when every entry of its constraint vector is positive;
    /// falls back to the unconstrained best when none are feasible, and
    /// never mutates `self.observations` while doing so, since the cached
    /// observation vectors must not be overwritten on a partially-feasible
    /// dataset.
    pub fn best_observation_constrained(&self, aggregator: AggregatorFn, constraints: &[Vec<f64>]) -> Option<f64> {
        self.feasible_indices(constraints)
            .map(|feasible| self.best_observation_among(aggregator, &feasible))
            .unwrap_or_else(|| self.best_observation(aggregator))
    }

    /// Constrained variant of [`Self::best_sample`]; see
    /// [`Self::best_observation_constrained`] for the feasibility rule.
    pub fn best_sample_constrained(&self, aggregator: AggregatorFn, constraints: &[Vec<f64>]) -> Option<&[f64]> {
        match self.feasible_indices(constraints) {
            Some(feasible) => feasible
                .iter()
                .max_by(|&&a, &&b| aggregator(&self.observations[a]).partial_cmp(&aggregator(&self.observations[b])).unwrap())
                .map(|&i| self.samples[i].as_slice()),
            None => self.best_sample(aggregator),
        }
    }

    /// Indices of every sample whose constraint vector has all-positive
    /// entries, or `None` if no sample is feasible.
    fn feasible_indices(&self, constraints: &[Vec<f64>]) -> Option<Vec<usize>> {
        let feasible: Vec<usize> =
            (0..self.observations.len()).filter(|&i| constraints[i].iter().all(|&c| c > 0.0)).collect();
        if feasible.is_empty() {
            None
        } else {
            Some(feasible)
        }
    }

    fn best_observation_among(&self, aggregator: AggregatorFn, indices: &[usize]) -> f64 {
        indices.iter().map(|&i| aggregator(&self.observations[i])).fold(f64::NEG_INFINITY, f64::max)
    }

    fn add_new_sample(&mut self, x: Vec<f64>, y: Vec<f64>) -> BoResult<()> {
        check_finite(&y)?;
        self.samples.push(x);
        self.observations.push(y);
        Ok(())
    }

    /// Runs the outer loop. `reset` clears the dataset and iteration
    /// counters before starting, matching a fresh `optimize` call on a
    /// previously-used orchestrator.
    pub fn optimize(&mut self, objective: &dyn Objective, aggregator: AggregatorFn, reset: bool) -> BoResult<()> {
        if reset {
            self.samples.clear();
            self.observations.clear();
            self.total_iterations = 0;
        }
        self.current_iteration = 0;

        if self.total_iterations == 0 {
            let dim = objective.dim_in();
            for x in self.init.generate(dim) {
                let y = objective.evaluate(&x);
                self.add_new_sample(x, y)?;
            }
        }

        if !self.samples.is_empty() {
            self.model.compute(&self.samples, &self.observations)?;
        }

        loop {
            let model = &self.model;
            let samples_empty = self.samples.is_empty();
            let optimizer = self.acqui_inner_optimizer.as_ref();
            let predicted_best = || -> Option<f64> {
                if samples_empty {
                    None
                } else {
                    Some(maximize_model_mean(model, aggregator, optimizer))
                }
            };
            let ctx = StopContext {
                current_iteration: self.current_iteration,
                total_iterations: self.total_iterations,
                best_observation: self.best_observation(aggregator).unwrap_or(f64::NEG_INFINITY),
                predicted_best: &predicted_best,
            };
            if self.stop.should_stop(&ctx)? {
                break;
            }

            let acquisition = (self.make_acquisition)(&self.model, self.current_iteration);
            let acquisition_objective = to_inner_objective(acquisition.as_ref(), aggregator);
            let x0 = uniform_point(objective.dim_in());
            let x_new = self.acqui_inner_optimizer.optimize(&acquisition_objective, &x0, self.config.bounded);
            drop(acquisition);

            let y_new = objective.evaluate(&x_new);
            self.add_new_sample(x_new.clone(), y_new.clone())?;

            let mut observers = std::mem::take(&mut self.observers);
            for observer in observers.iter_mut() {
                observer.observe(self, aggregator);
            }
            self.observers = observers;

            self.model.add_sample(&x_new, &y_new)?;

            if self.config.hp_period > 0 && (self.current_iteration as i64 + 1) % self.config.hp_period == 0 {
                if let Some(hp_fit) = self.hp_fit.as_mut() {
                    hp_fit(&mut self.model)?;
                }
            }

            self.current_iteration += 1;
            self.total_iterations += 1;
        }
        Ok(())
    }
}

/// Maximizes the GP mean over `[0,1]^d` with the same (gradient-free)
/// inner optimizer used for acquisition maximization, used by
/// `MaxPredictedValue` to compute `mu*`.
fn maximize_model_mean<S: Model>(model: &S, aggregator: AggregatorFn, optimizer: &dyn InnerOptimizer) -> f64 {
    let dim = model.dim_in();
    let objective = |x: &[f64]| -> (f64, Vec<f64>) {
        match model.query(x) {
            Ok((mu, _)) => (aggregator(&mu), vec![0.0; dim]),
            Err(_) => (f64::NEG_INFINITY, vec![0.0; dim]),
        }
    };
    let x0 = uniform_point(dim);
    let x_star = optimizer.optimize(&objective, &x0, true);
    match model.query(&x_star) {
        Ok((mu, _)) => aggregator(&mu),
        Err(_) => f64::NEG_INFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::{first_elem, Ucb};
    use crate::config::BoConfig;
    use crate::gp::{GaussianProcess, GaussianProcessConfig};
    use crate::init::Lhs;
    use crate::kernel::Matern52Kernel;
    use crate::mean::NullMean;
    use crate::optimizer::{ParallelRepeater, Rprop};
    use crate::stop::MaxIterations;

    struct Sine;
    impl Objective for Sine {
        fn dim_in(&self) -> usize {
            1
        }
        fn dim_out(&self) -> usize {
            1
        }
        fn evaluate(&self, x: &[f64]) -> Vec<f64> {
            vec![(x[0] * std::f64::consts::TAU / 2.0).sin()]
        }
    }

    #[test]
    fn finds_a_near_optimal_point_on_a_1d_sine() {
        let model: GaussianProcess<Matern52Kernel, NullMean> =
            GaussianProcess::new(1, GaussianProcessConfig { noise: 1e-6, ..Default::default() });
        let mut bo = BoOrchestrator::new(
            model,
            BoConfig::default(),
            Box::new(Lhs { samples: 6 }),
            Box::new(MaxIterations(20)),
            Box::new(ParallelRepeater::new(Rprop::default(), 4, 0.05)),
            Box::new(|model, _iter| Box::new(Ucb::new(model, 1.0))),
        );
        bo.optimize(&Sine, &first_elem, true).unwrap();
        let best = bo.best_observation(&first_elem).unwrap();
        assert!(best > 0.8, "expected near-optimal best observation, got {best}");
    }

    #[test]
    fn constrained_best_falls_back_when_nothing_is_feasible() {
        let model: GaussianProcess<Matern52Kernel, NullMean> = GaussianProcess::new(1, GaussianProcessConfig::default());
        let mut bo = BoOrchestrator::new(
            model,
            BoConfig::default(),
            Box::new(crate::init::NoInit),
            Box::new(MaxIterations(0)),
            Box::new(Rprop::default()),
            Box::new(|model, _iter| Box::new(Ucb::new(model, 1.0))),
        );
        bo.optimize(&Sine, &first_elem, true).unwrap();
        bo.add_new_sample(vec![0.1], vec![0.2]).unwrap();
        bo.add_new_sample(vec![0.4], vec![0.9]).unwrap();
        let constraints = vec![vec![-1.0], vec![-1.0]];
        assert_eq!(bo.best_observation_constrained(&first_elem, &constraints), bo.best_observation(&first_elem));
    }

    #[test]
    fn constrained_best_restricts_to_feasible_samples() {
        let model: GaussianProcess<Matern52Kernel, NullMean> = GaussianProcess::new(1, GaussianProcessConfig::default());
        let mut bo = BoOrchestrator::new(
            model,
            BoConfig::default(),
            Box::new(crate::init::NoInit),
            Box::new(MaxIterations(0)),
            Box::new(Rprop::default()),
            Box::new(|model, _iter| Box::new(Ucb::new(model, 1.0))),
        );
        bo.optimize(&Sine, &first_elem, true).unwrap();
        bo.add_new_sample(vec![0.1], vec![0.2]).unwrap();
        bo.add_new_sample(vec![0.4], vec![0.9]).unwrap();
        let constraints = vec![vec![1.0], vec![-1.0]];
        assert_eq!(bo.best_observation_constrained(&first_elem, &constraints), Some(0.2));
    }

    #[test]
    fn rejects_non_finite_observation_and_leaves_dataset_consistent() {
        struct NanObjective;
        impl Objective for NanObjective {
            fn dim_in(&self) -> usize {
                1
            }
            fn dim_out(&self) -> usize {
                1
            }
            fn evaluate(&self, _x: &[f64]) -> Vec<f64> {
                vec![f64::NAN]
            }
        }
        let model: GaussianProcess<Matern52Kernel, NullMean> = GaussianProcess::new(1, GaussianProcessConfig::default());
        let mut bo = BoOrchestrator::new(
            model,
            BoConfig::default(),
            Box::new(Lhs { samples: 3 }),
            Box::new(MaxIterations(5)),
            Box::new(Rprop::default()),
            Box::new(|model, _iter| Box::new(Ucb::new(model, 1.0))),
        );
        let err = bo.optimize(&NanObjective, &first_elem, true).unwrap_err();
        assert!(matches!(err, crate::errors::BoError::Evaluation(_)));
        assert!(bo.observations().is_empty());
    }
}
