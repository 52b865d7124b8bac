//! Stopping criteria, composable into a chain where any criterion firing
//! stops the outer loop.

use crate::errors::{BoError, BoResult};

/// The orchestrator-tracked state a stopping criterion may need.
/// `predicted_best` maximizes the GP mean over the domain on demand: it
/// is a closure rather than an eager field so criteria that don't need it
/// (`MaxIterations`) never pay for the inner optimization.
pub struct StopContext<'a> {
    pub current_iteration: usize,
    pub total_iterations: usize,
    pub best_observation: f64,
    pub predicted_best: &'a dyn Fn() -> Option<f64>,
}

pub trait StopCriterion: std::fmt::Debug {
    fn should_stop(&self, ctx: &StopContext) -> BoResult<bool>;
}

/// `current_iteration >= N`.
#[derive(Clone, Copy, Debug)]
pub struct MaxIterations(pub usize);

impl StopCriterion for MaxIterations {
    fn should_stop(&self, ctx: &StopContext) -> BoResult<bool> {
        Ok(ctx.current_iteration >= self.0)
    }
}

/// Stops once `best_observation > ratio * predicted_best`, the observed
/// best is close enough to what the surrogate believes is achievable.
/// Requires at least one sample (`predicted_best` is only defined once the
/// model has been fit); calling this with none is a misuse error.
#[derive(Clone, Copy, Debug)]
pub struct MaxPredictedValue(pub f64);

impl StopCriterion for MaxPredictedValue {
    fn should_stop(&self, ctx: &StopContext) -> BoResult<bool> {
        match (ctx.predicted_best)() {
            Some(mu_star) => Ok(ctx.best_observation > self.0 * mu_star),
            None => Err(BoError::Misuse("MaxPredictedValue requires at least one sample")),
        }
    }
}

/// Fires as soon as any of its children fire.
#[derive(Debug, Default)]
pub struct ChainAny(pub Vec<Box<dyn StopCriterion>>);

impl ChainAny {
    pub fn new(criteria: Vec<Box<dyn StopCriterion>>) -> Self {
        ChainAny(criteria)
    }
}

impl StopCriterion for ChainAny {
    fn should_stop(&self, ctx: &StopContext) -> BoResult<bool> {
        for criterion in &self.0 {
            if criterion.should_stop(ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(current_iteration: usize, best_observation: f64, predicted_best: &dyn Fn() -> Option<f64>) -> StopContext {
        StopContext { current_iteration, total_iterations: current_iteration, best_observation, predicted_best }
    }

    #[test]
    fn max_iterations_fires_at_threshold() {
        let none = || None;
        let c = MaxIterations(10);
        assert!(!c.should_stop(&ctx(9, 0.0, &none)).unwrap());
        assert!(c.should_stop(&ctx(10, 0.0, &none)).unwrap());
    }

    #[test]
    fn max_predicted_value_errors_without_samples() {
        let none = || None;
        let c = MaxPredictedValue(0.9);
        assert!(matches!(c.should_stop(&ctx(0, 0.0, &none)), Err(BoError::Misuse(_))));
    }

    #[test]
    fn chain_any_stops_when_one_child_fires() {
        let none = || None;
        let chain = ChainAny::new(vec![Box::new(MaxIterations(100)), Box::new(MaxIterations(5))]);
        assert!(chain.should_stop(&ctx(5, 0.0, &none)).unwrap());
    }
}
