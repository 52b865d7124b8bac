//! Concrete statistics observers: each appends one line per iteration to a
//! `.dat` file under the orchestrator's result directory, replaying the
//! pre-existing history on the very first call so a run resumed
//! mid-dataset still gets a complete log. All are no-ops when
//! `stats_enabled()` is false or `res_dir` isn't set.

use super::{BoOrchestrator, Observer};
use crate::acquisition::AggregatorFn;
use crate::gp::Model;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

fn open_log_file(res_dir: &Path, filename: &str, header: Option<&str>) -> std::io::Result<std::fs::File> {
    let path = res_dir.join(filename);
    let is_new = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if is_new {
        if let Some(header) = header {
            writeln!(file, "{header}")?;
        }
    }
    Ok(file)
}

fn backfill_marker(total_iterations: usize) -> i64 {
    if total_iterations == 0 {
        -1
    } else {
        total_iterations as i64
    }
}

fn format_row(values: &[f64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

/// Appends every new sample to `samples.dat`.
#[derive(Debug, Default)]
pub struct SamplesObserver {
    path: Option<PathBuf>,
}

impl<S: Model> Observer<S> for SamplesObserver {
    fn observe(&mut self, bo: &BoOrchestrator<S>, _aggregator: AggregatorFn) {
        if !bo.stats_enabled() || bo.samples().is_empty() {
            return;
        }
        let Some(res_dir) = bo.res_dir() else { return };
        let fresh = self.path.is_none();
        self.path = Some(res_dir.to_path_buf());
        let mut file = match open_log_file(res_dir, "samples.dat", Some("#iteration sample")) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "failed to open samples.dat");
                return;
            }
        };
        if fresh && bo.total_iterations() == 0 && bo.samples().len() > 1 {
            for x in &bo.samples()[..bo.samples().len() - 1] {
                let _ = writeln!(file, "-1 {}", format_row(x));
            }
        }
        let marker = backfill_marker(bo.total_iterations());
        let _ = writeln!(file, "{marker} {}", format_row(bo.samples().last().unwrap()));
    }
}

/// Appends every new observation to `observations.dat`.
#[derive(Debug, Default)]
pub struct ObservationsObserver {
    path: Option<PathBuf>,
}

impl<S: Model> Observer<S> for ObservationsObserver {
    fn observe(&mut self, bo: &BoOrchestrator<S>, _aggregator: AggregatorFn) {
        if !bo.stats_enabled() || bo.observations().is_empty() {
            return;
        }
        let Some(res_dir) = bo.res_dir() else { return };
        let fresh = self.path.is_none();
        self.path = Some(res_dir.to_path_buf());
        let mut file = match open_log_file(res_dir, "observations.dat", Some("#iteration observation")) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "failed to open observations.dat");
                return;
            }
        };
        if fresh && bo.total_iterations() == 0 && bo.observations().len() > 1 {
            for y in &bo.observations()[..bo.observations().len() - 1] {
                let _ = writeln!(file, "-1 {}", format_row(y));
            }
        }
        let marker = backfill_marker(bo.total_iterations());
        let _ = writeln!(file, "{marker} {}", format_row(bo.observations().last().unwrap()));
    }
}

/// Appends the running best observation (under `aggregator`) to
/// `best_observations.dat`.
#[derive(Debug, Default)]
pub struct BestObservationsObserver;

impl<S: Model> Observer<S> for BestObservationsObserver {
    fn observe(&mut self, bo: &BoOrchestrator<S>, aggregator: AggregatorFn) {
        if !bo.stats_enabled() || bo.observations().is_empty() {
            return;
        }
        let Some(res_dir) = bo.res_dir() else { return };
        let mut file = match open_log_file(res_dir, "best_observations.dat", Some("#iteration best_observation")) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "failed to open best_observations.dat");
                return;
            }
        };
        let Some(best) = bo.best_observation(aggregator) else { return };
        let _ = writeln!(file, "{} {best}", bo.total_iterations());
    }
}

/// Logs a one-line summary per iteration via `tracing` rather than writing
/// directly to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSummaryObserver;

impl<S: Model> Observer<S> for ConsoleSummaryObserver {
    fn observe(&mut self, bo: &BoOrchestrator<S>, aggregator: AggregatorFn) {
        if !bo.stats_enabled() || bo.observations().is_empty() {
            return;
        }
        let new_sample = bo.samples().last().unwrap();
        let new_value = aggregator(bo.observations().last().unwrap());
        let best = bo.best_observation(aggregator).unwrap_or(f64::NEG_INFINITY);
        tracing::info!(
            iteration = bo.total_iterations(),
            sample = ?new_sample,
            value = new_value,
            best,
            "new point evaluated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::first_elem;
    use crate::config::BoConfig;
    use crate::gp::{GaussianProcess, GaussianProcessConfig};
    use crate::init::NoInit;
    use crate::kernel::Matern52Kernel;
    use crate::mean::NullMean;
    use crate::optimizer::Rprop;
    use crate::orchestrator::{BoOrchestrator, Objective};
    use crate::stop::MaxIterations;

    struct Constant(f64);
    impl Objective for Constant {
        fn dim_in(&self) -> usize {
            1
        }
        fn dim_out(&self) -> usize {
            1
        }
        fn evaluate(&self, _x: &[f64]) -> Vec<f64> {
            vec![self.0]
        }
    }

    #[test]
    fn samples_and_observations_are_logged_to_disk() {
        let dir = std::env::temp_dir().join(format!("mop-rs-observer-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let model: GaussianProcess<Matern52Kernel, NullMean> = GaussianProcess::new(1, GaussianProcessConfig::default());
        let mut bo = BoOrchestrator::new(
            model,
            BoConfig::default(),
            Box::new(NoInit),
            Box::new(MaxIterations(3)),
            Box::new(Rprop::default()),
            Box::new(|model, _iter| Box::new(crate::acquisition::Ucb::new(model, 1.0))),
        )
        .with_result_dir(dir.clone())
        .with_observer(SamplesObserver::default())
        .with_observer(ObservationsObserver::default())
        .with_observer(BestObservationsObserver)
        .with_observer(ConsoleSummaryObserver);

        bo.optimize(&Constant(1.5), &first_elem, true).unwrap();

        let samples = std::fs::read_to_string(dir.join("samples.dat")).unwrap();
        let observations = std::fs::read_to_string(dir.join("observations.dat")).unwrap();
        let best = std::fs::read_to_string(dir.join("best_observations.dat")).unwrap();
        assert!(samples.lines().count() >= 4);
        assert!(observations.lines().count() >= 4);
        assert!(best.contains("1.5"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
