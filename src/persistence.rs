//! Persistence of a fitted [`GaussianProcess`] as a directory of files
//! (metadata and hyperparameters as JSON, keeping large numeric state out
//! of the main config blob). Only compiled with the `mop_serde` feature.
//!
//! The Cholesky factor and `alpha` are never persisted: they are
//! `#[serde(skip)]` on [`GaussianProcess`] itself, so `load` always
//! `recompute`s them from the restored samples/observations. This trades a
//! `O(n^3)` refactorization on load for a format that never goes stale
//! relative to the kernel/mean/noise it was saved with.

use crate::errors::BoResult;
use crate::gp::multi::MultiOutputGp;
use crate::gp::GaussianProcess;
use crate::kernel::Kernel;
use crate::mean::Mean;
use serde::{de::DeserializeOwned, Serialize};
use std::io;
use std::path::Path;

const STATE_FILE: &str = "gp_state.json";
const MULTI_STATE_FILE: &str = "multi_gp_state.json";

/// Serializes kernel, mean, noise, hyperparameters, and every sample this
/// GP was fit on to `dir/gp_state.json`, creating `dir` if needed.
pub fn save<K, M>(gp: &GaussianProcess<K, M>, dir: &Path) -> io::Result<()>
where
    K: Kernel + Serialize,
    M: Mean + Serialize,
{
    std::fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(gp)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(dir.join(STATE_FILE), json)
}

/// Restores a GP from `dir/gp_state.json`. The Cholesky factor and `alpha`
/// are always stale after deserialization (they're skipped on save), so
/// this recomputes them before returning, surfacing any numeric failure
/// through the same `recompute` contract a fresh `compute` call would.
pub fn load<K, M>(dir: &Path) -> BoResult<GaussianProcess<K, M>>
where
    K: Kernel + DeserializeOwned,
    M: Mean + DeserializeOwned,
{
    let json = std::fs::read_to_string(dir.join(STATE_FILE))
        .map_err(|e| crate::errors::BoError::Solver(format!("failed to read {}: {e}", dir.display())))?;
    let mut gp: GaussianProcess<K, M> = serde_json::from_str(&json)
        .map_err(|e| crate::errors::BoError::Solver(format!("failed to parse {}: {e}", dir.display())))?;
    gp.recompute(true, true)?;
    Ok(gp)
}

/// Serializes a [`MultiOutputGp`] the same way as [`save`], to
/// `dir/multi_gp_state.json`. `dim_in`/`dim_out` round-trip as plain
/// integers (they are loop bounds, not hyperparameters).
pub fn save_multi<K, M>(model: &MultiOutputGp<K, M>, dir: &Path) -> io::Result<()>
where
    K: Kernel + Serialize,
    M: Mean + Serialize,
{
    std::fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(model)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(dir.join(MULTI_STATE_FILE), json)
}

/// Restores a [`MultiOutputGp`] from `dir/multi_gp_state.json`, recomputing
/// each underlying GP's Cholesky factor and `alpha` as [`load`] does.
pub fn load_multi<K, M>(dir: &Path) -> BoResult<MultiOutputGp<K, M>>
where
    K: Kernel + DeserializeOwned,
    M: Mean + DeserializeOwned,
{
    let json = std::fs::read_to_string(dir.join(MULTI_STATE_FILE))
        .map_err(|e| crate::errors::BoError::Solver(format!("failed to read {}: {e}", dir.display())))?;
    let mut model: MultiOutputGp<K, M> = serde_json::from_str(&json)
        .map_err(|e| crate::errors::BoError::Solver(format!("failed to parse {}: {e}", dir.display())))?;
    for gp in model.gps_mut() {
        gp.recompute(true, true)?;
    }
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gp::GaussianProcessConfig;
    use crate::kernel::Matern52Kernel;
    use crate::mean::NullMean;

    #[test]
    fn round_trips_a_fitted_gp() {
        let dir = std::env::temp_dir().join(format!("mop-rs-persistence-test-{}", std::process::id()));

        let mut gp: GaussianProcess<Matern52Kernel, NullMean> =
            GaussianProcess::new(1, GaussianProcessConfig { noise: 1e-4, ..Default::default() });
        gp.compute(&[vec![0.0], vec![0.5], vec![1.0]], &[0.0, 1.0, 0.0]).unwrap();

        save(&gp, &dir).unwrap();
        let restored: GaussianProcess<Matern52Kernel, NullMean> = load(&dir).unwrap();

        let (mu_before, var_before) = gp.predict(&[0.4]).unwrap();
        let (mu_after, var_after) = restored.predict(&[0.4]).unwrap();
        assert!((mu_before - mu_after).abs() < 1e-9);
        assert!((var_before - var_after).abs() < 1e-9);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn round_trips_a_multi_output_gp_with_integer_dims() {
        use crate::gp::Model;

        let dir = std::env::temp_dir().join(format!("mop-rs-persistence-multi-test-{}", std::process::id()));

        let mut model: MultiOutputGp<Matern52Kernel, NullMean> =
            MultiOutputGp::new(1, 2, GaussianProcessConfig { noise: 1e-4, ..Default::default() });
        model
            .compute(&[vec![0.0], vec![0.5], vec![1.0]], &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();

        save_multi(&model, &dir).unwrap();
        let restored: MultiOutputGp<Matern52Kernel, NullMean> = load_multi(&dir).unwrap();

        assert_eq!(restored.dim_in(), 1);
        assert_eq!(restored.dim_out(), 2);

        let (mu_before, _) = model.query(&[0.4]).unwrap();
        let (mu_after, _) = restored.query(&[0.4]).unwrap();
        for (a, b) in mu_before.iter().zip(mu_after.iter()) {
            assert!((a - b).abs() < 1e-9);
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
