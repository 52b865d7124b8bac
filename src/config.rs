//! Top-level orchestrator configuration, aggregating the knobs that aren't
//! already owned by a specific component's own struct
//! (`GaussianProcessConfig`, `Rprop`, `Ucb`, ...) into one flat record.

#[derive(Clone, Debug)]
#[cfg_attr(feature = "mop_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoConfig {
    /// Whether observer hooks (samples/observations/best-observations logging) run.
    pub stats_enabled: bool,
    /// Whether the acquisition's inner optimizer is restricted to `[0, 1]^d`.
    pub bounded: bool,
    /// Refit hyperparameters every `hp_period` iterations; `-1` disables periodic refitting.
    pub hp_period: i64,
}

impl Default for BoConfig {
    fn default() -> Self {
        BoConfig { stats_enabled: true, bounded: true, hp_period: -1 }
    }
}
