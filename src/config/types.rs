//! Configuration type definitions.

use crate::constants::{
    DEFAULT_CLIP_TIMEOUT_SECS, DEFAULT_COOLDOWN_SECONDS, DEFAULT_EVAL_CONCURRENCY,
    DEFAULT_MAX_CLIPS, DEFAULT_MAX_MINED, DEFAULT_MIN_PER_SOURCE, DEFAULT_SEED,
    DEFAULT_TARGET_FAR_PER_HOUR, DEFAULT_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default selection settings.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Default evaluation settings.
    #[serde(default)]
    pub evaluation: EvaluationDefaults,
}

/// Default selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Minimum samples every source must contribute.
    pub min_per_source: usize,

    /// Selection seed used when none is given on the command line.
    pub seed: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            min_per_source: DEFAULT_MIN_PER_SOURCE,
            seed: DEFAULT_SEED,
        }
    }
}

/// Default evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationDefaults {
    /// External scorer program invoked per clip.
    pub scorer: Option<PathBuf>,

    /// Detector operating threshold.
    pub threshold: f32,

    /// Target false-alarm rate in events per hour.
    pub target_far_per_hour: f64,

    /// Cap on clips audited per class.
    pub max_clips: usize,

    /// Cap on clips mined into the hard-negative pool per run.
    pub max_mined: usize,

    /// Refractory window between counted false-accept events, seconds.
    pub cooldown_seconds: f64,

    /// Per-clip scoring timeout in seconds.
    pub clip_timeout_seconds: u64,

    /// Bounded concurrency for scoring calls.
    pub concurrency: usize,
}

impl Default for EvaluationDefaults {
    fn default() -> Self {
        Self {
            scorer: None,
            threshold: DEFAULT_THRESHOLD,
            target_far_per_hour: DEFAULT_TARGET_FAR_PER_HOUR,
            max_clips: DEFAULT_MAX_CLIPS,
            max_mined: DEFAULT_MAX_MINED,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            clip_timeout_seconds: DEFAULT_CLIP_TIMEOUT_SECS,
            concurrency: DEFAULT_EVAL_CONCURRENCY,
        }
    }
}
