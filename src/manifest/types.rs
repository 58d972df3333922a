//! Manifest type definitions.

use crate::catalog::SourceRole;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A clip chosen for inclusion in a manifest.
///
/// Holds a path reference, never a copy; many manifests may reference the
/// same clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Stable clip identity.
    pub clip_id: String,
    /// Path to the underlying audio file.
    pub path: PathBuf,
    /// Role the clip plays in training.
    pub role: SourceRole,
    /// Name of the source the clip came from.
    pub source: String,
    /// Clip duration in seconds.
    pub duration_seconds: f64,
}

/// Selection summary consumed by the caller to gate training start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSummary {
    /// Number of positive samples selected.
    pub selected_positives: usize,
    /// Number of negative samples selected.
    pub selected_negatives: usize,
    /// Contributed sample count per source.
    pub per_source: BTreeMap<String, usize>,
}

/// Persisted record of which clips were selected for a training run.
///
/// Deliberately timestamp-free: identical inputs and seed serialize
/// byte-identically. The run directory carries the timestamp instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Wake-phrase label this dataset trains.
    pub wake_phrase: String,
    /// Seed the selection ran with.
    pub seed: u64,
    /// Ordered samples: positives first, then negatives, each grouped by
    /// name-sorted source.
    pub samples: Vec<Sample>,
    /// Selection summary.
    pub summary: ManifestSummary,
}

impl DatasetManifest {
    /// Check the non-empty invariant required by the downstream trainer.
    ///
    /// Training on an empty class silently produces a useless or crashing
    /// model, so an invalid manifest must never reach the trainer.
    pub fn validate(&self) -> Result<()> {
        if self.summary.selected_positives == 0 || self.summary.selected_negatives == 0 {
            return Err(Error::EmptyClass {
                positives: self.summary.selected_positives,
                negatives: self.summary.selected_negatives,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(positives: usize, negatives: usize) -> DatasetManifest {
        DatasetManifest {
            wake_phrase: "hey rust".to_string(),
            seed: 1,
            samples: Vec::new(),
            summary: ManifestSummary {
                selected_positives: positives,
                selected_negatives: negatives,
                per_source: BTreeMap::new(),
            },
        }
    }

    #[test]
    fn test_validate_accepts_both_classes() {
        assert!(manifest(3, 5).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_class() {
        assert!(matches!(
            manifest(0, 5).validate(),
            Err(Error::EmptyClass { .. })
        ));
        assert!(matches!(
            manifest(3, 0).validate(),
            Err(Error::EmptyClass { .. })
        ));
    }
}
