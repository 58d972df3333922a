//! Seed-driven selection of manifest samples.

use crate::catalog::{Clip, SourceCatalog, SourceRole};
use crate::error::{Error, Result};
use crate::manifest::{DatasetManifest, ManifestSummary, Sample};
use crate::selection::allocation::allocate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::info;

/// Validated selection parameters, passed by value into [`select`].
///
/// The core never reads ambient process state; CLI and environment
/// resolution happen at the argument layer.
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Wake-phrase label recorded in the manifest.
    pub wake_phrase: String,
    /// Cap on selected positive samples.
    pub max_positives: usize,
    /// Cap on selected negative samples; `None` means no artificial cap.
    pub max_negatives: Option<usize>,
    /// Minimum samples every source must contribute.
    pub min_per_source: usize,
    /// Seed driving the per-source shuffles.
    pub seed: u64,
}

impl SelectionConfig {
    /// Validate the configuration before selection.
    pub fn validate(&self) -> Result<()> {
        if self.wake_phrase.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "wake phrase must not be empty".to_string(),
            });
        }
        if self.max_positives == 0 {
            return Err(Error::ConfigValidation {
                message: "max_positives must be at least 1".to_string(),
            });
        }
        if self.max_negatives == Some(0) {
            return Err(Error::ConfigValidation {
                message: "max_negatives must be at least 1 when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Deterministically choose the training subset from scanned catalogs.
///
/// See the module docs for the algorithm. Fails fast on contradictory
/// quotas, floor violations, and empty classes; never writes anything.
pub fn select(catalogs: &[SourceCatalog], config: &SelectionConfig) -> Result<DatasetManifest> {
    config.validate()?;

    let positives = select_role(catalogs, SourceRole::Positive, Some(config.max_positives), config)?;
    let negatives = select_role(catalogs, SourceRole::Negative, config.max_negatives, config)?;

    if positives.is_empty() || negatives.is_empty() {
        return Err(Error::EmptyClass {
            positives: positives.len(),
            negatives: negatives.len(),
        });
    }

    let mut per_source: BTreeMap<String, usize> = BTreeMap::new();
    for sample in positives.iter().chain(&negatives) {
        *per_source.entry(sample.source.clone()).or_insert(0) += 1;
    }

    let summary = ManifestSummary {
        selected_positives: positives.len(),
        selected_negatives: negatives.len(),
        per_source,
    };

    info!(
        "Selected {} positive(s) and {} negative(s) for '{}' (seed {})",
        summary.selected_positives, summary.selected_negatives, config.wake_phrase, config.seed
    );

    let mut samples = positives;
    samples.extend(negatives);

    Ok(DatasetManifest {
        wake_phrase: config.wake_phrase.clone(),
        seed: config.seed,
        samples,
        summary,
    })
}

/// Select one role's samples across its sources.
///
/// Sources are visited in name-sorted order and each source's selection is
/// emitted in path-sorted order, so the manifest serializes identically no
/// matter what order selection ran in.
fn select_role(
    catalogs: &[SourceCatalog],
    role: SourceRole,
    cap: Option<usize>,
    config: &SelectionConfig,
) -> Result<Vec<Sample>> {
    let mut role_catalogs: Vec<&SourceCatalog> = catalogs
        .iter()
        .filter(|c| c.source.role == role)
        .collect();
    role_catalogs.sort_by(|a, b| a.source.name.cmp(&b.source.name));

    let available: BTreeMap<String, usize> = role_catalogs
        .iter()
        .map(|c| (c.source.name.clone(), c.clips.len()))
        .collect();

    let allocations = allocate(&available, config.min_per_source, cap, role)?;

    let mut samples = Vec::new();
    for catalog in &role_catalogs {
        let quota = allocations[&catalog.source.name];
        let picked = pick_clips(&catalog.clips, quota, config.seed, &catalog.source.name);
        samples.extend(picked.into_iter().map(|clip| Sample {
            clip_id: clip.id.clone(),
            path: clip.path.clone(),
            role,
            source: catalog.source.name.clone(),
            duration_seconds: clip.duration_seconds,
        }));
    }

    Ok(samples)
}

/// Pick `quota` clips from a source with a seeded Fisher-Yates shuffle,
/// then restore path order for serialization.
fn pick_clips<'a>(clips: &'a [Clip], quota: usize, seed: u64, source_name: &str) -> Vec<&'a Clip> {
    let mut indices: Vec<usize> = (0..clips.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed ^ source_salt(source_name));
    indices.shuffle(&mut rng);
    indices.truncate(quota);
    indices.sort_unstable();
    indices.into_iter().map(|i| &clips[i]).collect()
}

/// Per-source salt so equal seeds still diverge across sources.
fn source_salt(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
