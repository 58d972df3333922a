//! Hard-negative mining into an append-only pool.
//!
//! Clips that produced false accepts are the most informative negative
//! material for the next training round. The miner promotes them into a
//! persistent pool shared across runs and across wake-phrase models,
//! without ever duplicating a clip or reusing a filename.

use crate::constants::{
    HARD_NEGATIVE_INDEX_WIDTH, HARD_NEGATIVE_PREFIX, STALE_LOCK_MAX_AGE_SECS,
};
use crate::error::{Error, Result};
use crate::eval::EvaluationReport;
use crate::locking::PoolLock;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A clip flagged by evaluation as a false-accept offender.
#[derive(Debug, Clone)]
pub struct HardNegativeCandidate {
    /// Stable id of the offending clip.
    pub clip_id: String,
    /// Path to the offending clip.
    pub path: PathBuf,
    /// Highest false-accept score the clip produced.
    pub score: f32,
}

/// Collapse a report's false-accept events into per-clip candidates.
///
/// One candidate per clip, carrying its peak event score, sorted worst
/// offenders first (ties broken by clip id).
pub fn candidates_from_report(report: &EvaluationReport) -> Vec<HardNegativeCandidate> {
    let mut by_clip: HashMap<&str, HardNegativeCandidate> = HashMap::new();
    for event in &report.false_accept_events {
        by_clip
            .entry(event.clip_id.as_str())
            .and_modify(|candidate| candidate.score = candidate.score.max(event.score))
            .or_insert_with(|| HardNegativeCandidate {
                clip_id: event.clip_id.clone(),
                path: event.clip_path.clone(),
                score: event.score,
            });
    }

    let mut candidates: Vec<HardNegativeCandidate> = by_clip.into_values().collect();
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.clip_id.cmp(&b.clip_id))
    });
    candidates
}

/// Promote up to `max_mined` candidates into the destination pool.
///
/// Returns the count actually added; deduplication and pool exhaustion
/// make fewer than `max_mined` a normal outcome, not an error. Pool I/O
/// failures are fatal for the mining step only.
pub fn mine(report: &EvaluationReport, pool_dir: &Path, max_mined: usize) -> Result<usize> {
    let candidates = candidates_from_report(report);
    if candidates.is_empty() || max_mined == 0 {
        debug!("No hard-negative candidates to mine");
        return Ok(0);
    }

    fs::create_dir_all(pool_dir).map_err(|e| Error::PoolIo {
        path: pool_dir.to_path_buf(),
        source: e,
    })?;

    if PoolLock::is_locked(pool_dir)
        && PoolLock::is_stale(pool_dir, Duration::from_secs(STALE_LOCK_MAX_AGE_SECS))
    {
        warn!(
            "Removing stale pool lock in {} (holder presumed dead)",
            pool_dir.display()
        );
        PoolLock::remove_stale(pool_dir)?;
    }
    let _lock = PoolLock::acquire(pool_dir)?;

    let (existing_ids, mut next_index) = scan_pool(pool_dir)?;

    let mut mined = 0;
    let mut seen: HashSet<String> = existing_ids;
    for candidate in candidates {
        if mined >= max_mined {
            break;
        }
        if seen.contains(&candidate.clip_id) {
            debug!(
                "Skipping already-pooled hard negative {}",
                candidate.clip_id
            );
            continue;
        }

        next_index = copy_into_pool(&candidate, pool_dir, next_index)?;
        seen.insert(candidate.clip_id);
        mined += 1;
    }

    info!(
        "Mined {mined} hard negative(s) into {}",
        pool_dir.display()
    );
    Ok(mined)
}

/// Claim the next free index and copy the candidate into the pool.
///
/// The destination is claimed with `create_new`, so an index is never
/// reused or overwritten even if another writer slipped past the lock.
/// Returns the index to try next.
fn copy_into_pool(
    candidate: &HardNegativeCandidate,
    pool_dir: &Path,
    mut index: u64,
) -> Result<u64> {
    let extension = candidate
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("wav")
        .to_ascii_lowercase();

    loop {
        let name = format!(
            "{HARD_NEGATIVE_PREFIX}_{index:0width$}_{id}.{extension}",
            width = HARD_NEGATIVE_INDEX_WIDTH,
            id = candidate.clip_id,
        );
        let destination = pool_dir.join(&name);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&destination)
        {
            Ok(mut file) => {
                let mut source = File::open(&candidate.path).map_err(|e| Error::PoolIo {
                    path: candidate.path.clone(),
                    source: e,
                })?;
                std::io::copy(&mut source, &mut file).map_err(|e| Error::PoolIo {
                    path: destination.clone(),
                    source: e,
                })?;
                debug!(
                    "Pooled hard negative {} (score {:.3}) as {name}",
                    candidate.path.display(),
                    candidate.score
                );
                return Ok(index + 1);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                index += 1;
            }
            Err(e) => {
                return Err(Error::PoolIo {
                    path: destination,
                    source: e,
                });
            }
        }
    }
}

/// Scan the pool for already-present clip ids and the next free index.
fn scan_pool(pool_dir: &Path) -> Result<(HashSet<String>, u64)> {
    let mut ids = HashSet::new();
    let mut max_index = None;

    for entry in fs::read_dir(pool_dir).map_err(|e| Error::PoolIo {
        path: pool_dir.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(|e| Error::PoolIo {
            path: pool_dir.to_path_buf(),
            source: e,
        })?;
        let name = entry.file_name();
        if let Some((index, id)) = parse_pool_filename(&name.to_string_lossy()) {
            ids.insert(id);
            max_index = Some(max_index.map_or(index, |m: u64| m.max(index)));
        }
    }

    Ok((ids, max_index.map_or(0, |m| m + 1)))
}

/// Parse `hardneg_<index>_<clip_id>.<ext>` filenames.
fn parse_pool_filename(name: &str) -> Option<(u64, String)> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    let rest = stem.strip_prefix(HARD_NEGATIVE_PREFIX)?.strip_prefix('_')?;
    let (index, id) = rest.split_once('_')?;
    let index: u64 = index.parse().ok()?;
    if id.is_empty() {
        return None;
    }
    Some((index, id.to_string()))
}
