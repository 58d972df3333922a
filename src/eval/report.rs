//! Evaluation report types and persistence.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One detector trigger on audio that does not contain the wake phrase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FalseAcceptEvent {
    /// Stable id of the offending clip.
    pub clip_id: String,
    /// Path to the offending clip.
    pub clip_path: PathBuf,
    /// Offset of the trigger within the clip, in seconds.
    pub offset_seconds: f64,
    /// Detector score at the trigger.
    pub score: f32,
}

/// Result of one closed-loop evaluation invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Model artifact that was evaluated, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
    /// Operating threshold used for hits and false accepts.
    pub threshold: f32,
    /// Target false-alarm rate in events per hour.
    pub target_far_per_hour: f64,
    /// Informational pass signal: `false_alarms_per_hour <= target`.
    ///
    /// The evaluator never blocks on this; the caller decides how to act.
    pub passed: bool,
    /// Fraction of evaluated positives the detector caught.
    pub recall: f64,
    /// False-accept events normalized by negative-audio time.
    pub false_alarms_per_hour: f64,
    /// Positive clips evaluated (timeouts included).
    pub evaluated_positive_count: usize,
    /// Negative clips evaluated (timeouts included).
    pub evaluated_negative_count: usize,
    /// Total scored negative-audio duration in seconds.
    pub negative_duration_seconds: f64,
    /// Clips whose scoring timed out.
    pub timeouts: usize,
    /// Clips whose scoring failed outright.
    pub scoring_errors: usize,
    /// Clips promoted into the hard-negative pool, once mining has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard_negatives_mined: Option<usize>,
    /// Every false-accept event, in clip order.
    pub false_accept_events: Vec<FalseAcceptEvent>,
}

/// Write a report as pretty JSON, atomically.
///
/// Serializes to a temp file next to the destination and renames it into
/// place, so an aborted round never leaves a partial report that looks
/// complete.
pub fn write_report(report: &EvaluationReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::ReportWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let file = File::create(&tmp_path).map_err(|e| Error::ReportWrite {
        path: tmp_path.clone(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| Error::ReportSerialize { source: e })?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .map_err(|e| Error::ReportWrite {
            path: tmp_path.clone(),
            source: e,
        })?;

    fs::rename(&tmp_path, path).map_err(|e| Error::ReportWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Wrote evaluation report: {}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> EvaluationReport {
        EvaluationReport {
            generated_at: Utc::now(),
            model_path: Some(PathBuf::from("/models/hey_rust.onnx")),
            threshold: 0.5,
            target_far_per_hour: 0.1,
            passed: true,
            recall: 0.95,
            false_alarms_per_hour: 0.05,
            evaluated_positive_count: 40,
            evaluated_negative_count: 60,
            negative_duration_seconds: 7200.0,
            timeouts: 1,
            scoring_errors: 0,
            hard_negatives_mined: None,
            false_accept_events: vec![FalseAcceptEvent {
                clip_id: "abcd1234abcd1234".to_string(),
                clip_path: PathBuf::from("/pool/neg/clip.wav"),
                offset_seconds: 12.8,
                score: 0.73,
            }],
        }
    }

    #[test]
    fn test_write_and_reparse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/evaluation.json");
        write_report(&report(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: EvaluationReport = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.evaluated_positive_count, 40);
        assert_eq!(parsed.false_accept_events.len(), 1);
        assert!(!dir.path().join("nested/evaluation.json.tmp").exists());
    }

    #[test]
    fn test_mined_count_omitted_until_set() {
        let mut r = report();
        r.hard_negatives_mined = None;
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("hard_negatives_mined"));

        r.hard_negatives_mined = Some(7);
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"hard_negatives_mined\":7"));
    }
}
