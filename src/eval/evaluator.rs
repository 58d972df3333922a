//! Closed-loop evaluation core.

use crate::catalog::Clip;
use crate::constants::threshold;
use crate::error::{Error, Result};
use crate::eval::progress;
use crate::eval::report::{EvaluationReport, FalseAcceptEvent};
use crate::eval::runner::{DetectorRunner, ScoreTrack};
use chrono::Utc;
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Validated evaluation parameters, passed by value into [`evaluate`].
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Detector operating threshold for hits and false accepts.
    pub threshold: f32,
    /// Target false-alarm rate in events per hour (informational).
    pub target_far_per_hour: f64,
    /// Cap on clips audited per class.
    pub max_clips: usize,
    /// Refractory window between counted false-accept events, in seconds.
    pub cooldown_seconds: f64,
    /// Per-clip scoring timeout.
    pub clip_timeout: Duration,
    /// Bounded concurrency for scoring calls.
    pub concurrency: usize,
    /// Whether to render a progress bar.
    pub progress_enabled: bool,
}

impl EvalConfig {
    /// Validate the configuration before evaluation.
    pub fn validate(&self) -> Result<()> {
        if !(threshold::MIN..=threshold::MAX).contains(&self.threshold) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "threshold must be between {} and {}, got {}",
                    threshold::MIN,
                    threshold::MAX,
                    self.threshold
                ),
            });
        }
        if self.target_far_per_hour < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "target_far_per_hour must be non-negative, got {}",
                    self.target_far_per_hour
                ),
            });
        }
        if self.max_clips == 0 {
            return Err(Error::ConfigValidation {
                message: "max_clips must be at least 1".to_string(),
            });
        }
        if self.cooldown_seconds < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "cooldown_seconds must be non-negative, got {}",
                    self.cooldown_seconds
                ),
            });
        }
        if self.concurrency == 0 {
            return Err(Error::ConfigValidation {
                message: "concurrency must be at least 1".to_string(),
            });
        }
        if self.clip_timeout.is_zero() {
            return Err(Error::ConfigValidation {
                message: "clip_timeout must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of scoring one clip.
enum ScoreOutcome {
    Scored(ScoreTrack),
    TimedOut,
    Failed,
}

/// Run the detector over held-out clips and build an [`EvaluationReport`].
///
/// The evaluation is a sampled audit: up to `max_clips` per class, evenly
/// spaced across each path-sorted pool. It always completes and always
/// emits false-accept candidates; the pass flag is informational.
pub async fn evaluate<R: DetectorRunner + Sync>(
    runner: &R,
    positives: &[Clip],
    negatives: &[Clip],
    config: &EvalConfig,
) -> Result<EvaluationReport> {
    config.validate()?;

    let positives = sample_even(positives, config.max_clips);
    let negatives = sample_even(negatives, config.max_clips);
    info!(
        "Evaluating {} positive and {} negative clip(s) at threshold {:.2}",
        positives.len(),
        negatives.len(),
        config.threshold
    );

    let bar = progress::create_clip_progress(
        positives.len() + negatives.len(),
        config.progress_enabled,
    );

    let positive_outcomes = score_all(runner, &positives, config, bar.as_ref()).await?;
    let negative_outcomes = score_all(runner, &negatives, config, bar.as_ref()).await?;
    progress::finish_progress(bar, "Scoring complete");

    let mut timeouts = 0;
    let mut scoring_errors = 0;

    // Recall: a timed-out or failed positive counts as a miss, never
    // dropped from the denominator.
    let mut hits = 0;
    for (clip, outcome) in positives.iter().zip(&positive_outcomes) {
        match outcome {
            ScoreOutcome::Scored(track) => {
                if track.peak() >= config.threshold {
                    hits += 1;
                } else {
                    debug!(
                        "Missed positive {} (peak {:.3})",
                        clip.path.display(),
                        track.peak()
                    );
                }
            }
            ScoreOutcome::TimedOut => timeouts += 1,
            ScoreOutcome::Failed => scoring_errors += 1,
        }
    }
    #[allow(clippy::cast_precision_loss)]
    let recall = if positives.is_empty() {
        0.0
    } else {
        f64::from(hits) / positives.len() as f64
    };

    // False accepts: every threshold crossing is an event; timed-out
    // clips contribute neither events nor scored duration.
    let mut false_accept_events = Vec::new();
    let mut negative_duration_seconds = 0.0;
    for (clip, outcome) in negatives.iter().zip(&negative_outcomes) {
        match outcome {
            ScoreOutcome::Scored(track) => {
                negative_duration_seconds += clip.duration_seconds;
                false_accept_events.extend(count_false_accepts(
                    clip,
                    track,
                    config.threshold,
                    config.cooldown_seconds,
                ));
            }
            ScoreOutcome::TimedOut => timeouts += 1,
            ScoreOutcome::Failed => scoring_errors += 1,
        }
    }

    let false_alarms_per_hour = far_per_hour(false_accept_events.len(), negative_duration_seconds);
    let passed = false_alarms_per_hour <= config.target_far_per_hour;

    if timeouts > 0 {
        warn!("{timeouts} clip(s) timed out during scoring");
    }
    info!(
        "Recall {:.3}, {:.2} false alarms/hour over {:.1}s of negative audio ({})",
        recall,
        false_alarms_per_hour,
        negative_duration_seconds,
        if passed { "within target" } else { "above target" }
    );

    Ok(EvaluationReport {
        generated_at: Utc::now(),
        model_path: None,
        threshold: config.threshold,
        target_far_per_hour: config.target_far_per_hour,
        passed,
        recall,
        false_alarms_per_hour,
        evaluated_positive_count: positives.len(),
        evaluated_negative_count: negatives.len(),
        negative_duration_seconds,
        timeouts,
        scoring_errors,
        hard_negatives_mined: None,
        false_accept_events,
    })
}

/// Score clips with bounded concurrency and a per-clip timeout.
///
/// Outcomes are restored to clip order by sorting on the original index,
/// never by completion order. Per-clip failures are recoverable; a missing
/// scorer program or a resource-exhaustion kill aborts the round.
async fn score_all<R: DetectorRunner + Sync>(
    runner: &R,
    clips: &[Clip],
    config: &EvalConfig,
    bar: Option<&indicatif::ProgressBar>,
) -> Result<Vec<ScoreOutcome>> {
    let mut indexed: Vec<(usize, Result<ScoreOutcome>)> =
        futures_util::stream::iter(clips.iter().enumerate().map(|(index, clip)| async move {
            let outcome = score_one(runner, clip, config).await;
            progress::inc_progress(bar);
            (index, outcome)
        }))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;

    indexed.sort_by_key(|(index, _)| *index);

    let mut outcomes = Vec::with_capacity(indexed.len());
    for (_, outcome) in indexed {
        outcomes.push(outcome?);
    }
    Ok(outcomes)
}

async fn score_one<R: DetectorRunner + Sync>(
    runner: &R,
    clip: &Clip,
    config: &EvalConfig,
) -> Result<ScoreOutcome> {
    match tokio::time::timeout(config.clip_timeout, runner.score_clip(clip)).await {
        Ok(Ok(track)) => Ok(ScoreOutcome::Scored(track)),
        Ok(Err(e @ (Error::ScorerSpawn { .. } | Error::ResourceExhausted { .. }))) => Err(e),
        Ok(Err(e)) => {
            warn!("Scoring failed for {}: {e}", clip.path.display());
            Ok(ScoreOutcome::Failed)
        }
        Err(_) => {
            warn!(
                "Scoring timed out for {} after {:.1}s",
                clip.path.display(),
                config.clip_timeout.as_secs_f64()
            );
            Ok(ScoreOutcome::TimedOut)
        }
    }
}

/// Count threshold crossings in one negative clip's score track.
///
/// A crossing starts a refractory window so a sustained activation counts
/// once; a long clip can still contribute several events.
fn count_false_accepts(
    clip: &Clip,
    track: &ScoreTrack,
    threshold: f32,
    cooldown_seconds: f64,
) -> Vec<FalseAcceptEvent> {
    if track.frame_rate_hz <= 0.0 {
        return Vec::new();
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cooldown_frames = ((cooldown_seconds * f64::from(track.frame_rate_hz)).round() as usize).max(1);

    let mut events = Vec::new();
    let mut cooldown = 0usize;
    for (frame, &score) in track.scores.iter().enumerate() {
        if cooldown > 0 {
            cooldown -= 1;
            continue;
        }
        if score >= threshold {
            #[allow(clippy::cast_precision_loss)]
            events.push(FalseAcceptEvent {
                clip_id: clip.id.clone(),
                clip_path: clip.path.clone(),
                offset_seconds: frame as f64 / f64::from(track.frame_rate_hz),
                score,
            });
            cooldown = cooldown_frames;
        }
    }
    events
}

/// Duration-normalized false-alarm rate.
///
/// Normalized by elapsed negative-audio time, not clip count: negative
/// clips have heterogeneous lengths and a count-based rate would be
/// biased by the length distribution.
fn far_per_hour(events: usize, negative_duration_seconds: f64) -> f64 {
    use crate::constants::SECONDS_PER_HOUR;

    if negative_duration_seconds <= 0.0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let events = events as f64;
    events / (negative_duration_seconds / SECONDS_PER_HOUR)
}

/// Evenly sample up to `max` clips across a path-sorted list.
///
/// Keeps the audit's coverage uniform across the pool instead of biased
/// toward a directory prefix.
fn sample_even(clips: &[Clip], max: usize) -> Vec<Clip> {
    if clips.len() <= max {
        return clips.to_vec();
    }
    (0..max)
        .map(|k| clips[k * (clips.len() - 1) / (max - 1).max(1)].clone())
        .collect()
}
