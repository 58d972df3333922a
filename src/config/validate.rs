//! Configuration validation.

use crate::config::Config;
use crate::constants::threshold;
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    let eval = &config.evaluation;

    if !(threshold::MIN..=threshold::MAX).contains(&eval.threshold) {
        return Err(Error::ConfigValidation {
            message: format!(
                "evaluation.threshold must be between {} and {}, got {}",
                threshold::MIN,
                threshold::MAX,
                eval.threshold
            ),
        });
    }

    if eval.target_far_per_hour < 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "evaluation.target_far_per_hour must be non-negative, got {}",
                eval.target_far_per_hour
            ),
        });
    }

    if eval.max_clips == 0 {
        return Err(Error::ConfigValidation {
            message: "evaluation.max_clips must be at least 1".to_string(),
        });
    }

    if eval.cooldown_seconds < 0.0 {
        return Err(Error::ConfigValidation {
            message: format!(
                "evaluation.cooldown_seconds must be non-negative, got {}",
                eval.cooldown_seconds
            ),
        });
    }

    if eval.clip_timeout_seconds == 0 {
        return Err(Error::ConfigValidation {
            message: "evaluation.clip_timeout_seconds must be at least 1".to_string(),
        });
    }

    if eval.concurrency == 0 {
        return Err(Error::ConfigValidation {
            message: "evaluation.concurrency must be at least 1".to_string(),
        });
    }

    Ok(())
}
