//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

/// Parse and validate a detector threshold (0.0-1.0).
pub fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(0.0..=1.0).contains(&value) {
        return Err(format!(
            "threshold must be between 0.0 and 1.0, got {value}"
        ));
    }

    Ok(value)
}

/// Parse and validate a false-alarm rate target (non-negative).
pub fn parse_far(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value < 0.0 {
        return Err(format!(
            "target false-alarm rate must be non-negative, got {value}"
        ));
    }

    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threshold_valid() {
        assert_eq!(parse_threshold("0.5").ok(), Some(0.5));
        assert_eq!(parse_threshold("0.0").ok(), Some(0.0));
        assert_eq!(parse_threshold("1.0").ok(), Some(1.0));
    }

    #[test]
    fn test_parse_threshold_invalid() {
        assert!(parse_threshold("1.1").is_err());
        assert!(parse_threshold("-0.1").is_err());
        assert!(parse_threshold("abc").is_err());
    }

    #[test]
    fn test_parse_far_valid() {
        assert_eq!(parse_far("0.1").ok(), Some(0.1));
        assert_eq!(parse_far("0").ok(), Some(0.0));
        assert_eq!(parse_far("18.5").ok(), Some(18.5));
    }

    #[test]
    fn test_parse_far_invalid() {
        assert!(parse_far("-1.0").is_err());
        assert!(parse_far("many").is_err());
    }
}
