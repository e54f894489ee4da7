//! CLI subcommand implementations.

pub mod enrich;
pub mod lookup;

use anyhow::{bail, Result};

/// Reject fuzzy thresholds outside 0-100 before any file is read.
pub(crate) fn validate_threshold(threshold: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&threshold) {
        bail!(
            "Invalid --threshold value: {}. Must be between 0 and 100",
            threshold
        );
    }
    Ok(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_threshold_bounds() {
        assert_eq!(validate_threshold(0.0).unwrap(), 0.0);
        assert_eq!(validate_threshold(90.0).unwrap(), 90.0);
        assert_eq!(validate_threshold(100.0).unwrap(), 100.0);
    }

    #[test]
    fn test_validate_threshold_rejects_out_of_range() {
        assert!(validate_threshold(-1.0).is_err());
        assert!(validate_threshold(100.5).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
    }
}
