/// Number of output samples `elapsed_ms` spans at `target_rate_hz`.
///
/// Truncating division; the result may be one short of an exact resample.
/// Negative elapsed time gives a negative count, which the resampler rejects.
pub fn target_length(elapsed_ms: i64, target_rate_hz: u32) -> i64 {
    elapsed_ms * target_rate_hz as i64 / 1000
}

/// Effective capture rate implied by a buffer spanning `elapsed_ms`
pub fn measured_rate_hz(source_length: usize, elapsed_ms: i64) -> Option<f64> {
    if elapsed_ms <= 0 {
        return None;
    }
    Some(source_length as f64 / elapsed_ms as f64 * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_length() {
        assert_eq!(target_length(2125, 40), 85);
        assert_eq!(target_length(680, 100), 68);
        assert_eq!(target_length(1808, 40), 72);
        assert_eq!(target_length(0, 100), 0);
    }

    #[test]
    fn test_target_length_truncates_toward_zero() {
        assert_eq!(target_length(9, 100), 0);
        assert_eq!(target_length(-15, 100), -1);
    }

    #[test]
    fn test_measured_rate() {
        let rate = measured_rate_hz(85, 680).unwrap();
        assert!((rate - 125.0).abs() < 1e-9);
        assert_eq!(measured_rate_hz(85, 0), None);
        assert_eq!(measured_rate_hz(85, -10), None);
    }
}
