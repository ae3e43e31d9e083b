//! Channel classification
//!
//! A byte that takes many distinct values over the log is treated as a numeric
//! measurement (counter, sensor reading, checksum). A byte with only a handful
//! of values is treated as a state or flag byte and is handed to the interval
//! detector.

use serde::{Deserialize, Serialize};

/// Channels with more distinct values than this are numeric
pub const DEFAULT_CARDINALITY_THRESHOLD: usize = 10;
/// Mean absolute step above which a channel is considered noise
pub const DEFAULT_NOISE_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelClass {
    /// High-cardinality data, excluded from interval detection
    Numeric,
    /// Few distinct values, candidate for constancy intervals
    StateLike,
}

/// Number of distinct byte values present in the channel
pub fn distinct_values(channel: &[u8]) -> usize {
    let mut seen = [false; 256];
    let mut count = 0;
    for &v in channel {
        if !seen[v as usize] {
            seen[v as usize] = true;
            count += 1;
        }
    }
    count
}

/// Classify a corrected channel by its global distinct-value count.
///
/// An empty channel has zero distinct values and is therefore state-like.
pub fn classify(channel: &[u8], cardinality_threshold: usize) -> ChannelClass {
    if distinct_values(channel) > cardinality_threshold {
        ChannelClass::Numeric
    } else {
        ChannelClass::StateLike
    }
}

/// How much a channel moves from one sample to the next
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    /// Never changes
    Constant,
    /// Mean absolute step above the noise threshold
    Noisy { mean_step: f64 },
    /// Changes, but slowly enough to be worth looking at
    Active { mean_step: f64 },
}

/// Grade a channel by the mean absolute difference between consecutive samples
pub fn activity(channel: &[u8], noise_threshold: f64) -> Activity {
    if channel.len() < 2 {
        return Activity::Constant;
    }

    let total: u64 = channel
        .windows(2)
        .map(|p| (p[1] as i16 - p[0] as i16).unsigned_abs() as u64)
        .sum();
    if total == 0 {
        return Activity::Constant;
    }

    let mean_step = total as f64 / (channel.len() - 1) as f64;
    if mean_step > noise_threshold {
        Activity::Noisy { mean_step }
    } else {
        Activity::Active { mean_step }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_values() {
        assert_eq!(distinct_values(&[]), 0);
        assert_eq!(distinct_values(&[3, 3, 3]), 1);
        assert_eq!(distinct_values(&[0, 255, 0, 255, 7]), 3);
    }

    #[test]
    fn test_cardinality_boundary() {
        let ten: Vec<u8> = (0..10).collect();
        let eleven: Vec<u8> = (0..11).collect();
        assert_eq!(classify(&ten, DEFAULT_CARDINALITY_THRESHOLD), ChannelClass::StateLike);
        assert_eq!(classify(&eleven, DEFAULT_CARDINALITY_THRESHOLD), ChannelClass::Numeric);
    }

    #[test]
    fn test_count_is_global_not_windowed() {
        // Each stretch has one value, but the whole channel has twelve
        let ch: Vec<u8> = (0..12u8).flat_map(|v| std::iter::repeat(v).take(50)).collect();
        assert_eq!(classify(&ch, DEFAULT_CARDINALITY_THRESHOLD), ChannelClass::Numeric);
    }

    #[test]
    fn test_empty_channel_is_state_like() {
        assert_eq!(classify(&[], DEFAULT_CARDINALITY_THRESHOLD), ChannelClass::StateLike);
    }

    #[test]
    fn test_custom_threshold() {
        assert_eq!(classify(&[1, 2, 3], 2), ChannelClass::Numeric);
        assert_eq!(classify(&[1, 2, 3], 3), ChannelClass::StateLike);
    }

    #[test]
    fn test_activity_constant() {
        assert_eq!(activity(&[], 5.0), Activity::Constant);
        assert_eq!(activity(&[4], 5.0), Activity::Constant);
        assert_eq!(activity(&[4, 4, 4, 4], 5.0), Activity::Constant);
    }

    #[test]
    fn test_activity_noisy_and_active() {
        // Steps of 255 every sample
        assert_eq!(
            activity(&[0, 255, 0, 255], 5.0),
            Activity::Noisy { mean_step: 255.0 }
        );
        // One step of 4 over four pairs
        assert_eq!(
            activity(&[1, 1, 5, 5, 5], 5.0),
            Activity::Active { mean_step: 1.0 }
        );
        // Exactly at the threshold is still active
        assert_eq!(
            activity(&[0, 5, 0], 5.0),
            Activity::Active { mean_step: 5.0 }
        );
    }

    #[test]
    fn test_class_serializes_upper_case() {
        let json = serde_json::to_string(&ChannelClass::StateLike).expect("serialize failed");
        assert_eq!(json, "\"STATE_LIKE\"");
    }
}
