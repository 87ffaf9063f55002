use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Pacing of a session.
///
/// The values are tunable. What the engine relies on is their order: a
/// clear is published before gravity runs, and gravity runs before the
/// next scan.
///
/// Durations serialize as integer milliseconds. Missing fields take their
/// default values.
///
/// ```
/// use std::time::Duration;
/// use puyo_engine::SessionTiming;
///
/// let timing: SessionTiming = serde_json::from_str(r#"{ "clear_delay": 150 }"#).unwrap();
/// assert_eq!(timing.clear_delay, Duration::from_millis(150));
/// assert_eq!(timing.fall_interval, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionTiming {
    /// Interval between descent ticks.
    #[serde(with = "millis")]
    pub fall_interval: Duration,
    /// Delay between a lock and the first group scan.
    #[serde(with = "millis")]
    pub lock_delay: Duration,
    /// Delay between clearing groups and applying gravity.
    #[serde(with = "millis")]
    pub clear_delay: Duration,
    /// Delay between applying gravity and the next group scan.
    #[serde(with = "millis")]
    pub cascade_delay: Duration,
    /// Whether [`GameSession::advance`](crate::GameSession::advance) also
    /// generates descent ticks every `fall_interval`.
    pub auto_descent: bool,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            fall_interval: Duration::from_millis(500),
            lock_delay: Duration::from_millis(200),
            clear_delay: Duration::from_millis(300),
            cascade_delay: Duration::from_millis(300),
            auto_descent: false,
        }
    }
}

impl SessionTiming {
    /// Timing with every resolution delay set to zero.
    ///
    /// Cascades still happen step by step, but each step is due immediately.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            lock_delay: Duration::ZERO,
            clear_delay: Duration::ZERO,
            cascade_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[expect(clippy::cast_possible_truncation)]
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = value.as_millis().min(u128::from(u64::MAX)) as u64;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pacing_order() {
        let timing = SessionTiming::default();
        assert!(timing.lock_delay < timing.fall_interval);
        assert_eq!(timing.clear_delay, Duration::from_millis(300));
        assert_eq!(timing.cascade_delay, Duration::from_millis(300));
        assert!(!timing.auto_descent);
    }

    #[test]
    fn test_serializes_as_milliseconds() {
        let json = serde_json::to_value(SessionTiming::default()).unwrap();
        assert_eq!(json["fall_interval"], 500);
        assert_eq!(json["lock_delay"], 200);
        assert_eq!(json["auto_descent"], false);

        let parsed: SessionTiming = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, SessionTiming::default());
    }

    #[test]
    fn test_instant_keeps_fall_interval() {
        let timing = SessionTiming::instant();
        assert_eq!(timing.fall_interval, Duration::from_millis(500));
        assert!(timing.lock_delay.is_zero());
        assert!(timing.clear_delay.is_zero());
        assert!(timing.cascade_delay.is_zero());
    }
}
