//! Runtime configuration read from the environment

use std::str::FromStr;
use std::time::Duration;

const DEFAULT_TIME_SCALE: f64 = 1.0;
const DEFAULT_EVENT_CAPACITY: usize = 32;
const DEFAULT_BROADCAST_CAPACITY: usize = 128;

/// Settings shared by every form instance in the process
#[derive(Debug, Clone, PartialEq)]
pub struct FormConfig {
    /// Multiplier applied to output waits. `0.0` disables the timers.
    pub time_scale: f64,
    /// Capacity of the command channel of a spawned form
    pub event_capacity: usize,
    /// Capacity of the broadcast channel observers subscribe to
    pub broadcast_capacity: usize,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            time_scale: DEFAULT_TIME_SCALE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl FormConfig {
    /// Read `CHAT_FORM_TIME_SCALE`, `CHAT_FORM_EVENT_CAPACITY` and
    /// `CHAT_FORM_BROADCAST_CAPACITY`. Unset or invalid values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            time_scale: parse_var(&lookup, "CHAT_FORM_TIME_SCALE", DEFAULT_TIME_SCALE, |v| {
                v.is_finite() && *v >= 0.0
            }),
            event_capacity: parse_var(
                &lookup,
                "CHAT_FORM_EVENT_CAPACITY",
                DEFAULT_EVENT_CAPACITY,
                |v| *v > 0,
            ),
            broadcast_capacity: parse_var(
                &lookup,
                "CHAT_FORM_BROADCAST_CAPACITY",
                DEFAULT_BROADCAST_CAPACITY,
                |v| *v > 0,
            ),
        }
    }

    /// Config for tests: no real waiting
    pub fn instant() -> Self {
        Self {
            time_scale: 0.0,
            ..Self::default()
        }
    }

    /// Scale an output wait. Zero means the timer is skipped. A scale that
    /// is not finite counts as zero, and results too large for a
    /// [`Duration`] saturate.
    pub fn scaled_wait(&self, wait: Duration) -> Duration {
        if !self.time_scale.is_finite() || self.time_scale <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(wait.as_secs_f64() * self.time_scale)
            .unwrap_or(Duration::MAX)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    valid: impl Fn(&T) -> bool,
) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            tracing::warn!(key, value = %raw, default = %default, "Ignoring invalid configuration value");
            default
        }
    }
}
