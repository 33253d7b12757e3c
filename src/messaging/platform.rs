//! Android platform configuration applied uniformly to every message.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::config::AttributeResolver;
use crate::constants::{attributes, DEFAULT_TIME_TO_LIVE};

/// Delivery priority understood by the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Normal => write!(f, "Normal"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// Platform options shared by reference across every message of a service
/// instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidConfig {
    pub priority: Priority,
    #[serde(rename = "ttl", serialize_with = "serialize_ttl")]
    pub time_to_live: Duration,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            priority: Priority::Normal,
            time_to_live: DEFAULT_TIME_TO_LIVE,
        }
    }
}

impl AndroidConfig {
    /// Resolve from `AndroidConfig.Priority` and `AndroidConfig.TimeToLive`,
    /// falling back to defaults when absent or unparseable
    pub fn resolve(resolver: &dyn AttributeResolver) -> Self {
        let priority = match resolver.get_attribute(attributes::ANDROID_PRIORITY) {
            Ok(raw) => raw.parse::<Priority>().unwrap_or_else(|e| {
                warn!(
                    attribute = attributes::ANDROID_PRIORITY,
                    value = %raw,
                    error = %e,
                    "Unparseable priority, using Normal"
                );
                Priority::Normal
            }),
            Err(e) => {
                warn!(
                    attribute = attributes::ANDROID_PRIORITY,
                    error = %e,
                    "Priority not configured, using Normal"
                );
                Priority::Normal
            }
        };

        let time_to_live = match resolver.get_attribute(attributes::ANDROID_TIME_TO_LIVE) {
            Ok(raw) => parse_time_to_live(&raw).unwrap_or_else(|e| {
                warn!(
                    attribute = attributes::ANDROID_TIME_TO_LIVE,
                    value = %raw,
                    error = %e,
                    "Unparseable time to live, using 28 days"
                );
                DEFAULT_TIME_TO_LIVE
            }),
            Err(e) => {
                warn!(
                    attribute = attributes::ANDROID_TIME_TO_LIVE,
                    error = %e,
                    "Time to live not configured, using 28 days"
                );
                DEFAULT_TIME_TO_LIVE
            }
        };

        Self {
            priority,
            time_to_live,
        }
    }
}

fn serialize_ttl<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{}s", ttl.as_secs()))
}

/// Parse `"<days> <hours>:<minutes>:<seconds>"`; the day part may be omitted
pub fn parse_time_to_live(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let (days, clock) = match raw.split_once(' ') {
        Some((days, clock)) => {
            let days = days
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("invalid day count in '{raw}'"))?;
            (days, clock.trim())
        }
        None => (0, raw),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected hours:minutes:seconds in '{raw}'"));
    }

    let mut units = [0u64; 3];
    for (slot, part) in units.iter_mut().zip(&parts) {
        *slot = part
            .parse::<u64>()
            .map_err(|_| format!("invalid component '{part}' in '{raw}'"))?;
    }
    let [hours, minutes, seconds] = units;

    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(format!("component out of range in '{raw}'"));
    }

    days.checked_mul(86_400)
        .and_then(|secs| secs.checked_add(hours * 3_600 + minutes * 60 + seconds))
        .map(Duration::from_secs)
        .ok_or_else(|| format!("time to live out of range in '{raw}'"))
}
