//! Replay modes for historical tick data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Pacing policy used when feeding historical ticks into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplayMode {
    /// Sleep for the gap observed between consecutive ticks.
    RealTime,
    /// Minimal fixed delay between ticks.
    #[default]
    FastForward,
    /// Amplified gap between ticks.
    SlowMotion,
}

impl fmt::Display for ReplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RealTime => write!(f, "real-time"),
            Self::FastForward => write!(f, "fast-forward"),
            Self::SlowMotion => write!(f, "slow-motion"),
        }
    }
}

impl FromStr for ReplayMode {
    type Err = CoreError;

    /// Accepts `real-time`, `realtime`, `real_time` and the like, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "realtime" => Ok(Self::RealTime),
            "fastforward" => Ok(Self::FastForward),
            "slowmotion" => Ok(Self::SlowMotion),
            _ => Err(CoreError::UnknownReplayMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("real-time".parse::<ReplayMode>().unwrap(), ReplayMode::RealTime);
        assert_eq!("FastForward".parse::<ReplayMode>().unwrap(), ReplayMode::FastForward);
        assert_eq!("slow_motion".parse::<ReplayMode>().unwrap(), ReplayMode::SlowMotion);
        assert!("warp".parse::<ReplayMode>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for mode in [ReplayMode::RealTime, ReplayMode::FastForward, ReplayMode::SlowMotion] {
            assert_eq!(mode.to_string().parse::<ReplayMode>().unwrap(), mode);
        }
    }
}
