//! The four bounded player stats and the tiers derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A bounded player stat. Content refers to stats by their camelCase key
/// (`resonance`, `suspicion`, `quietLevel`, `integrity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stat {
    Resonance,
    Suspicion,
    QuietLevel,
    Integrity,
}

impl Stat {
    pub const ALL: [Stat; 4] = [
        Stat::Resonance,
        Stat::Suspicion,
        Stat::QuietLevel,
        Stat::Integrity,
    ];

    /// The key used for this stat in content and save data.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Resonance => "resonance",
            Self::Suspicion => "suspicion",
            Self::QuietLevel => "quietLevel",
            Self::Integrity => "integrity",
        }
    }

    /// Human-readable label used in requirement reasons.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resonance => "Resonance",
            Self::Suspicion => "Suspicion",
            Self::QuietLevel => "Quiet Level",
            Self::Integrity => "Integrity",
        }
    }

    /// Value a fresh game starts with.
    pub fn initial_value(&self) -> i32 {
        match self {
            Self::Resonance => 70,
            Self::Integrity => 75,
            Self::Suspicion | Self::QuietLevel => 0,
        }
    }

    /// Look up a stat by content key. Unknown names yield `None`.
    pub fn from_key(key: &str) -> Option<Stat> {
        Stat::ALL.into_iter().find(|s| s.key() == key)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// How closely the Bureau is watching, derived from suspicion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspicionTier {
    Safe,
    Watched,
    Hunted,
    Critical,
    Captured,
}

impl SuspicionTier {
    pub fn from_suspicion(suspicion: i32) -> Self {
        if suspicion <= 30 {
            Self::Safe
        } else if suspicion <= 60 {
            Self::Watched
        } else if suspicion <= 85 {
            Self::Hunted
        } else if suspicion < 100 {
            Self::Critical
        } else {
            Self::Captured
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Watched => "watched",
            Self::Hunted => "hunted",
            Self::Critical => "critical",
            Self::Captured => "captured",
        }
    }
}

impl FromStr for SuspicionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "safe" => Ok(Self::Safe),
            "watched" => Ok(Self::Watched),
            "hunted" => Ok(Self::Hunted),
            "critical" => Ok(Self::Critical),
            "captured" => Ok(Self::Captured),
            other => Err(format!("unknown suspicion tier '{}'", other)),
        }
    }
}

/// How badly low resonance is corrupting perception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradationLevel {
    None,
    Light,
    Medium,
    Heavy,
}

impl DegradationLevel {
    pub fn from_resonance(resonance: i32) -> Self {
        if resonance >= 20 {
            Self::None
        } else if resonance >= 10 {
            Self::Light
        } else if resonance >= 5 {
            Self::Medium
        } else {
            Self::Heavy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_keys_and_labels() {
        assert_eq!(Stat::QuietLevel.key(), "quietLevel");
        assert_eq!(Stat::QuietLevel.label(), "Quiet Level");
        assert_eq!(Stat::from_key("integrity"), Some(Stat::Integrity));
        assert_eq!(Stat::from_key("quiet_level"), None);
    }

    #[test]
    fn suspicion_tier_boundaries() {
        assert_eq!(SuspicionTier::from_suspicion(0), SuspicionTier::Safe);
        assert_eq!(SuspicionTier::from_suspicion(30), SuspicionTier::Safe);
        assert_eq!(SuspicionTier::from_suspicion(31), SuspicionTier::Watched);
        assert_eq!(SuspicionTier::from_suspicion(60), SuspicionTier::Watched);
        assert_eq!(SuspicionTier::from_suspicion(85), SuspicionTier::Hunted);
        assert_eq!(SuspicionTier::from_suspicion(99), SuspicionTier::Critical);
        assert_eq!(SuspicionTier::from_suspicion(100), SuspicionTier::Captured);
    }

    #[test]
    fn tier_parse() {
        assert_eq!("hunted".parse::<SuspicionTier>(), Ok(SuspicionTier::Hunted));
        assert!("panicked".parse::<SuspicionTier>().is_err());
    }

    #[test]
    fn degradation_thresholds() {
        assert_eq!(DegradationLevel::from_resonance(20), DegradationLevel::None);
        assert_eq!(DegradationLevel::from_resonance(19), DegradationLevel::Light);
        assert_eq!(DegradationLevel::from_resonance(5), DegradationLevel::Medium);
        assert_eq!(DegradationLevel::from_resonance(4), DegradationLevel::Heavy);
    }
}
