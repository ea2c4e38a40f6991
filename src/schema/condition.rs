//! Choice requirements: a closed set of predicates parsed once at load.
//!
//! Content writes requirements as a flat map from predicate key to value:
//!
//! ```ron
//! requires: {
//!     "resonance_gte": 20,
//!     "has_flag": ["met_rook", "found_datakey"],
//!     "trust_talia_gte": 10,
//!     "not_choice": "accuse_talia",
//! }
//! ```
//!
//! Dynamic keys (`{stat}_gte`, `trust_{npc}_lte`, ...) are resolved into
//! [`Predicate`] variants during deserialization, in declared order.
//! Authoring mistakes never fail the load: a value of the wrong type makes
//! its predicate [`Predicate::Malformed`], and an unknown suspicion tier
//! never matches.

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

use super::one_or_many::OneOrMany;
use super::stat::{Stat, SuspicionTier};

/// A single requirement on the player state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `{stat}_gte: n`
    StatAtLeast { stat: Stat, n: i32 },
    /// `{stat}_lte: n`
    StatAtMost { stat: Stat, n: i32 },
    /// `has_flag`: every listed flag is set.
    HasFlags(Vec<String>),
    /// `not_flag`: none of the listed flags is set.
    LacksFlags(Vec<String>),
    /// `has_item`: every listed item is in the inventory.
    HasItems(Vec<String>),
    /// `trust_{npc}_gte: n`
    TrustAtLeast { npc: String, n: i32 },
    /// `trust_{npc}_lte: n`
    TrustAtMost { npc: String, n: i32 },
    /// `made_choice`: every listed choice has been recorded.
    MadeChoices(Vec<String>),
    /// `not_choice`: none of the listed choices has been recorded.
    AvoidedChoices(Vec<String>),
    /// `visited_scene: s`
    VisitedScene(String),
    /// `suspicion_level: tier` matches the tier exactly.
    SuspicionLevel(SuspicionTier),
    /// `suspicion_level` naming a tier that does not exist. Never matches.
    UnknownSuspicionLevel(String),
    /// A known key whose value has the wrong type. Always satisfied.
    Malformed(String),
    /// A key outside the vocabulary. Always satisfied.
    Unrecognized(String),
}

impl Predicate {
    /// The content key this predicate was written as.
    pub fn key(&self) -> String {
        match self {
            Self::StatAtLeast { stat, .. } => format!("{}_gte", stat.key()),
            Self::StatAtMost { stat, .. } => format!("{}_lte", stat.key()),
            Self::HasFlags(_) => "has_flag".to_string(),
            Self::LacksFlags(_) => "not_flag".to_string(),
            Self::HasItems(_) => "has_item".to_string(),
            Self::TrustAtLeast { npc, .. } => format!("trust_{}_gte", npc),
            Self::TrustAtMost { npc, .. } => format!("trust_{}_lte", npc),
            Self::MadeChoices(_) => "made_choice".to_string(),
            Self::AvoidedChoices(_) => "not_choice".to_string(),
            Self::VisitedScene(_) => "visited_scene".to_string(),
            Self::SuspicionLevel(_) | Self::UnknownSuspicionLevel(_) => "suspicion_level".to_string(),
            Self::Malformed(key) | Self::Unrecognized(key) => key.clone(),
        }
    }
}

/// An ordered conjunction of predicates. Empty means always satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSpec {
    predicates: Vec<Predicate>,
}

impl ConditionSpec {
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Authoring problems worth a warning: unknown keys, values of the
    /// wrong type, and unknown suspicion tiers.
    pub fn problems(&self) -> impl Iterator<Item = String> + '_ {
        self.predicates.iter().filter_map(|p| match p {
            Predicate::Unrecognized(key) => {
                Some(format!("unrecognized requirement '{}' (always satisfied)", key))
            }
            Predicate::Malformed(key) => {
                Some(format!("requirement '{}' has a value of the wrong type (always satisfied)", key))
            }
            Predicate::UnknownSuspicionLevel(tier) => {
                Some(format!("unknown suspicion tier '{}' (never matches)", tier))
            }
            _ => None,
        })
    }
}

impl<'de> Deserialize<'de> for ConditionSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ConditionSpecVisitor)
    }
}

struct ConditionSpecVisitor;

impl<'de> Visitor<'de> for ConditionSpecVisitor {
    type Value = ConditionSpec;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of requirement keys to values")
    }

    fn visit_map<A>(self, mut map: A) -> Result<ConditionSpec, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut predicates = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            predicates.push(next_predicate(&key, &mut map)?);
        }
        Ok(ConditionSpec { predicates })
    }
}

fn next_predicate<'de, A>(key: &str, map: &mut A) -> Result<Predicate, A::Error>
where
    A: MapAccess<'de>,
{
    match key {
        "has_flag" => return lenient(key, map, |v: OneOrMany<String>| Predicate::HasFlags(v.into_vec())),
        "not_flag" => return lenient(key, map, |v: OneOrMany<String>| Predicate::LacksFlags(v.into_vec())),
        "has_item" => return lenient(key, map, |v: OneOrMany<String>| Predicate::HasItems(v.into_vec())),
        "made_choice" => return lenient(key, map, |v: OneOrMany<String>| Predicate::MadeChoices(v.into_vec())),
        "not_choice" => return lenient(key, map, |v: OneOrMany<String>| Predicate::AvoidedChoices(v.into_vec())),
        "visited_scene" => return lenient(key, map, Predicate::VisitedScene),
        "suspicion_level" => {
            return lenient(key, map, |tier: String| match tier.parse() {
                Ok(tier) => Predicate::SuspicionLevel(tier),
                Err(_) => Predicate::UnknownSuspicionLevel(tier),
            })
        }
        _ => {}
    }

    // trust_ keys must be tried before the generic stat suffixes.
    if let Some(rest) = key.strip_prefix("trust_") {
        if let Some(npc) = rest.strip_suffix("_gte").filter(|npc| !npc.is_empty()) {
            return lenient(key, map, |n| Predicate::TrustAtLeast {
                npc: npc.to_string(),
                n,
            });
        }
        if let Some(npc) = rest.strip_suffix("_lte").filter(|npc| !npc.is_empty()) {
            return lenient(key, map, |n| Predicate::TrustAtMost {
                npc: npc.to_string(),
                n,
            });
        }
    }

    if let Some(stat) = key.strip_suffix("_gte").and_then(Stat::from_key) {
        return lenient(key, map, |n| Predicate::StatAtLeast { stat, n });
    }
    if let Some(stat) = key.strip_suffix("_lte").and_then(Stat::from_key) {
        return lenient(key, map, |n| Predicate::StatAtMost { stat, n });
    }

    map.next_value::<IgnoredAny>()?;
    Ok(Predicate::Unrecognized(key.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

/// Read the next value as `T`, falling back to [`Predicate::Malformed`].
fn lenient<'de, A, T>(key: &str, map: &mut A, build: impl FnOnce(T) -> Predicate) -> Result<Predicate, A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    Ok(match map.next_value::<Lenient<T>>()? {
        Lenient::Valid(value) => build(value),
        Lenient::Invalid(_) => Predicate::Malformed(key.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> ConditionSpec {
        ron::from_str(input).unwrap()
    }

    #[test]
    fn parse_stat_predicates() {
        let spec = parse(r#"{"resonance_gte": 20, "quietLevel_lte": 40}"#);
        assert_eq!(
            spec.predicates(),
            &[
                Predicate::StatAtLeast {
                    stat: Stat::Resonance,
                    n: 20
                },
                Predicate::StatAtMost {
                    stat: Stat::QuietLevel,
                    n: 40
                },
            ]
        );
    }

    #[test]
    fn parse_trust_before_stat_suffix() {
        let spec = parse(r#"{"trust_crowe_gte": 10, "trust_rook_lte": -5}"#);
        assert_eq!(
            spec.predicates(),
            &[
                Predicate::TrustAtLeast {
                    npc: "crowe".to_string(),
                    n: 10
                },
                Predicate::TrustAtMost {
                    npc: "rook".to_string(),
                    n: -5
                },
            ]
        );
    }

    #[test]
    fn parse_scalar_and_list_values() {
        let spec = parse(r#"{"has_flag": "met_rook", "not_choice": ["a", "b"]}"#);
        assert_eq!(
            spec.predicates()[0],
            Predicate::HasFlags(vec!["met_rook".to_string()])
        );
        assert_eq!(
            spec.predicates()[1],
            Predicate::AvoidedChoices(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn parse_suspicion_level() {
        let spec = parse(r#"{"suspicion_level": "watched"}"#);
        assert_eq!(
            spec.predicates(),
            &[Predicate::SuspicionLevel(SuspicionTier::Watched)]
        );
    }

    #[test]
    fn unknown_suspicion_tier_is_kept() {
        let spec = parse(r#"{"suspicion_level": "sleepy"}"#);
        assert_eq!(
            spec.predicates(),
            &[Predicate::UnknownSuspicionLevel("sleepy".to_string())]
        );
        let problems: Vec<String> = spec.problems().collect();
        assert_eq!(problems, vec!["unknown suspicion tier 'sleepy' (never matches)"]);
    }

    #[test]
    fn unknown_keys_are_kept_as_unrecognized() {
        let spec = parse(r#"{"charisma_gte": 5, "moon_phase": ["full"], "has_item": "bureau_badge"}"#);
        assert_eq!(spec.predicates()[0], Predicate::Unrecognized("charisma_gte".to_string()));
        assert_eq!(spec.predicates()[1], Predicate::Unrecognized("moon_phase".to_string()));
        assert_eq!(spec.problems().count(), 2);
        assert_eq!(spec.predicates().len(), 3);
    }

    #[test]
    fn declared_order_is_preserved() {
        let spec = parse(r#"{"visited_scene": "act1_scene02", "has_flag": "x", "integrity_gte": 1}"#);
        let keys: Vec<String> = spec.predicates().iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["visited_scene", "has_flag", "integrity_gte"]);
    }

    #[test]
    fn wrong_value_type_degrades() {
        let spec = parse(r#"{"resonance_gte": "lots", "has_flag": 3, "integrity_gte": 5}"#);
        assert_eq!(
            spec.predicates(),
            &[
                Predicate::Malformed("resonance_gte".to_string()),
                Predicate::Malformed("has_flag".to_string()),
                Predicate::StatAtLeast {
                    stat: Stat::Integrity,
                    n: 5
                },
            ]
        );
        assert_eq!(spec.problems().count(), 2);
    }
}
