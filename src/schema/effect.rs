//! Declarative state changes: choice effects, choice costs, and scene entry actions.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

use super::bare_some;
use super::one_or_many::OneOrMany;
use super::stat::Stat;

/// A set of independent mutations applied together.
///
/// Each field addresses a disjoint part of the player state, so the
/// order in which they are applied does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EffectSpec {
    pub resonance: i32,
    pub suspicion: i32,
    #[serde(rename = "quietLevel", alias = "quiet_level")]
    pub quiet_level: i32,
    pub integrity: i32,
    /// NPC id → trust delta.
    pub npc_trust: BTreeMap<String, i32>,
    pub flags_add: OneOrMany<String>,
    pub flags_remove: OneOrMany<String>,
    pub give_item: OneOrMany<String>,
    pub remove_item: OneOrMany<String>,
    #[serde(deserialize_with = "bare_some")]
    pub journal: Option<String>,
}

impl EffectSpec {
    /// Non-zero stat deltas, in stat order.
    pub fn stat_deltas(&self) -> Vec<(Stat, i32)> {
        [
            (Stat::Resonance, self.resonance),
            (Stat::Suspicion, self.suspicion),
            (Stat::QuietLevel, self.quiet_level),
            (Stat::Integrity, self.integrity),
        ]
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .collect()
    }

    /// Builder-style helper for a single stat delta.
    pub fn with_stat(mut self, stat: Stat, delta: i32) -> Self {
        match stat {
            Stat::Resonance => self.resonance += delta,
            Stat::Suspicion => self.suspicion += delta,
            Stat::QuietLevel => self.quiet_level += delta,
            Stat::Integrity => self.integrity += delta,
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Stat price of a choice, in declared order. Deltas are usually negative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cost {
    entries: Vec<(Stat, i32)>,
    /// Keys that did not name a stat; they can neither block nor mutate.
    dropped: Vec<String>,
}

impl Cost {
    pub fn new(entries: Vec<(Stat, i32)>) -> Self {
        Self {
            entries,
            dropped: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[(Stat, i32)] {
        &self.entries
    }

    pub fn dropped_keys(&self) -> &[String] {
        &self.dropped
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cost expressed as an effect, for the effect applier.
    pub fn as_effect(&self) -> EffectSpec {
        self.entries
            .iter()
            .fold(EffectSpec::default(), |spec, (stat, delta)| {
                spec.with_stat(*stat, *delta)
            })
    }
}

impl<'de> Deserialize<'de> for Cost {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CostVisitor;

        impl<'de> Visitor<'de> for CostVisitor {
            type Value = Cost;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of stat names to deltas")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Cost, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut cost = Cost::default();
                while let Some(key) = map.next_key::<String>()? {
                    let delta: i32 = map.next_value()?;
                    match Stat::from_key(&key) {
                        Some(stat) => cost.entries.push((stat, delta)),
                        None => cost.dropped.push(key),
                    }
                }
                Ok(cost)
            }
        }

        deserializer.deserialize_map(CostVisitor)
    }
}

/// One action run when a scene is entered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum EntryAction {
    SetFlag(String),
    RemoveFlag(String),
    Journal(String),
    ModifyStat { stat: Stat, delta: i32 },
    GiveItem(String),
    ModifyTrust { npc: String, delta: i32 },
}

impl EntryAction {
    pub fn to_effect(&self) -> EffectSpec {
        let mut spec = EffectSpec::default();
        match self {
            Self::SetFlag(flag) => spec.flags_add = vec![flag.clone()].into(),
            Self::RemoveFlag(flag) => spec.flags_remove = vec![flag.clone()].into(),
            Self::Journal(text) => spec.journal = Some(text.clone()),
            Self::ModifyStat { stat, delta } => spec = spec.with_stat(*stat, *delta),
            Self::GiveItem(item) => spec.give_item = vec![item.clone()].into(),
            Self::ModifyTrust { npc, delta } => {
                spec.npc_trust.insert(npc.clone(), *delta);
            }
        }
        spec
    }
}

/// A scene entry action, optionally limited to the first visit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntryEffect {
    pub action: EntryAction,
    #[serde(default)]
    pub first_visit_only: bool,
}
