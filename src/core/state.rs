//! Player state: the single mutable store for a game session.
//!
//! Every mutation keeps the state inside its bounds: stats clamp to
//! `0..=max`, trust clamps to `-100..=100`, and the inventory never holds
//! duplicates or more items than its capacity.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::core::config::EngineConfig;
use crate::core::persistence::Snapshot;
use crate::schema::stat::{DegradationLevel, Stat, SuspicionTier};

pub const DEFAULT_STAT_MAX: i32 = 100;
pub const TRUST_MIN: i32 = -100;
pub const TRUST_MAX: i32 = 100;

/// An integer stat clamped to `0..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedStat {
    value: i32,
    max: i32,
}

impl BoundedStat {
    pub fn new(value: i32, max: i32) -> Self {
        let max = max.max(0);
        Self {
            value: value.clamp(0, max),
            max,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn modify(&mut self, delta: i32) {
        self.set(self.value.saturating_add(delta));
    }

    pub fn set(&mut self, value: i32) {
        self.value = value.clamp(0, self.max);
    }

    pub fn is_maxed(&self) -> bool {
        self.value >= self.max
    }
}

/// A player-visible log line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalEntry {
    pub text: String,
    /// Turn count when the entry was written.
    pub turn: u32,
    /// Scene the player was in when the entry was written.
    pub scene: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    resonance: BoundedStat,
    suspicion: BoundedStat,
    quiet_level: BoundedStat,
    integrity: BoundedStat,
    inventory: Vec<String>,
    inventory_capacity: usize,
    flags: FxHashSet<String>,
    npc_trust: FxHashMap<String, i32>,
    journal: Vec<JournalEntry>,
    current_scene: String,
    choices_made: Vec<String>,
    scenes_visited: FxHashSet<String>,
    turn_count: u32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(&EngineConfig::default(), &[])
    }
}

impl PlayerState {
    /// A fresh game: initial stats, empty history, zero trust for every
    /// NPC in `roster`.
    pub fn new(config: &EngineConfig, roster: &[String]) -> Self {
        let stat = |s: Stat| BoundedStat::new(s.initial_value(), DEFAULT_STAT_MAX);
        Self {
            resonance: stat(Stat::Resonance),
            suspicion: stat(Stat::Suspicion),
            quiet_level: stat(Stat::QuietLevel),
            integrity: stat(Stat::Integrity),
            inventory: Vec::new(),
            inventory_capacity: config.inventory_capacity,
            flags: FxHashSet::default(),
            npc_trust: roster.iter().map(|npc| (npc.clone(), 0)).collect(),
            journal: Vec::new(),
            current_scene: config.start_scene.clone(),
            choices_made: Vec::new(),
            scenes_visited: FxHashSet::default(),
            turn_count: 0,
        }
    }

    fn bounded(&self, stat: Stat) -> &BoundedStat {
        match stat {
            Stat::Resonance => &self.resonance,
            Stat::Suspicion => &self.suspicion,
            Stat::QuietLevel => &self.quiet_level,
            Stat::Integrity => &self.integrity,
        }
    }

    fn bounded_mut(&mut self, stat: Stat) -> &mut BoundedStat {
        match stat {
            Stat::Resonance => &mut self.resonance,
            Stat::Suspicion => &mut self.suspicion,
            Stat::QuietLevel => &mut self.quiet_level,
            Stat::Integrity => &mut self.integrity,
        }
    }

    // --- stats ---

    pub fn stat(&self, stat: Stat) -> i32 {
        self.bounded(stat).value()
    }

    pub fn stat_max(&self, stat: Stat) -> i32 {
        self.bounded(stat).max()
    }

    pub fn is_maxed(&self, stat: Stat) -> bool {
        self.bounded(stat).is_maxed()
    }

    pub fn modify_stat(&mut self, stat: Stat, delta: i32) {
        self.bounded_mut(stat).modify(delta);
    }

    pub fn set_stat(&mut self, stat: Stat, value: i32) {
        self.bounded_mut(stat).set(value);
    }

    pub fn regen_resonance(&mut self, amount: i32) {
        self.modify_stat(Stat::Resonance, amount);
    }

    pub fn suspicion_tier(&self) -> SuspicionTier {
        SuspicionTier::from_suspicion(self.suspicion.value())
    }

    pub fn degradation_level(&self) -> DegradationLevel {
        DegradationLevel::from_resonance(self.resonance.value())
    }

    // --- inventory ---

    pub fn inventory(&self) -> &[String] {
        &self.inventory
    }

    pub fn inventory_capacity(&self) -> usize {
        self.inventory_capacity
    }

    /// Add an item. Returns false if it is already held or the inventory is full.
    pub fn add_item(&mut self, item: &str) -> bool {
        if self.inventory.len() >= self.inventory_capacity || self.has_item(item) {
            return false;
        }
        self.inventory.push(item.to_string());
        true
    }

    /// Remove an item. Returns false if it was not held.
    pub fn remove_item(&mut self, item: &str) -> bool {
        match self.inventory.iter().position(|held| held == item) {
            Some(idx) => {
                self.inventory.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|held| held == item)
    }

    // --- flags ---

    pub fn flags(&self) -> &FxHashSet<String> {
        &self.flags
    }

    pub fn set_flag(&mut self, flag: &str) {
        self.flags.insert(flag.to_string());
    }

    pub fn remove_flag(&mut self, flag: &str) {
        self.flags.remove(flag);
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    // --- trust ---

    /// Trust toward an NPC; unknown NPCs read as 0.
    pub fn trust(&self, npc: &str) -> i32 {
        self.npc_trust.get(npc).copied().unwrap_or(0)
    }

    pub fn npc_trust(&self) -> &FxHashMap<String, i32> {
        &self.npc_trust
    }

    pub fn modify_trust(&mut self, npc: &str, delta: i32) {
        let trust = self.npc_trust.entry(npc.to_string()).or_insert(0);
        *trust = trust.saturating_add(delta).clamp(TRUST_MIN, TRUST_MAX);
    }

    // --- history ---

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Append a journal entry tagged with the current turn and scene.
    pub fn add_journal(&mut self, text: &str) {
        self.journal.push(JournalEntry {
            text: text.to_string(),
            turn: self.turn_count,
            scene: self.current_scene.clone(),
        });
    }

    pub fn choices_made(&self) -> &[String] {
        &self.choices_made
    }

    pub fn record_choice(&mut self, choice_id: &str) {
        self.choices_made.push(choice_id.to_string());
    }

    pub fn made_choice(&self, choice_id: &str) -> bool {
        self.choices_made.iter().any(|c| c == choice_id)
    }

    pub fn scenes_visited(&self) -> &FxHashSet<String> {
        &self.scenes_visited
    }

    /// Mark a scene visited. Returns true if this is the first visit.
    pub fn visit_scene(&mut self, scene_id: &str) -> bool {
        self.scenes_visited.insert(scene_id.to_string())
    }

    pub fn visited_scene(&self, scene_id: &str) -> bool {
        self.scenes_visited.contains(scene_id)
    }

    pub fn current_scene(&self) -> &str {
        &self.current_scene
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Move into a scene, counting the load as a turn.
    pub fn begin_turn(&mut self, scene_id: &str) {
        self.current_scene = scene_id.to_string();
        self.turn_count += 1;
    }

    // --- persistence ---

    pub fn snapshot(&self) -> Snapshot {
        let mut flags: Vec<String> = self.flags.iter().cloned().collect();
        flags.sort();
        let mut scenes_visited: Vec<String> = self.scenes_visited.iter().cloned().collect();
        scenes_visited.sort();

        Snapshot {
            resonance: self.resonance.value(),
            suspicion: self.suspicion.value(),
            quiet_level: self.quiet_level.value(),
            integrity: self.integrity.value(),
            inventory: self.inventory.clone(),
            flags,
            npc_trust: self
                .npc_trust
                .iter()
                .map(|(npc, trust)| (npc.clone(), *trust))
                .collect(),
            journal: self.journal.clone(),
            current_scene: self.current_scene.clone(),
            choices_made: self.choices_made.clone(),
            scenes_visited,
            turn_count: self.turn_count,
        }
    }

    /// Rebuild a state from a snapshot. Bounds come from `config`;
    /// out-of-range values are clamped, and the inventory is refilled in
    /// order, so duplicates and items past capacity are dropped.
    pub fn restore(snapshot: Snapshot, config: &EngineConfig) -> Self {
        let stat = |value: i32| BoundedStat::new(value, DEFAULT_STAT_MAX);
        let mut state = Self {
            resonance: stat(snapshot.resonance),
            suspicion: stat(snapshot.suspicion),
            quiet_level: stat(snapshot.quiet_level),
            integrity: stat(snapshot.integrity),
            inventory: Vec::new(),
            inventory_capacity: config.inventory_capacity,
            flags: snapshot.flags.into_iter().collect(),
            npc_trust: snapshot
                .npc_trust
                .into_iter()
                .map(|(npc, trust)| (npc, trust.clamp(TRUST_MIN, TRUST_MAX)))
                .collect(),
            journal: snapshot.journal,
            current_scene: snapshot.current_scene,
            choices_made: snapshot.choices_made,
            scenes_visited: snapshot.scenes_visited.into_iter().collect(),
            turn_count: snapshot.turn_count,
        };
        for item in &snapshot.inventory {
            state.add_item(item);
        }
        state
    }
}
