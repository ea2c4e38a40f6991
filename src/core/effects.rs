//! Effect application: applies an [`EffectSpec`] to player state in place.

use crate::core::state::PlayerState;
use crate::schema::effect::{Cost, EffectSpec};

/// Apply every part of an effect spec.
///
/// The parts touch disjoint state, so application order is irrelevant.
/// Item grants at capacity or of an owned item, and removal of an item
/// not held, are no-ops.
pub fn apply_effects(effects: &EffectSpec, state: &mut PlayerState) {
    for (stat, delta) in effects.stat_deltas() {
        state.modify_stat(stat, delta);
    }

    for (npc, delta) in &effects.npc_trust {
        state.modify_trust(npc, *delta);
    }

    for flag in effects.flags_add.iter() {
        state.set_flag(flag);
    }
    for flag in effects.flags_remove.iter() {
        state.remove_flag(flag);
    }

    for item in effects.give_item.iter() {
        if !state.add_item(item) {
            tracing::debug!(item = item.as_str(), "item not added: already held or inventory full");
        }
    }
    for item in effects.remove_item.iter() {
        state.remove_item(item);
    }

    if let Some(text) = &effects.journal {
        state.add_journal(text);
    }
}

/// Apply a choice cost. Deltas are applied as written, clamped like any
/// other stat change.
pub fn apply_cost(cost: &Cost, state: &mut PlayerState) {
    apply_effects(&cost.as_effect(), state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::EngineConfig;
    use crate::schema::stat::Stat;

    fn effects(input: &str) -> EffectSpec {
        ron::from_str(input).unwrap()
    }

    #[test]
    fn stats_clamp() {
        let mut state = PlayerState::default();
        state.set_stat(Stat::Resonance, 2);

        apply_effects(&effects("(resonance: -10)"), &mut state);
        assert_eq!(state.stat(Stat::Resonance), 0);

        apply_effects(&effects("(resonance: 500, suspicion: 12)"), &mut state);
        assert_eq!(state.stat(Stat::Resonance), 100);
        assert_eq!(state.stat(Stat::Suspicion), 12);
    }

    #[test]
    fn trust_clamps_and_tracks_new_npcs() {
        let mut state = PlayerState::default();
        apply_effects(&effects(r#"(npc_trust: {"rook": 250, "thane": -7})"#), &mut state);
        assert_eq!(state.trust("rook"), 100);
        assert_eq!(state.trust("thane"), -7);
    }

    #[test]
    fn flags_scalar_or_list() {
        let mut state = PlayerState::default();
        apply_effects(&effects(r#"(flags_add: ["a", "b"])"#), &mut state);
        apply_effects(&effects(r#"(flags_remove: "a")"#), &mut state);
        assert!(!state.has_flag("a"));
        assert!(state.has_flag("b"));
    }

    #[test]
    fn items_respect_capacity_and_dedup() {
        let config = EngineConfig {
            inventory_capacity: 2,
            ..EngineConfig::default()
        };
        let mut state = PlayerState::new(&config, &[]);

        apply_effects(&effects(r#"(give_item: ["badge", "badge", "scanner", "datakey"])"#), &mut state);
        assert_eq!(state.inventory(), &["badge".to_string(), "scanner".to_string()]);

        apply_effects(&effects(r#"(remove_item: ["ghost", "badge"])"#), &mut state);
        assert_eq!(state.inventory(), &["scanner".to_string()]);
    }

    #[test]
    fn journal_is_tagged() {
        let mut state = PlayerState::default();
        state.begin_turn("act1_scene02");
        apply_effects(&effects(r#"(journal: "Crowe is watching.")"#), &mut state);

        let entry = &state.journal()[0];
        assert_eq!(entry.text, "Crowe is watching.");
        assert_eq!(entry.turn, 1);
        assert_eq!(entry.scene, "act1_scene02");
    }

    #[test]
    fn cost_applies_signed_deltas() {
        let mut state = PlayerState::default();
        let cost: Cost = ron::from_str(r#"{"resonance": -20, "integrity": 5}"#).unwrap();
        apply_cost(&cost, &mut state);
        assert_eq!(state.stat(Stat::Resonance), 50);
        assert_eq!(state.stat(Stat::Integrity), 80);
    }
}
