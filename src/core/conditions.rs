//! Requirement evaluation: pure checks of a [`ConditionSpec`] against player state.
//!
//! A failing predicate either explains itself (the choice is shown disabled
//! with a reason) or excludes silently (the choice should not be explained).
//! Exclusionary predicates are `not_flag`, `not_choice`, `trust_*_lte`, and
//! `suspicion_level`.

use crate::core::state::PlayerState;
use crate::schema::catalog::ItemCatalog;
use crate::schema::condition::{ConditionSpec, Predicate};

/// Outcome of evaluating a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionResult {
    Satisfied,
    /// Failed with a player-facing explanation.
    Unmet(String),
    /// Failed without explanation.
    Excluded,
}

impl ConditionResult {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Unmet(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Evaluates requirements. Never mutates state and never fails.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator<'a> {
    items: &'a ItemCatalog,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(items: &'a ItemCatalog) -> Self {
        Self { items }
    }

    /// AND over every predicate in declared order; the first failure wins.
    pub fn evaluate(&self, spec: &ConditionSpec, state: &PlayerState) -> ConditionResult {
        spec.predicates()
            .iter()
            .map(|predicate| self.check(predicate, state))
            .find(|result| !result.is_satisfied())
            .unwrap_or(ConditionResult::Satisfied)
    }

    pub fn check(&self, predicate: &Predicate, state: &PlayerState) -> ConditionResult {
        use ConditionResult::{Excluded, Satisfied, Unmet};

        match predicate {
            Predicate::StatAtLeast { stat, n } => {
                if state.stat(*stat) < *n {
                    Unmet(format!("Requires {} {}", n, stat.label()))
                } else {
                    Satisfied
                }
            }
            Predicate::StatAtMost { stat, n } => {
                if state.stat(*stat) > *n {
                    Unmet(format!("{} must be below {}", stat.label(), n))
                } else {
                    Satisfied
                }
            }
            Predicate::HasFlags(flags) => {
                if flags.iter().all(|f| state.has_flag(f)) {
                    Satisfied
                } else {
                    Unmet("Requires prior discovery".to_string())
                }
            }
            Predicate::LacksFlags(flags) => {
                if any_flag_set(flags, state) {
                    Excluded
                } else {
                    Satisfied
                }
            }
            Predicate::HasItems(items) => match items.iter().find(|i| !state.has_item(i)) {
                Some(missing) => Unmet(format!("Requires: {}", self.items.display_name(missing))),
                None => Satisfied,
            },
            Predicate::TrustAtLeast { npc, n } => {
                if state.trust(npc) < *n {
                    Unmet("Insufficient trust".to_string())
                } else {
                    Satisfied
                }
            }
            Predicate::TrustAtMost { npc, n } => {
                if state.trust(npc) > *n {
                    Excluded
                } else {
                    Satisfied
                }
            }
            Predicate::MadeChoices(choices) => {
                if choices.iter().all(|c| state.made_choice(c)) {
                    Satisfied
                } else {
                    Unmet("Requires prior action".to_string())
                }
            }
            Predicate::AvoidedChoices(choices) => {
                if any_choice_made(choices, state) {
                    Excluded
                } else {
                    Satisfied
                }
            }
            Predicate::VisitedScene(scene) => {
                if state.visited_scene(scene) {
                    Satisfied
                } else {
                    Unmet("Requires prior visit".to_string())
                }
            }
            Predicate::SuspicionLevel(tier) => {
                if state.suspicion_tier() == *tier {
                    Satisfied
                } else {
                    Excluded
                }
            }
            Predicate::UnknownSuspicionLevel(_) => Excluded,
            Predicate::Malformed(_) | Predicate::Unrecognized(_) => Satisfied,
        }
    }
}

fn any_flag_set(flags: &[String], state: &PlayerState) -> bool {
    flags.iter().any(|f| state.has_flag(f))
}

fn any_choice_made(choices: &[String], state: &PlayerState) -> bool {
    choices.iter().any(|c| state.made_choice(c))
}

/// True if any `not_flag` or `not_choice` in the spec currently holds,
/// meaning the choice should not be listed at all.
///
/// Shares its checks with [`ConditionEvaluator::check`] so the two never drift.
pub fn is_hidden(spec: &ConditionSpec, state: &PlayerState) -> bool {
    spec.predicates().iter().any(|predicate| match predicate {
        Predicate::LacksFlags(flags) => any_flag_set(flags, state),
        Predicate::AvoidedChoices(choices) => any_choice_made(choices, state),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::stat::Stat;

    fn items() -> ItemCatalog {
        ItemCatalog::parse_ron(r#"{"bureau_badge": Item(name: "Bureau Badge")}"#).unwrap()
    }

    fn spec(input: &str) -> ConditionSpec {
        ron::from_str(input).unwrap()
    }

    #[test]
    fn empty_spec_is_satisfied() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let result = eval.evaluate(&ConditionSpec::default(), &PlayerState::default());
        assert!(result.is_satisfied());
        assert_eq!(result.reason(), None);
    }

    #[test]
    fn stat_reasons() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let mut state = PlayerState::default();
        state.set_stat(Stat::QuietLevel, 50);

        let result = eval.evaluate(&spec(r#"{"resonance_gte": 80}"#), &state);
        assert_eq!(result, ConditionResult::Unmet("Requires 80 Resonance".to_string()));

        let result = eval.evaluate(&spec(r#"{"quietLevel_lte": 40}"#), &state);
        assert_eq!(result.reason(), Some("Quiet Level must be below 40"));

        assert!(eval.evaluate(&spec(r#"{"resonance_gte": 70}"#), &state).is_satisfied());
    }

    #[test]
    fn item_reason_uses_display_name() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let state = PlayerState::default();

        let result = eval.evaluate(&spec(r#"{"has_item": "bureau_badge"}"#), &state);
        assert_eq!(result.reason(), Some("Requires: Bureau Badge"));

        let result = eval.evaluate(&spec(r#"{"has_item": ["unlisted_key"]}"#), &state);
        assert_eq!(result.reason(), Some("Requires: unlisted_key"));
    }

    #[test]
    fn explained_failures() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let state = PlayerState::default();

        let cases = [
            (r#"{"has_flag": "met_rook"}"#, "Requires prior discovery"),
            (r#"{"trust_rook_gte": 10}"#, "Insufficient trust"),
            (r#"{"made_choice": "pocket_datakey"}"#, "Requires prior action"),
            (r#"{"visited_scene": "act1_scene04"}"#, "Requires prior visit"),
        ];
        for (input, reason) in cases {
            assert_eq!(eval.evaluate(&spec(input), &state).reason(), Some(reason), "{}", input);
        }
    }

    #[test]
    fn exclusionary_failures_have_no_reason() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let mut state = PlayerState::default();
        state.set_flag("met_rook");
        state.record_choice("accuse_talia");
        state.modify_trust("crowe", 30);

        let cases = [
            r#"{"not_flag": "met_rook"}"#,
            r#"{"not_choice": ["wait", "accuse_talia"]}"#,
            r#"{"trust_crowe_lte": 10}"#,
            r#"{"suspicion_level": "hunted"}"#,
        ];
        for input in cases {
            let result = eval.evaluate(&spec(input), &state);
            assert_eq!(result, ConditionResult::Excluded, "{}", input);
            assert_eq!(result.reason(), None);
        }
    }

    #[test]
    fn first_failure_wins() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let state = PlayerState::default();

        let result = eval.evaluate(
            &spec(r#"{"made_choice": "x", "has_flag": "y"}"#),
            &state,
        );
        assert_eq!(result.reason(), Some("Requires prior action"));

        let result = eval.evaluate(
            &spec(r#"{"has_flag": "y", "made_choice": "x"}"#),
            &state,
        );
        assert_eq!(result.reason(), Some("Requires prior discovery"));
    }

    #[test]
    fn all_listed_values_must_hold() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let mut state = PlayerState::default();
        state.set_flag("a");

        assert!(!eval.evaluate(&spec(r#"{"has_flag": ["a", "b"]}"#), &state).is_satisfied());
        state.set_flag("b");
        assert!(eval.evaluate(&spec(r#"{"has_flag": ["a", "b"]}"#), &state).is_satisfied());
    }

    #[test]
    fn trust_and_tier_pass() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let mut state = PlayerState::default();
        state.modify_trust("talia", 15);
        state.set_stat(Stat::Suspicion, 45);

        assert!(eval.evaluate(&spec(r#"{"trust_talia_gte": 15}"#), &state).is_satisfied());
        assert!(eval.evaluate(&spec(r#"{"trust_rook_lte": 0}"#), &state).is_satisfied());
        assert!(eval.evaluate(&spec(r#"{"suspicion_level": "watched"}"#), &state).is_satisfied());
    }

    #[test]
    fn unrecognized_keys_are_vacuous() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let result = eval.evaluate(
            &spec(r#"{"charisma_gte": 99, "moon_phase": "full"}"#),
            &PlayerState::default(),
        );
        assert!(result.is_satisfied());
    }

    #[test]
    fn authoring_mistakes_degrade() {
        let items = items();
        let eval = ConditionEvaluator::new(&items);
        let state = PlayerState::default();

        let malformed = eval.evaluate(&spec(r#"{"integrity_gte": "high"}"#), &state);
        assert!(malformed.is_satisfied());

        let unknown_tier = eval.evaluate(&spec(r#"{"suspicion_level": "sleepy"}"#), &state);
        assert_eq!(unknown_tier, ConditionResult::Excluded);
    }

    #[test]
    fn hidden_follows_exclusions_only() {
        let mut state = PlayerState::default();
        let not_flag = spec(r#"{"not_flag": "met_rook"}"#);
        let trust_lte = spec(r#"{"trust_crowe_lte": -10}"#);

        assert!(!is_hidden(&not_flag, &state));
        state.set_flag("met_rook");
        assert!(is_hidden(&not_flag, &state));

        // Fails silently but is not hidden.
        assert!(!is_hidden(&trust_lte, &state));

        let not_choice = spec(r#"{"has_flag": "zzz", "not_choice": "run"}"#);
        state.record_choice("run");
        assert!(is_hidden(&not_choice, &state));
    }
}
