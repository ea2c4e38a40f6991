//! Content tests: the bundled Shatterpoint act loads, links up, and plays through.

use shatterpoint_engine::core::engine::{Arrival, SceneEngine};
use shatterpoint_engine::schema::condition::Predicate;
use shatterpoint_engine::schema::stat::Stat;
use std::collections::{BTreeSet, VecDeque};

fn engine() -> SceneEngine {
    SceneEngine::builder()
        .content_dir("content/shatterpoint")
        .build()
        .unwrap()
}

#[test]
fn bundled_content_loads() {
    let engine = engine();
    assert!(engine.scenes().len() >= 7);
    assert_eq!(engine.items().items.len(), 11);
    assert_eq!(engine.npcs().roster(), vec!["crowe", "rennick", "rook", "talia", "thane"]);
    assert_eq!(engine.config().start_scene, "act1_scene01");
}

#[test]
fn every_link_resolves() {
    let engine = engine();
    let config = engine.config();
    assert!(engine.scenes().contains(&config.start_scene));
    assert!(engine.scenes().contains(&config.captured_scene));

    for scene in engine.scenes().scenes.values() {
        for choice in &scene.choices {
            if let Some(next) = &choice.leads_to {
                assert!(engine.scenes().contains(next), "{}/{} -> {}", scene.id, choice.id, next);
            }
        }
    }
}

#[test]
fn every_item_reference_is_defined() {
    let engine = engine();
    for scene in engine.scenes().scenes.values() {
        for choice in &scene.choices {
            let granted = choice.effects.give_item.iter().chain(choice.effects.remove_item.iter());
            let required = choice.requires.predicates().iter().flat_map(|p| match p {
                Predicate::HasItems(items) => items.as_slice(),
                _ => &[][..],
            });
            for item in granted.chain(required) {
                assert!(engine.items().contains(item), "{}/{}: {}", scene.id, choice.id, item);
            }
            assert_eq!(choice.requires.problems().count(), 0, "{}/{}", scene.id, choice.id);
            assert!(choice.cost.dropped_keys().is_empty());
        }
    }
}

#[test]
fn every_scene_is_reachable() {
    let engine = engine();
    let config = engine.config();

    let mut seen = BTreeSet::from([config.start_scene.clone(), config.captured_scene.clone()]);
    let mut queue = VecDeque::from([config.start_scene.clone()]);
    while let Some(id) = queue.pop_front() {
        let Some(scene) = engine.scene(&id) else { continue };
        for next in scene.choices.iter().filter_map(|c| c.leads_to.clone()) {
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }

    let all: BTreeSet<String> = engine.scenes().ids().into_iter().map(String::from).collect();
    assert_eq!(seen, all);
}

#[test]
fn scripted_playthrough_reaches_the_end() {
    let engine = engine();
    let mut session = engine.new_session();
    engine.start(&mut session).unwrap();

    let script = [
        "accept_case",
        "scan_room",
        "leave_penthouse",
        "comfort_talia",
        "ask_journal",
        "mention_echo",
        "head_down",
        "buy_quiet",
        "use_quiet",
        "ask_null",
        "return_to_bureau",
        "bluff_rennick",
    ];
    for choice in script {
        let turn = engine.choose(&mut session, choice).unwrap();
        assert!(turn.is_some(), "choice {} was rejected", choice);
        assert!(!turn.unwrap().captured);
    }

    let state = session.state();
    assert_eq!(session.active_scene(), Some("act1_end"));
    assert!(state.has_flag("act1_complete"));
    assert!(state.has_flag("knows_null_freq"));
    assert!(state.has_item("voss_journal"));
    assert!(!state.has_item("quiet_injector"));
    assert_eq!(state.trust("talia"), 20);
    assert_eq!(state.trust("thane"), 5);
    assert_eq!(state.stat(Stat::QuietLevel), 35);
    assert_eq!(state.turn_count(), 6);

    let turn = engine.choose(&mut session, "begin_again").unwrap().unwrap();
    assert_eq!(turn.arrival, Some(Arrival::Restarted));
    assert_eq!(session, engine.new_session());
}

#[test]
fn reading_crowe_is_a_one_time_risk() {
    let engine = engine();
    let mut session = engine.new_session();
    engine.start(&mut session).unwrap();

    engine.choose(&mut session, "read_crowe").unwrap().unwrap();
    let state = session.state();
    assert_eq!(state.stat(Stat::Resonance), 45);
    assert_eq!(state.stat(Stat::Suspicion), 15);
    assert!(state.has_item("crowe_memo"));
    assert_eq!(state.trust("crowe"), -10);

    let offered: Vec<String> = engine
        .available_choices(&session)
        .iter()
        .map(|c| c.choice.id.clone())
        .collect();
    assert!(!offered.contains(&"read_crowe".to_string()));
}
