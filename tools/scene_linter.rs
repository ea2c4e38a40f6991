/// Scene Linter: validates links, item references, and requirement keys in scene content.
///
/// Usage: scene_linter <content_dir>

use shatterpoint_engine::core::engine::SceneEngine;
use shatterpoint_engine::schema::condition::Predicate;
use shatterpoint_engine::schema::effect::EntryAction;
use shatterpoint_engine::schema::scene::Scene;
use std::collections::{BTreeSet, VecDeque};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: scene_linter <content_dir>");
        process::exit(0);
    }

    let content_dir = &args[1];
    let engine = match SceneEngine::builder().content_dir(content_dir).build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: Failed to load content from '{}': {}", content_dir, e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} scenes, {} items, {} NPCs",
        engine.scenes().len(),
        engine.items().items.len(),
        engine.npcs().npcs.len()
    );

    let (errors, warnings) = lint_content(&engine);

    println!("\n=== Scene Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_content(engine: &SceneEngine) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let config = engine.config();
    let scenes = engine.scenes();

    for (role, id) in [("start", &config.start_scene), ("captured", &config.captured_scene)] {
        if !scenes.contains(id) {
            errors.push(format!("Designated {} scene '{}' does not exist", role, id));
        }
    }

    for id in scenes.ids() {
        let Some(scene) = scenes.get(id) else { continue };
        lint_scene(engine, scene, &mut errors, &mut warnings);
    }

    for id in unreachable_scenes(engine) {
        warnings.push(format!("Scene '{}' is unreachable from '{}'", id, config.start_scene));
    }

    (errors, warnings)
}

fn lint_scene(engine: &SceneEngine, scene: &Scene, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let items = engine.items();
    let known_npc = |npc: &str| engine.npcs().npcs.is_empty() || engine.npcs().get(npc).is_some();

    if scene.is_terminal() && !is_terminal_by_name(engine, &scene.id) {
        warnings.push(format!("Scene '{}' has no choices but is not an ending", scene.id));
    }

    for entry in &scene.on_enter {
        match &entry.action {
            EntryAction::GiveItem(item) if !items.contains(item) => {
                errors.push(format!("Scene '{}' on_enter gives unknown item '{}'", scene.id, item));
            }
            EntryAction::ModifyTrust { npc, .. } if !known_npc(npc.as_str()) => {
                warnings.push(format!("Scene '{}' on_enter changes trust of unknown NPC '{}'", scene.id, npc));
            }
            _ => {}
        }
    }

    let mut ids = BTreeSet::new();
    for choice in &scene.choices {
        let at = format!("{}/{}", scene.id, choice.id);

        if !ids.insert(choice.id.as_str()) {
            errors.push(format!("Choice '{}' is declared twice", at));
        }

        if let Some(next) = &choice.leads_to {
            if !engine.scenes().contains(next) {
                errors.push(format!("Choice '{}' leads to missing scene '{}'", at, next));
            }
        }

        for item in choice.effects.give_item.iter().chain(choice.effects.remove_item.iter()) {
            if !items.contains(item) {
                errors.push(format!("Choice '{}' references unknown item '{}'", at, item));
            }
        }
        for npc in choice.effects.npc_trust.keys() {
            if !known_npc(npc.as_str()) {
                warnings.push(format!("Choice '{}' changes trust of unknown NPC '{}'", at, npc));
            }
        }

        for predicate in choice.requires.predicates() {
            match predicate {
                Predicate::HasItems(required) => {
                    for item in required.iter().filter(|item| !items.contains(item)) {
                        errors.push(format!("Choice '{}' requires unknown item '{}'", at, item));
                    }
                }
                Predicate::VisitedScene(id) if !engine.scenes().contains(id) => {
                    warnings.push(format!("Choice '{}' requires a visit to missing scene '{}'", at, id));
                }
                Predicate::TrustAtLeast { npc, .. } | Predicate::TrustAtMost { npc, .. } if !known_npc(npc.as_str()) => {
                    warnings.push(format!(
                        "Choice '{}' requirement '{}' names unknown NPC '{}'",
                        at,
                        predicate.key(),
                        npc
                    ));
                }
                _ => {}
            }
        }

        for problem in choice.requires.problems() {
            warnings.push(format!("Choice '{}': {}", at, problem));
        }

        for key in choice.cost.dropped_keys() {
            warnings.push(format!("Choice '{}' cost names unknown stat '{}' (ignored)", at, key));
        }
    }
}

fn is_terminal_by_name(engine: &SceneEngine, id: &str) -> bool {
    id == engine.config().captured_scene || id.starts_with("game_over") || id.ends_with("_end")
}

/// Scenes no chain of choices can reach from the start. The captured
/// scene is reachable through the suspicion override.
fn unreachable_scenes(engine: &SceneEngine) -> Vec<String> {
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

    engine
        .scenes()
        .ids()
        .into_iter()
        .filter(|id| !seen.contains(*id))
        .map(String::from)
        .collect()
}
