/// Play: interactive terminal player for scene content.
///
/// Usage: play --content <dir> [--seed <n>] [--saves <dir>]
///
/// Commands:
///   <n>            pick the numbered choice
///   journal        show journal entries
///   inv            show inventory and trust
///   save <slot>    save to a slot (save_1, save_2, save_3)
///   load <slot>    load a slot ("autosave" for the last scene)
///   slots          list save slots
///   help           list commands
///   quit           exit

use rand::rngs::StdRng;
use rand::SeedableRng;
use shatterpoint_engine::core::engine::{Arrival, GameSession, SceneEngine};
use shatterpoint_engine::core::persistence::DirStore;
use shatterpoint_engine::schema::stat::Stat;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut content_dir = None;
    let mut saves_dir = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--content" if i + 1 < args.len() => {
                i += 1;
                content_dir = Some(args[i].clone());
            }
            "--saves" if i + 1 < args.len() => {
                i += 1;
                saves_dir = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let Some(content_dir) = content_dir else {
        eprintln!("ERROR: --content is required");
        print_usage();
        std::process::exit(1);
    };

    let mut builder = SceneEngine::builder().content_dir(&content_dir);
    if let Some(ref dir) = saves_dir {
        builder = builder.with_store(DirStore::new(dir));
    }
    let engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: Failed to load content from '{}': {}", content_dir, e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} scenes", engine.scenes().len());
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut session = engine.new_session();
    enter(&engine, &mut session, Arrival::Restarted, &mut rng, true);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "journal" | "j" => {
                let journal = session.state().journal();
                if journal.is_empty() {
                    println!("  (journal is empty)");
                }
                for entry in journal {
                    println!("  [turn {:>3}] {}", entry.turn, entry.text);
                }
            }
            "inv" | "i" => print_inventory(&engine, &session),
            "save" => {
                let Some(slot) = parts.get(1) else {
                    println!("Usage: save <slot>");
                    continue;
                };
                if engine.save(&session, slot) {
                    println!("Saved to {}.", slot);
                } else {
                    println!("Save failed.");
                }
            }
            "load" => {
                let Some(slot) = parts.get(1) else {
                    println!("Usage: load <slot>");
                    continue;
                };
                match engine.load(slot) {
                    Some(mut loaded) => match engine.resume(&mut loaded) {
                        Ok(arrival) => {
                            session = loaded;
                            enter(&engine, &mut session, arrival, &mut rng, false);
                        }
                        Err(e) => println!("ERROR: {}", e),
                    },
                    None => println!("Slot '{}' is empty.", slot),
                }
            }
            "slots" => {
                for (slot, info) in engine.all_slot_info() {
                    match info {
                        Some(info) => println!("  {:<10} {} (t={})", slot, info.scene_name, info.timestamp),
                        None => println!("  {:<10} (empty)", slot),
                    }
                }
            }
            "look" | "l" => show_scene(&engine, &session, &mut rng),
            _ => {
                let Ok(n) = cmd.parse::<usize>() else {
                    println!("Unknown command: {}. Type 'help' for commands.", cmd);
                    continue;
                };
                let choices = engine.available_choices(&session);
                let Some(picked) = n.checked_sub(1).and_then(|idx| choices.get(idx)) else {
                    println!("No choice {}.", n);
                    continue;
                };
                if let Some(reason) = picked.reason.as_deref().filter(|_| !picked.available) {
                    println!("  [locked] {}", reason);
                    continue;
                }
                let id = picked.choice.id.clone();

                match engine.choose(&mut session, &id) {
                    Ok(Some(turn)) => {
                        if let Some(flavor) = &turn.transition.flavor {
                            println!("\n{}", flavor);
                        }
                        if turn.captured {
                            println!("\nThe Bureau has you.");
                        }
                        match turn.arrival {
                            Some(arrival) => enter(&engine, &mut session, arrival, &mut rng, false),
                            None => print_choices(&engine, &session),
                        }
                    }
                    Ok(None) => println!("You can't do that right now."),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
        }
    }
}

/// Show a newly entered scene, starting a fresh run after a restart.
fn enter(engine: &SceneEngine, session: &mut GameSession, arrival: Arrival<'_>, rng: &mut StdRng, first: bool) {
    if arrival == Arrival::Restarted {
        if !first {
            println!("\n=== The run is over. A new one begins. ===");
        }
        if let Err(e) = engine.start(session) {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
    show_scene(engine, session, rng);
}

fn show_scene(engine: &SceneEngine, session: &GameSession, rng: &mut StdRng) {
    let Some(scene) = session.active_scene().and_then(|id| engine.scene(id)) else {
        return;
    };

    println!("\n=== {} ===\n", scene.title);
    println!("{}\n", engine.narrative_text(scene, rng));
    print_stats(session);

    if scene.is_terminal() {
        println!("\n-- THE END -- (load a save or quit)");
    } else {
        print_choices(engine, session);
    }
}

fn print_stats(session: &GameSession) {
    let state = session.state();
    let stats: Vec<String> = Stat::ALL
        .iter()
        .map(|stat| format!("{} {}/{}", stat.label(), state.stat(*stat), state.stat_max(*stat)))
        .collect();
    println!(
        "[{}] [{}] [turn {}]",
        stats.join(" | "),
        state.suspicion_tier().name(),
        state.turn_count()
    );
}

fn print_choices(engine: &SceneEngine, session: &GameSession) {
    for (i, offered) in engine.available_choices(session).iter().enumerate() {
        match (&offered.reason, offered.available) {
            (_, true) => println!("  {}. {}", i + 1, offered.choice.text),
            (Some(reason), false) => println!("  {}. {} [{}]", i + 1, offered.choice.text, reason),
            (None, false) => println!("  {}. {} [unavailable]", i + 1, offered.choice.text),
        }
    }
}

fn print_inventory(engine: &SceneEngine, session: &GameSession) {
    let state = session.state();
    println!(
        "  Inventory ({}/{}):",
        state.inventory().len(),
        state.inventory_capacity()
    );
    for item in state.inventory() {
        let description = engine
            .items()
            .get(item)
            .map(|def| def.description.as_str())
            .unwrap_or("");
        println!("    {}: {}", engine.items().display_name(item), description);
    }

    let mut trust: Vec<(&String, &i32)> = state.npc_trust().iter().collect();
    trust.sort();
    println!("  Trust:");
    for (npc, value) in trust {
        let name = engine.npcs().get(npc).map(|def| def.name.as_str()).unwrap_or(npc);
        println!("    {:<24} {:+}", name, value);
    }
}

fn print_usage() {
    println!("Usage: play --content <dir> [--seed <n>] [--saves <dir>]");
}

fn print_help() {
    println!("Commands:");
    println!("  <n>            pick the numbered choice");
    println!("  look           redisplay the current scene");
    println!("  journal        show journal entries");
    println!("  inv            show inventory and trust");
    println!("  save <slot>    save to a slot");
    println!("  load <slot>    load a slot ('autosave' for the last scene)");
    println!("  slots          list save slots");
    println!("  quit           exit");
}
