/// Walkthrough example: a scripted run through the bundled Shatterpoint act.
///
/// Plays a fixed sequence of choices from the briefing to the end of act one,
/// printing narration, flavor text, and the stat line after each scene, then
/// shows the new-game-plus reset.
///
/// Run with: cargo run --example walkthrough

use rand::rngs::StdRng;
use rand::SeedableRng;
use shatterpoint_engine::core::engine::{Arrival, GameSession, SceneEngine};
use shatterpoint_engine::schema::scene::Scene;
use shatterpoint_engine::schema::stat::Stat;

fn main() {
    let engine = SceneEngine::builder()
        .content_dir("content/shatterpoint")
        .build()
        .expect("Failed to load Shatterpoint content");

    let mut rng = StdRng::seed_from_u64(2077);
    let mut session = engine.new_session();

    let arrival = engine.start(&mut session).expect("Start scene missing");
    narrate(&engine, &session, arrival.scene(), &mut rng);

    let script = [
        "ask_about_voss",
        "accept_case",
        "scan_room",
        "pocket_datakey",
        "copy_logs",
        "leave_penthouse",
        "comfort_talia",
        "ask_journal",
        "mention_echo",
        "head_down",
        "buy_quiet",
        "use_quiet",
        "ask_null",
        "return_to_bureau",
        "confront_crowe",
    ];

    for choice_id in script {
        let turn = match engine.choose(&mut session, choice_id) {
            Ok(Some(turn)) => turn,
            Ok(None) => {
                println!("  (choice '{}' was not available)", choice_id);
                continue;
            }
            Err(e) => {
                println!("  error: {}", e);
                break;
            }
        };

        println!("> {}", turn.transition.choice_text);
        if let Some(flavor) = &turn.transition.flavor {
            println!("  {}", flavor);
        }
        if turn.captured {
            println!("\n  ** Suspicion peaked. The Bureau closes in. **");
        }
        if let Some(arrival) = turn.arrival {
            narrate(&engine, &session, arrival.scene(), &mut rng);
        }
    }

    println!("\n--- Journal ---");
    for entry in session.state().journal() {
        println!("  [{:>2}] {}: {}", entry.turn, entry.scene, entry.text);
    }

    println!("\n--- Inventory ---");
    for item in session.state().inventory() {
        println!("  {}", engine.items().display_name(item));
    }

    // Returning to the briefing after the act is complete starts over.
    if let Ok(Some(turn)) = engine.choose(&mut session, "begin_again") {
        if turn.arrival == Some(Arrival::Restarted) {
            println!("\n--- New game ---");
            println!("  turn {}, {} items", session.state().turn_count(), session.state().inventory().len());
        }
    }
}

fn narrate(engine: &SceneEngine, session: &GameSession, scene: Option<&Scene>, rng: &mut StdRng) {
    let Some(scene) = scene else { return };
    let state = session.state();

    println!("\n=== {} ===", scene.title);
    println!("{}", engine.narrative_text(scene, rng));
    println!(
        "  [Resonance {} | Suspicion {} ({}) | Quiet {} | Integrity {}]\n",
        state.stat(Stat::Resonance),
        state.stat(Stat::Suspicion),
        state.suspicion_tier().name(),
        state.stat(Stat::QuietLevel),
        state.stat(Stat::Integrity),
    );

    for offered in engine.available_choices(session) {
        let marker = if offered.available { " " } else { "x" };
        match offered.reason {
            Some(reason) => println!("  [{}] {} ({})", marker, offered.choice.text, reason),
            None => println!("  [{}] {}", marker, offered.choice.text),
        }
    }
}
