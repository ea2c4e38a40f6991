//! WASM bindings for shatterpoint-engine: a browser-facing game session.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use wasm_bindgen::prelude::*;

use shatterpoint_engine::core::config::EngineConfig;
use shatterpoint_engine::core::engine::{Arrival, GameSession, SceneEngine};
use shatterpoint_engine::core::persistence::Snapshot;
use shatterpoint_engine::core::state::PlayerState;
use shatterpoint_engine::schema::catalog::{ItemCatalog, NpcCatalog};
use shatterpoint_engine::schema::scene::SceneLibrary;
use shatterpoint_engine::schema::stat::{DegradationLevel, Stat};

// ---------------------------------------------------------------------------
// Embedded content, compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const SCENES: &str = include_str!("../../content/shatterpoint/scenes/act1.ron");
    pub const ITEMS: &str = include_str!("../../content/shatterpoint/items.ron");
    pub const NPCS: &str = include_str!("../../content/shatterpoint/npcs.ron");
    pub const CONFIG: &str = include_str!("../../content/shatterpoint/config.ron");
}

// There is no system clock on wasm32; the host passes the time in.
static NOW_MS: AtomicU64 = AtomicU64::new(0);

fn host_clock() -> u64 {
    NOW_MS.load(Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct StatView {
    key: &'static str,
    label: &'static str,
    value: i32,
    max: i32,
}

#[derive(serde::Serialize)]
struct ChoiceView {
    id: String,
    text: String,
    available: bool,
    reason: Option<String>,
}

#[derive(serde::Serialize)]
struct SceneView {
    id: String,
    title: String,
    text: String,
    art: Option<String>,
    terminal: bool,
    stats: Vec<StatView>,
    suspicion_tier: &'static str,
    degradation: DegradationLevel,
    inventory: Vec<String>,
    turn: u32,
    choices: Vec<ChoiceView>,
}

#[derive(serde::Serialize)]
struct TurnView {
    choice_text: String,
    flavor: Option<String>,
    captured: bool,
    restarted: bool,
    scene_changed: bool,
}

// ---------------------------------------------------------------------------
// ShatterpointGame, the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct ShatterpointGame {
    engine: SceneEngine,
    session: GameSession,
    rng: StdRng,
}

#[wasm_bindgen]
impl ShatterpointGame {
    /// Create a game over the embedded content.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<ShatterpointGame, JsError> {
        let scenes = SceneLibrary::parse_ron(data::SCENES)
            .map_err(|e| JsError::new(&format!("Scene parse error: {e}")))?;
        let items = ItemCatalog::parse_ron(data::ITEMS)
            .map_err(|e| JsError::new(&format!("Item parse error: {e}")))?;
        let npcs = NpcCatalog::parse_ron(data::NPCS)
            .map_err(|e| JsError::new(&format!("NPC parse error: {e}")))?;
        let config = EngineConfig::parse_ron(data::CONFIG)
            .map_err(|e| JsError::new(&format!("Config parse error: {e}")))?;

        let engine = SceneEngine::builder()
            .with_scenes(scenes)
            .with_items(items)
            .with_npcs(npcs)
            .with_config(config)
            .with_clock(host_clock)
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;

        let session = engine.new_session();
        Ok(ShatterpointGame {
            engine,
            session,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Set the host time (milliseconds since the Unix epoch) used for save timestamps.
    pub fn set_time(&self, now_ms: f64) {
        NOW_MS.store(now_ms.max(0.0) as u64, Ordering::Relaxed);
    }

    /// Begin a new run at the start scene.
    pub fn start(&mut self) -> Result<(), JsError> {
        self.session = self.engine.new_session();
        self.engine
            .start(&mut self.session)
            .map(|_| ())
            .map_err(|e| JsError::new(&format!("Start error: {e}")))
    }

    /// The current scene, stats, and choices as JSON.
    pub fn view(&mut self) -> Result<String, JsError> {
        let view = self.scene_view()?;
        serde_json::to_string(&view)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Execute a choice. Returns the turn as JSON, or `null` if the choice was rejected.
    pub fn choose(&mut self, choice_id: &str) -> Result<String, JsError> {
        let turn = self
            .engine
            .choose(&mut self.session, choice_id)
            .map_err(|e| JsError::new(&format!("Navigation error: {e}")))?;

        let view = turn.map(|turn| TurnView {
            restarted: turn.arrival == Some(Arrival::Restarted),
            scene_changed: turn.arrival.is_some(),
            choice_text: turn.transition.choice_text,
            flavor: turn.transition.flavor,
            captured: turn.captured,
        });

        // A finished run starts over straight away.
        if matches!(view, Some(TurnView { restarted: true, .. })) {
            self.start()?;
        }

        serde_json::to_string(&view)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    pub fn save(&self, slot: &str) -> bool {
        self.engine.save(&self.session, slot)
    }

    /// Load a slot and re-enter its scene. Returns false if the slot is empty.
    pub fn load(&mut self, slot: &str) -> Result<bool, JsError> {
        let Some(mut session) = self.engine.load(slot) else {
            return Ok(false);
        };
        self.engine
            .resume(&mut session)
            .map_err(|e| JsError::new(&format!("Load error: {e}")))?;
        self.session = session;
        Ok(true)
    }

    /// Slot names with their save info (or null) as JSON.
    pub fn slots(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.engine.all_slot_info())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// The player state as a snapshot JSON blob, for host-side storage.
    pub fn export_state(&self) -> Result<String, JsError> {
        self.session
            .state()
            .snapshot()
            .to_json()
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Replace the player state from a snapshot blob and re-enter its scene.
    pub fn import_state(&mut self, json: &str) -> Result<(), JsError> {
        let snapshot = Snapshot::from_json(json)
            .map_err(|e| JsError::new(&format!("Invalid snapshot JSON: {e}")))?;
        let mut session =
            GameSession::from_state(PlayerState::restore(snapshot, self.engine.config()));
        self.engine
            .resume(&mut session)
            .map_err(|e| JsError::new(&format!("Load error: {e}")))?;
        self.session = session;
        Ok(())
    }
}

impl ShatterpointGame {
    fn scene_view(&mut self) -> Result<SceneView, JsError> {
        let scene = self
            .session
            .active_scene()
            .and_then(|id| self.engine.scene(id))
            .ok_or_else(|| JsError::new("No scene loaded; call start() first"))?;

        let state = self.session.state();
        let stats = Stat::ALL
            .iter()
            .map(|stat| StatView {
                key: stat.key(),
                label: stat.label(),
                value: state.stat(*stat),
                max: state.stat_max(*stat),
            })
            .collect();
        let choices = self
            .engine
            .available_choices(&self.session)
            .into_iter()
            .map(|offered| ChoiceView {
                id: offered.choice.id.clone(),
                text: offered.choice.text.clone(),
                available: offered.available,
                reason: offered.reason,
            })
            .collect();

        Ok(SceneView {
            id: scene.id.clone(),
            title: scene.title.clone(),
            text: self.engine.narrative_text(scene, &mut self.rng),
            art: scene.art.clone(),
            terminal: scene.is_terminal(),
            stats,
            suspicion_tier: state.suspicion_tier().name(),
            degradation: state.degradation_level(),
            inventory: state
                .inventory()
                .iter()
                .map(|item| self.engine.items().display_name(item).to_string())
                .collect(),
            turn: state.turn_count(),
            choices,
        })
    }
}
