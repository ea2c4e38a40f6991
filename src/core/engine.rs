//! The scene graph engine: loads scenes, lists and executes choices,
//! and resolves where the player goes next.
//!
//! The engine owns immutable content and the save slots. All per-game
//! state lives in a [`GameSession`] passed to each call, so one engine can
//! drive any number of sessions.

use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::conditions::{is_hidden, ConditionEvaluator};
use crate::core::config::EngineConfig;
use crate::core::effects::{apply_cost, apply_effects};
use crate::core::persistence::{
    MemoryStore, PersistenceError, SaveRecord, SaveSlots, SaveStore, SlotInfo,
};
use crate::core::state::PlayerState;
use crate::schema::catalog::{ItemCatalog, NpcCatalog};
use crate::schema::effect::Cost;
use crate::schema::scene::{Choice, ContentError, Scene, SceneLibrary};
use crate::schema::stat::Stat;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("scene not found: {0}")]
    SceneNotFound(String),
    #[error("content error: {0}")]
    Content(#[from] ContentError),
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Everything that belongs to one playthrough.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    state: PlayerState,
    /// Scene most recently loaded; `None` before the first load and after a restart.
    active_scene: Option<String>,
}

impl GameSession {
    pub fn from_state(state: PlayerState) -> Self {
        Self {
            state,
            active_scene: None,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PlayerState {
        &mut self.state
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.active_scene.as_deref()
    }
}

/// A choice as presented to the player.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailableChoice<'a> {
    pub choice: &'a Choice,
    pub available: bool,
    /// Why the choice is disabled, when there is something to say.
    pub reason: Option<String>,
}

/// Result of a successfully executed choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub flavor: Option<String>,
    pub next_scene: Option<String>,
    pub choice_text: String,
}

/// What happened when moving to a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum Arrival<'a> {
    Entered(&'a Scene),
    /// The run was complete and the player returned to the start: the
    /// session was reset and no scene is loaded.
    Restarted,
}

impl<'a> Arrival<'a> {
    pub fn scene(&self) -> Option<&'a Scene> {
        match self {
            Arrival::Entered(scene) => Some(*scene),
            Arrival::Restarted => None,
        }
    }
}

/// One full step of play: the executed choice and where it led.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn<'a> {
    pub transition: Transition,
    /// `None` when the choice kept the player in the current scene.
    pub arrival: Option<Arrival<'a>>,
    /// The capture override sent the player to the captured scene, either
    /// instead of the choice's destination or on entering it.
    pub captured: bool,
}

/// The top-level scene engine. Built via `SceneEngine::builder()`.
#[derive(Debug)]
pub struct SceneEngine {
    scenes: SceneLibrary,
    items: ItemCatalog,
    npcs: NpcCatalog,
    config: EngineConfig,
    saves: SaveSlots,
}

/// Builder for constructing a `SceneEngine`.
pub struct SceneEngineBuilder {
    scenes_dir: Option<PathBuf>,
    scene_files: Vec<PathBuf>,
    items_file: Option<PathBuf>,
    npcs_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    /// Directly provided content (for testing without files).
    scenes: Option<SceneLibrary>,
    items: Option<ItemCatalog>,
    npcs: Option<NpcCatalog>,
    config: Option<EngineConfig>,
    store: Option<Box<dyn SaveStore>>,
    clock: Option<fn() -> u64>,
}

impl SceneEngine {
    pub fn builder() -> SceneEngineBuilder {
        SceneEngineBuilder {
            scenes_dir: None,
            scene_files: Vec::new(),
            items_file: None,
            npcs_file: None,
            config_file: None,
            scenes: None,
            items: None,
            npcs: None,
            config: None,
            store: None,
            clock: None,
        }
    }

    pub fn scenes(&self) -> &SceneLibrary {
        &self.scenes
    }

    pub fn items(&self) -> &ItemCatalog {
        &self.items
    }

    pub fn npcs(&self) -> &NpcCatalog {
        &self.npcs
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn evaluator(&self) -> ConditionEvaluator<'_> {
        ConditionEvaluator::new(&self.items)
    }

    /// A fresh session positioned at the start scene, not yet loaded.
    pub fn new_session(&self) -> GameSession {
        GameSession::from_state(PlayerState::new(&self.config, &self.npcs.roster()))
    }

    /// Enter a scene.
    ///
    /// An unknown id fails before anything is mutated. Otherwise the load
    /// counts as a turn, marks the scene visited, runs its entry actions
    /// (first-visit-only actions just once), regenerates resonance on
    /// every load after the first, and autosaves.
    pub fn load_scene(&self, session: &mut GameSession, scene_id: &str) -> Result<&Scene, EngineError> {
        let Some(scene) = self.scenes.get(scene_id) else {
            tracing::warn!(scene = scene_id, "scene not found");
            return Err(EngineError::SceneNotFound(scene_id.to_string()));
        };

        let state = &mut session.state;
        state.begin_turn(scene_id);
        let first_visit = state.visit_scene(scene_id);

        for entry in &scene.on_enter {
            if entry.first_visit_only && !first_visit {
                continue;
            }
            apply_effects(&entry.action.to_effect(), state);
        }

        if state.turn_count() > 1 {
            state.regen_resonance(self.config.resonance_regen);
        }

        session.active_scene = Some(scene_id.to_string());
        tracing::debug!(
            scene = scene_id,
            turn = session.state.turn_count(),
            first_visit,
            "scene loaded"
        );

        self.saves.autosave(session.state.snapshot(), &scene.title);
        Ok(scene)
    }

    /// The active scene's choices in declared order, hidden ones removed.
    pub fn available_choices(&self, session: &GameSession) -> Vec<AvailableChoice<'_>> {
        let Some(scene) = session.active_scene().and_then(|id| self.scenes.get(id)) else {
            return Vec::new();
        };

        let evaluator = self.evaluator();
        let state = &session.state;

        scene
            .choices
            .iter()
            .filter(|choice| !is_hidden(&choice.requires, state))
            .map(|choice| {
                let condition = evaluator.evaluate(&choice.requires, state);
                let shortfall = cost_shortfall(&choice.cost, state);
                AvailableChoice {
                    choice,
                    available: condition.is_satisfied() && shortfall.is_none(),
                    reason: condition.reason().map(str::to_string).or(shortfall),
                }
            })
            .collect()
    }

    /// Execute a choice from the active scene.
    ///
    /// Availability is recomputed from the current state; a choice that is
    /// unknown, hidden, or unavailable is rejected with `None` and nothing
    /// changes.
    pub fn execute_choice(&self, session: &mut GameSession, choice_id: &str) -> Option<Transition> {
        let choice = match self
            .available_choices(session)
            .into_iter()
            .find(|offered| offered.choice.id == choice_id)
        {
            Some(offered) if offered.available => offered.choice,
            Some(offered) => {
                tracing::warn!(
                    choice = choice_id,
                    reason = offered.reason.as_deref().unwrap_or("requirements not met"),
                    "choice rejected"
                );
                return None;
            }
            None => {
                tracing::warn!(choice = choice_id, "choice not offered in this scene");
                return None;
            }
        };

        let state = &mut session.state;
        state.record_choice(choice_id);
        apply_cost(&choice.cost, state);
        apply_effects(&choice.effects, state);
        tracing::debug!(choice = choice_id, next = ?choice.leads_to, "choice executed");

        Some(Transition {
            flavor: choice.flavor.clone(),
            next_scene: choice.leads_to.clone(),
            choice_text: choice.text.clone(),
        })
    }

    /// The scene the player must be sent to regardless of their choice.
    pub fn forced_destination(&self, session: &GameSession) -> Option<&str> {
        if session.state.is_maxed(Stat::Suspicion) {
            Some(&self.config.captured_scene)
        } else {
            None
        }
    }

    /// Where a transition actually leads once the capture override applies.
    pub fn destination_after(&self, session: &GameSession, transition: &Transition) -> Option<String> {
        self.forced_destination(session)
            .map(str::to_string)
            .or_else(|| transition.next_scene.clone())
    }

    /// Move to a scene, honouring the new-game-plus reset: returning to
    /// the start scene with the run-complete flag set resets the session
    /// instead of loading.
    pub fn transition_to(&self, session: &mut GameSession, scene_id: &str) -> Result<Arrival<'_>, EngineError> {
        if scene_id == self.config.start_scene && session.state.has_flag(&self.config.run_complete_flag) {
            tracing::info!("run complete; starting over");
            *session = self.new_session();
            return Ok(Arrival::Restarted);
        }
        self.load_scene(session, scene_id).map(Arrival::Entered)
    }

    /// Move to a scene, then to the captured scene if entering it maxed
    /// suspicion. The flag is true when the override fired.
    fn enter(&self, session: &mut GameSession, scene_id: &str) -> Result<(Arrival<'_>, bool), EngineError> {
        let arrival = self.transition_to(session, scene_id)?;
        if arrival == Arrival::Restarted {
            return Ok((arrival, false));
        }
        match self.forced_destination(session) {
            Some(captured) if session.active_scene() != Some(captured) => {
                tracing::info!(scene = scene_id, "suspicion maxed on entry; captured");
                Ok((self.transition_to(session, captured)?, true))
            }
            _ => Ok((arrival, false)),
        }
    }

    /// Load the start scene.
    pub fn start(&self, session: &mut GameSession) -> Result<Arrival<'_>, EngineError> {
        let start = self.config.start_scene.clone();
        self.enter(session, &start).map(|(arrival, _)| arrival)
    }

    /// Re-enter the scene recorded in the session's state, e.g. after loading a save.
    pub fn resume(&self, session: &mut GameSession) -> Result<Arrival<'_>, EngineError> {
        let current = session.state.current_scene().to_string();
        self.enter(session, &current).map(|(arrival, _)| arrival)
    }

    /// Execute a choice and follow it to its destination.
    ///
    /// Returns `Ok(None)` if the choice was rejected.
    pub fn choose(&self, session: &mut GameSession, choice_id: &str) -> Result<Option<Turn<'_>>, EngineError> {
        let Some(transition) = self.execute_choice(session, choice_id) else {
            return Ok(None);
        };

        let mut captured = self.forced_destination(session).is_some();
        let arrival = match self.destination_after(session, &transition) {
            Some(next) => {
                let (arrival, forced) = self.enter(session, &next)?;
                captured |= forced;
                Some(arrival)
            }
            None => None,
        };

        Ok(Some(Turn {
            transition,
            arrival,
            captured,
        }))
    }

    /// Scene description with an occasional ambient line.
    pub fn narrative_text(&self, scene: &Scene, rng: &mut StdRng) -> String {
        scene.narrative_text(rng, self.config.ambient_chance)
    }

    // --- saves ---

    fn scene_name(&self, session: &GameSession) -> &str {
        self.scenes
            .get(session.state.current_scene())
            .map(|scene| scene.title.as_str())
            .unwrap_or("Unknown")
    }

    pub fn save(&self, session: &GameSession, slot: &str) -> bool {
        self.saves
            .save_slot(slot, session.state.snapshot(), self.scene_name(session))
    }

    /// Restore a session from a slot. Call [`SceneEngine::resume`] to enter its scene.
    pub fn load(&self, slot: &str) -> Option<GameSession> {
        self.saves.load_slot(slot).map(|record| self.session_from(record))
    }

    pub fn load_autosave(&self) -> Option<GameSession> {
        self.saves.load_autosave().map(|record| self.session_from(record))
    }

    fn session_from(&self, record: SaveRecord) -> GameSession {
        GameSession::from_state(PlayerState::restore(record.state, &self.config))
    }

    pub fn slot_info(&self, slot: &str) -> Option<SlotInfo> {
        self.saves.slot_info(slot)
    }

    pub fn all_slot_info(&self) -> Vec<(String, Option<SlotInfo>)> {
        self.saves.all_slot_info()
    }

    pub fn delete_slot(&self, slot: &str) -> bool {
        self.saves.delete_slot(slot)
    }
}

/// "Not enough {Stat}" if any negative cost would take its stat below zero.
/// With several shortfalls the last one in declared order is reported.
fn cost_shortfall(cost: &Cost, state: &PlayerState) -> Option<String> {
    cost.entries()
        .iter()
        .filter(|(stat, delta)| *delta < 0 && state.stat(*stat) + delta < 0)
        .last()
        .map(|(stat, _)| format!("Not enough {}", stat.label()))
}

impl SceneEngineBuilder {
    /// Load every `.ron` file in a directory as scenes.
    pub fn scenes_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.scenes_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load a single scenes file. May be called repeatedly; later files override earlier ones.
    pub fn scenes_file(mut self, path: impl AsRef<Path>) -> Self {
        self.scene_files.push(path.as_ref().to_path_buf());
        self
    }

    pub fn items_file(mut self, path: impl AsRef<Path>) -> Self {
        self.items_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn npcs_file(mut self, path: impl AsRef<Path>) -> Self {
        self.npcs_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use the standard content layout: `scenes/`, plus `items.ron`,
    /// `npcs.ron`, and `config.ron` where present.
    pub fn content_dir(mut self, path: impl AsRef<Path>) -> Self {
        let dir = path.as_ref();
        self.scenes_dir = Some(dir.join("scenes"));
        for (name, slot) in [
            ("items.ron", &mut self.items_file),
            ("npcs.ron", &mut self.npcs_file),
            ("config.ron", &mut self.config_file),
        ] {
            let file = dir.join(name);
            if file.exists() {
                *slot = Some(file);
            }
        }
        self
    }

    /// Provide scenes directly (for testing without files).
    pub fn with_scenes(mut self, scenes: SceneLibrary) -> Self {
        self.scenes = Some(scenes);
        self
    }

    /// Provide items directly (for testing without files).
    pub fn with_items(mut self, items: ItemCatalog) -> Self {
        self.items = Some(items);
        self
    }

    /// Provide NPCs directly (for testing without files).
    pub fn with_npcs(mut self, npcs: NpcCatalog) -> Self {
        self.npcs = Some(npcs);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Save backend. Defaults to an in-memory store.
    pub fn with_store(mut self, store: impl SaveStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Timestamp source for saves, in milliseconds since the Unix epoch.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<SceneEngine, EngineError> {
        let config = match self.config_file {
            Some(ref path) => EngineConfig::load_from_ron(path)?,
            None => self.config.unwrap_or_default(),
        };
        config.validate()?;

        let mut scenes = self.scenes.unwrap_or_default();
        if let Some(ref dir) = self.scenes_dir {
            scenes.merge(SceneLibrary::load_dir(dir)?);
        }
        for path in &self.scene_files {
            scenes.merge(SceneLibrary::load_from_ron(path)?);
        }

        let items = match self.items_file {
            Some(ref path) => ItemCatalog::load_from_ron(path)?,
            None => self.items.unwrap_or_default(),
        };
        let npcs = match self.npcs_file {
            Some(ref path) => NpcCatalog::load_from_ron(path)?,
            None => self.npcs.unwrap_or_default(),
        };

        let store = self.store.unwrap_or_else(|| Box::new(MemoryStore::new()));
        let mut saves = SaveSlots::new(store, &config);
        if let Some(clock) = self.clock {
            saves = saves.with_clock(clock);
        }

        tracing::debug!(
            scenes = scenes.len(),
            items = items.items.len(),
            npcs = npcs.npcs.len(),
            "engine built"
        );

        Ok(SceneEngine {
            scenes,
            items,
            npcs,
            config,
            saves,
        })
    }
}
