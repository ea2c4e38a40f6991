//! Shatterpoint Engine: a rules engine for branching interactive fiction.
//!
//! Content (scenes, choices, items, NPCs) is authored in RON and parsed once
//! into typed structures. At runtime a [`core::engine::SceneEngine`] walks a
//! [`core::engine::GameSession`] through the scene graph: it evaluates choice
//! requirements, applies costs and effects, forces the capture ending when
//! suspicion peaks, and persists snapshots to save slots.

pub mod core;
pub mod schema;

pub use crate::core::engine::{
    Arrival, AvailableChoice, EngineError, GameSession, SceneEngine, Transition, Turn,
};
