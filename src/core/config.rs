//! Engine configuration: designated scenes, regeneration, and save layout.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::schema::scene::ContentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scene a new game begins in.
    pub start_scene: String,
    /// Terminal scene forced when suspicion reaches its maximum.
    pub captured_scene: String,
    /// Flag that marks a finished run; returning to the start scene
    /// while it is set resets the game.
    pub run_complete_flag: String,
    /// Resonance restored on every scene load after the first.
    pub resonance_regen: i32,
    pub inventory_capacity: usize,
    /// Probability that a scene's narration includes an ambient line.
    pub ambient_chance: f64,
    pub save_prefix: String,
    pub save_slots: Vec<String>,
    pub autosave_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_scene: "act1_scene01".to_string(),
            captured_scene: "game_over_captured".to_string(),
            run_complete_flag: "act1_complete".to_string(),
            resonance_regen: 5,
            inventory_capacity: 8,
            ambient_chance: 0.5,
            save_prefix: "shatterpoint_".to_string(),
            save_slots: vec![
                "save_1".to_string(),
                "save_2".to_string(),
                "save_3".to_string(),
            ],
            autosave_key: "autosave".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<EngineConfig, ContentError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        if !(0.0..=1.0).contains(&self.ambient_chance) {
            return Err(ContentError::Invalid(
                "config".to_string(),
                format!("ambient_chance {} is outside 0.0..=1.0", self.ambient_chance),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = EngineConfig::parse_ron(r#"(start_scene: "prologue", resonance_regen: 3)"#).unwrap();
        assert_eq!(config.start_scene, "prologue");
        assert_eq!(config.resonance_regen, 3);
        assert_eq!(config.captured_scene, "game_over_captured");
        assert_eq!(config.inventory_capacity, 8);
        assert_eq!(config.save_slots.len(), 3);
    }

    #[test]
    fn rejects_bad_ambient_chance() {
        assert!(EngineConfig::parse_ron("(ambient_chance: 1.5)").is_err());

        let config = EngineConfig {
            ambient_chance: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
