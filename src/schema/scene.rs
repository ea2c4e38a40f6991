//! Scene and choice content: types, RON loading, and library merging.

use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::bare_some;
use super::condition::ConditionSpec;
use super::effect::{Cost, EffectSpec, EntryEffect};
use super::one_or_many::OneOrMany;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid content in '{0}': {1}")]
    Invalid(String, String),
}

/// An option offered by a scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub requires: ConditionSpec,
    #[serde(default)]
    pub cost: Cost,
    #[serde(default)]
    pub effects: EffectSpec,
    #[serde(default, deserialize_with = "bare_some")]
    pub flavor: Option<String>,
    /// Next scene id; `None` keeps the player where they are.
    #[serde(default, deserialize_with = "bare_some")]
    pub leads_to: Option<String>,
}

/// A node in the narrative graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub description: String,
    pub ambient: Vec<String>,
    pub art: Option<String>,
    pub on_enter: Vec<EntryEffect>,
    pub choices: Vec<Choice>,
}

impl Scene {
    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }

    /// A scene with no outgoing choices ends the run.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    /// Description text, with one ambient line appended `ambient_chance`
    /// of the time when the scene has any.
    pub fn narrative_text(&self, rng: &mut StdRng, ambient_chance: f64) -> String {
        let mut text = self.description.clone();
        if self.ambient.is_empty() {
            return text;
        }
        let chance = if ambient_chance.is_nan() { 0.0 } else { ambient_chance.clamp(0.0, 1.0) };
        if rng.gen_bool(chance) {
            let line = &self.ambient[rng.gen_range(0..self.ambient.len())];
            text.push_str("\n\n");
            text.push_str(line);
        }
        text
    }
}

// The RON shape keys scenes by id, so the id is injected on load.

#[derive(Debug, Deserialize)]
#[serde(rename = "Scene")]
struct RonScene {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ambient: OneOrMany<String>,
    #[serde(default, deserialize_with = "bare_some")]
    art: Option<String>,
    #[serde(default)]
    on_enter: Vec<EntryEffect>,
    #[serde(default)]
    choices: Vec<Choice>,
}

/// All scenes known to the engine, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct SceneLibrary {
    pub scenes: FxHashMap<String, Scene>,
}

impl SceneLibrary {
    /// Load a scene library from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<SceneLibrary, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a scene library from a RON string.
    pub fn parse_ron(input: &str) -> Result<SceneLibrary, ContentError> {
        let raw: FxHashMap<String, RonScene> = ron::from_str(input)?;
        let mut scenes = FxHashMap::default();

        for (id, ron_scene) in raw {
            for choice in &ron_scene.choices {
                for problem in choice.requires.problems() {
                    tracing::warn!(scene = %id, choice = %choice.id, "{}", problem);
                }
                for key in choice.cost.dropped_keys() {
                    tracing::warn!(scene = %id, choice = %choice.id, key, "cost names an unknown stat, ignored");
                }
            }
            scenes.insert(
                id.clone(),
                Scene {
                    id,
                    title: ron_scene.title,
                    description: ron_scene.description,
                    ambient: ron_scene.ambient.into_vec(),
                    art: ron_scene.art,
                    on_enter: ron_scene.on_enter,
                    choices: ron_scene.choices,
                },
            );
        }

        Ok(SceneLibrary { scenes })
    }

    /// Load every `.ron` file in a directory, later files overriding earlier ones.
    pub fn load_dir(dir: &Path) -> Result<SceneLibrary, ContentError> {
        let mut library = SceneLibrary::default();
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("ron"))
            .collect();
        paths.sort();
        for path in paths {
            library.merge(Self::load_from_ron(&path)?);
        }
        Ok(library)
    }

    /// Merge another library into this one. Scenes from `other`
    /// override scenes in `self` with the same id.
    pub fn merge(&mut self, other: SceneLibrary) {
        for (id, scene) in other.scenes {
            self.scenes.insert(id, scene);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene ids in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
