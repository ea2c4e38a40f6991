use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::scene::ContentError;

/// An inventory item definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Item")]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Item definitions keyed by item id.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    pub items: FxHashMap<String, ItemDef>,
}

impl ItemCatalog {
    pub fn load_from_ron(path: &Path) -> Result<ItemCatalog, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<ItemCatalog, ContentError> {
        Ok(ItemCatalog {
            items: ron::from_str(input)?,
        })
    }

    pub fn get(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Display name for an item id, falling back to the id itself.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.items.get(id).map(|item| item.name.as_str()).unwrap_or(id)
    }
}

/// A character the player can build trust with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "Npc")]
pub struct NpcDef {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub personality: String,
}

/// NPC definitions keyed by NPC id.
#[derive(Debug, Clone, Default)]
pub struct NpcCatalog {
    pub npcs: FxHashMap<String, NpcDef>,
}

impl NpcCatalog {
    pub fn load_from_ron(path: &Path) -> Result<NpcCatalog, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<NpcCatalog, ContentError> {
        Ok(NpcCatalog {
            npcs: ron::from_str(input)?,
        })
    }

    pub fn get(&self, id: &str) -> Option<&NpcDef> {
        self.npcs.get(id)
    }

    /// NPC ids in sorted order; new games start with zero trust for each.
    pub fn roster(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.npcs.keys().cloned().collect();
        ids.sort();
        ids
    }
}
