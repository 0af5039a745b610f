//! Storage port.
//!
//! The engine reads and writes adventures, the monster catalog and the
//! character roster only through [`AdventureStore`]. Two implementations
//! ship with the crate: [`MemoryStore`] and the file-backed [`JsonStore`].

use crate::world::{Adventure, Character, Monster};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Storage contract consumed by the engine.
pub trait AdventureStore {
    fn load_adventure(&self, name: &str) -> Result<Adventure, StorageError>;

    /// Replace the stored adventure with the same name, or add it.
    fn save_adventure(&mut self, adventure: &Adventure) -> Result<(), StorageError>;

    fn load_monster_catalog(&self) -> Result<Vec<Monster>, StorageError>;

    fn load_character_roster(&self) -> Result<Vec<Character>, StorageError>;
}

fn upsert(adventures: &mut Vec<Adventure>, adventure: &Adventure) {
    match adventures.iter_mut().find(|a| a.name == adventure.name) {
        Some(existing) => *existing = adventure.clone(),
        None => adventures.push(adventure.clone()),
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    adventures: Vec<Adventure>,
    monsters: Vec<Monster>,
    characters: Vec<Character>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adventure(mut self, adventure: Adventure) -> Self {
        upsert(&mut self.adventures, &adventure);
        self
    }

    pub fn with_monster(mut self, monster: Monster) -> Self {
        self.monsters.push(monster);
        self
    }

    pub fn with_character(mut self, character: Character) -> Self {
        self.characters.push(character);
        self
    }

    pub fn adventures(&self) -> &[Adventure] {
        &self.adventures
    }
}

impl AdventureStore for MemoryStore {
    fn load_adventure(&self, name: &str) -> Result<Adventure, StorageError> {
        self.adventures
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                kind: "adventure",
                name: name.to_string(),
            })
    }

    fn save_adventure(&mut self, adventure: &Adventure) -> Result<(), StorageError> {
        upsert(&mut self.adventures, adventure);
        Ok(())
    }

    fn load_monster_catalog(&self) -> Result<Vec<Monster>, StorageError> {
        Ok(self.monsters.clone())
    }

    fn load_character_roster(&self) -> Result<Vec<Character>, StorageError> {
        Ok(self.characters.clone())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Current store file version.
const SAVE_VERSION: u32 = 1;

pub const ADVENTURES_FILE: &str = "adventures.json";
pub const MONSTERS_FILE: &str = "monsters.json";
pub const CHARACTERS_FILE: &str = "characters.json";

/// On-disk layout of every store file.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument<I> {
    version: u32,
    items: I,
}

/// Store keeping one JSON document per collection under a directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn save_monster_catalog(&self, monsters: &[Monster]) -> Result<(), StorageError> {
        self.write_items(MONSTERS_FILE, monsters)
    }

    pub fn save_character_roster(&self, characters: &[Character]) -> Result<(), StorageError> {
        self.write_items(CHARACTERS_FILE, characters)
    }

    pub fn list_adventures(&self) -> Result<Vec<String>, StorageError> {
        let adventures: Vec<Adventure> = self.read_items(ADVENTURES_FILE)?;
        Ok(adventures.into_iter().map(|a| a.name).collect())
    }

    /// A missing file reads as an empty collection.
    fn read_items<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>, StorageError> {
        let path = self.root.join(file);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let document: StoreDocument<Vec<T>> = serde_json::from_str(&content)?;
        if document.version != SAVE_VERSION {
            return Err(StorageError::VersionMismatch {
                expected: SAVE_VERSION,
                found: document.version,
            });
        }
        Ok(document.items)
    }

    /// Written to a temporary file first, then renamed over the target.
    fn write_items<T: Serialize>(&self, file: &str, items: &[T]) -> Result<(), StorageError> {
        let document = StoreDocument {
            version: SAVE_VERSION,
            items,
        };
        let content = serde_json::to_string_pretty(&document)?;

        let path = self.root.join(file);
        let tmp = self.root.join(format!("{file}.tmp"));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), items = items.len(), "Store file written");
        Ok(())
    }
}

impl AdventureStore for JsonStore {
    fn load_adventure(&self, name: &str) -> Result<Adventure, StorageError> {
        let adventures: Vec<Adventure> = self.read_items(ADVENTURES_FILE)?;
        adventures
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| StorageError::NotFound {
                kind: "adventure",
                name: name.to_string(),
            })
    }

    fn save_adventure(&mut self, adventure: &Adventure) -> Result<(), StorageError> {
        let mut adventures: Vec<Adventure> = self.read_items(ADVENTURES_FILE)?;
        upsert(&mut adventures, adventure);
        self.write_items(ADVENTURES_FILE, &adventures)
    }

    fn load_monster_catalog(&self) -> Result<Vec<Monster>, StorageError> {
        self.read_items(MONSTERS_FILE)
    }

    fn load_character_roster(&self) -> Result<Vec<Character>, StorageError> {
        self.read_items(CHARACTERS_FILE)
    }
}
