//! Combatant directory.
//!
//! Read-only view over one encounter of an adventure: who is fighting and
//! how they are doing. Point queries are keyed by name and answer `None`
//! when the name is not part of the current adventure.

use crate::error::{EngineError, Result};
use crate::world::{Adventure, Encounter};
use serde::{Deserialize, Serialize};

/// A distinct monster name and how many times it appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterRosterEntry {
    pub name: String,
    pub count: usize,
}

/// Current vital stats of one party member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyVitals {
    pub name: String,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub conscious: bool,
}

/// Directory over one encounter of an adventure snapshot.
#[derive(Debug, Clone, Copy)]
pub struct EncounterDirectory<'a> {
    adventure: &'a Adventure,
    encounter: &'a Encounter,
    index: usize,
}

impl<'a> EncounterDirectory<'a> {
    pub fn new(adventure: &'a Adventure, index: usize) -> Result<Self> {
        let encounter = adventure.encounter(index).ok_or_else(|| {
            EngineError::invariant(format!(
                "encounter index {index} out of range for '{}' ({} encounters)",
                adventure.name,
                adventure.encounters.len()
            ))
        })?;
        Ok(Self {
            adventure,
            encounter,
            index,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn encounter(&self) -> &'a Encounter {
        self.encounter
    }

    /// Monster names in slot order, duplicates preserved.
    pub fn monster_names(&self) -> Vec<&'a str> {
        self.encounter
            .monsters
            .iter()
            .map(|m| m.name.as_str())
            .collect()
    }

    /// Monster names in first-seen order, without duplicates.
    pub fn distinct_monster_names(&self) -> Vec<&'a str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.monster_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    pub fn occurrences(&self, name: &str) -> usize {
        self.encounter
            .monsters
            .iter()
            .filter(|m| m.name == name)
            .count()
    }

    pub fn roster(&self) -> Vec<MonsterRosterEntry> {
        self.distinct_monster_names()
            .into_iter()
            .map(|name| MonsterRosterEntry {
                name: name.to_string(),
                count: self.occurrences(name),
            })
            .collect()
    }

    pub fn party(&self) -> Vec<PartyVitals> {
        self.adventure
            .party
            .iter()
            .map(|m| PartyVitals {
                name: m.name().to_string(),
                hit_points: m.hit_points,
                max_hit_points: m.max_hit_points,
                conscious: m.is_conscious(),
            })
            .collect()
    }

    /// `None` when the name is neither a monster here nor a party member.
    pub fn is_monster(&self, name: &str) -> Option<bool> {
        if self.has_monster(name) {
            Some(true)
        } else if self.adventure.member(name).is_some() {
            Some(false)
        } else {
            None
        }
    }

    /// Whether any monster with this name is still alive.
    pub fn is_monster_alive(&self, name: &str) -> Option<bool> {
        if !self.has_monster(name) {
            return None;
        }
        Some(
            self.encounter
                .monsters
                .iter()
                .any(|m| m.name == name && m.is_alive()),
        )
    }

    pub fn is_party_member_conscious(&self, name: &str) -> Option<bool> {
        self.adventure.member(name).map(|m| m.is_conscious())
    }

    fn has_monster(&self, name: &str) -> bool {
        self.encounter.monsters.iter().any(|m| m.name == name)
    }
}
