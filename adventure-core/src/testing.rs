//! Testing utilities for the encounter engine.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedDice` replays a fixed sequence of rolls and picks
//! - `FailingStore` wraps a store and refuses every write
//! - Fixture builders for characters, monsters and adventures

use crate::dice::{Dice, DieType};
use crate::persist::{AdventureStore, MemoryStore, StorageError};
use crate::world::{
    Adventure, Attributes, Challenge, Character, ClassLine, DamageType, Encounter, Monster,
    PartyMember,
};
use std::collections::VecDeque;

/// Dice that replay scripted values.
///
/// Rolls cycle through the script and are clamped to `1..=sides`. Picks are
/// taken from their own queue (reduced modulo `len`) and default to 0 once
/// it runs dry.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: Vec<u32>,
    next_roll: usize,
    picks: VecDeque<usize>,
    rolls_made: usize,
}

impl ScriptedDice {
    pub fn new(rolls: Vec<u32>) -> Self {
        Self {
            rolls,
            next_roll: 0,
            picks: VecDeque::new(),
            rolls_made: 0,
        }
    }

    pub fn with_picks(mut self, picks: Vec<usize>) -> Self {
        self.picks = picks.into();
        self
    }

    /// Number of rolls made so far.
    pub fn rolls_made(&self) -> usize {
        self.rolls_made
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        self.rolls_made += 1;
        let Some(&value) = self.rolls.get(self.next_roll % self.rolls.len().max(1)) else {
            return 1;
        };
        self.next_roll += 1;
        value.clamp(1, sides.max(1))
    }

    fn pick(&mut self, len: usize) -> usize {
        let pick = self.picks.pop_front().unwrap_or(0);
        if len == 0 {
            0
        } else {
            pick % len
        }
    }
}

/// A store whose reads succeed and whose writes always fail.
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    inner: MemoryStore,
}

impl FailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

impl AdventureStore for FailingStore {
    fn load_adventure(&self, name: &str) -> Result<Adventure, StorageError> {
        self.inner.load_adventure(name)
    }

    fn save_adventure(&mut self, _adventure: &Adventure) -> Result<(), StorageError> {
        Err(StorageError::Backend("store is read-only".to_string()))
    }

    fn load_monster_catalog(&self) -> Result<Vec<Monster>, StorageError> {
        self.inner.load_monster_catalog()
    }

    fn load_character_roster(&self) -> Result<Vec<Character>, StorageError> {
        self.inner.load_character_roster()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A party member with explicit vitals.
pub fn member(
    name: &str,
    line: ClassLine,
    xp: u32,
    attributes: Attributes,
    hit_points: i32,
    max_hit_points: i32,
) -> PartyMember {
    let character = Character::new(name, "tester", xp, attributes, line);
    PartyMember::with_vitals(character, hit_points, max_hit_points)
}

/// Warrior Brann (HP 20, body 2), Cleric Mira (HP 15, mind 2) and Wizard
/// Zed (HP 12, mind 3).
pub fn scenario_party() -> Vec<PartyMember> {
    vec![
        member(
            "Brann",
            ClassLine::Fighter,
            300,
            Attributes::new(2, 0, 0),
            20,
            20,
        ),
        member(
            "Mira",
            ClassLine::Devoted,
            0,
            Attributes::new(0, 2, 0),
            15,
            15,
        ),
        member(
            "Zed",
            ClassLine::Arcane,
            0,
            Attributes::new(0, 3, 0),
            12,
            12,
        ),
    ]
}

pub fn monster(
    name: &str,
    challenge: Challenge,
    experience: u32,
    hit_points: i32,
    initiative: i32,
    damage_dice: DieType,
    damage_type: DamageType,
) -> Monster {
    Monster {
        name: name.to_string(),
        challenge,
        experience,
        hit_points,
        initiative,
        damage_dice,
        damage_type,
    }
}

pub fn goblin(hit_points: i32) -> Monster {
    monster(
        "Goblin",
        Challenge::Normal,
        10,
        hit_points,
        2,
        DieType::D6,
        DamageType::Physical,
    )
}

pub fn orc(hit_points: i32) -> Monster {
    monster(
        "Orc",
        Challenge::Normal,
        25,
        hit_points,
        1,
        DieType::D8,
        DamageType::Physical,
    )
}

/// Normal monster: HP 10, d6 physical.
pub fn ogre() -> Monster {
    monster(
        "Ogre",
        Challenge::Normal,
        50,
        10,
        1,
        DieType::D6,
        DamageType::Physical,
    )
}

pub fn boss(hit_points: i32, damage_type: DamageType) -> Monster {
    monster(
        "Dragon",
        Challenge::Boss,
        100,
        hit_points,
        10,
        DieType::D12,
        damage_type,
    )
}

/// "Ogre Den": one encounter with a single ogre, played by the scenario party.
pub fn scenario_adventure() -> Adventure {
    Adventure::new("Ogre Den", vec![Encounter::new(vec![ogre()])]).with_party(scenario_party())
}

/// Roster characters for the scenario party plus a Paladin.
pub fn roster() -> Vec<Character> {
    let mut characters: Vec<Character> =
        scenario_party().into_iter().map(|m| m.character).collect();
    characters.push(Character::new(
        "Paz",
        "tester",
        400,
        Attributes::new(1, 1, 1),
        ClassLine::Devoted,
    ));
    characters
}

/// Memory store holding "Ogre Den" with no party and the [`roster`].
pub fn roster_store() -> MemoryStore {
    let store = MemoryStore::new()
        .with_adventure(scenario_adventure().without_party())
        .with_monster(goblin(7))
        .with_monster(orc(12))
        .with_monster(ogre());
    roster()
        .into_iter()
        .fold(store, |store, character| store.with_character(character))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_rolls_cycle_and_clamp() {
        let mut dice = ScriptedDice::new(vec![4, 12]);
        assert_eq!(dice.roll(6), 4);
        assert_eq!(dice.roll(6), 6);
        assert_eq!(dice.roll(20), 4);
        assert_eq!(dice.rolls_made(), 3);
    }

    #[test]
    fn test_scripted_picks() {
        let mut dice = ScriptedDice::new(vec![1]).with_picks(vec![2, 5]);
        assert_eq!(dice.pick(3), 2);
        assert_eq!(dice.pick(3), 2);
        assert_eq!(dice.pick(3), 0);
    }

    #[test]
    fn test_fixture_party_classes() {
        let party = scenario_party();
        let classes: Vec<_> = party.iter().map(|m| m.class()).collect();
        assert_eq!(
            classes,
            vec![
                crate::world::CharacterClass::Warrior,
                crate::world::CharacterClass::Cleric,
                crate::world::CharacterClass::Wizard,
            ]
        );
    }
}
