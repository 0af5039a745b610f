//! Adventure world types.
//!
//! Characters, party members, monsters, encounters and adventures. Every
//! value here is treated as immutable by the engine: a state change builds a
//! new value through the `with_*` combinators instead of mutating in place.

use crate::dice::DieType;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Levels
// ============================================================================

/// Highest reachable level.
pub const MAX_LEVEL: u8 = 10;

/// Experience needed per level.
pub const XP_PER_LEVEL: u32 = 100;

/// Level for an experience total: `xp / 100 + 1`, capped at [`MAX_LEVEL`].
pub fn level_for_xp(xp: u32) -> u8 {
    let level = xp / XP_PER_LEVEL + 1;
    level.min(MAX_LEVEL as u32) as u8
}

/// Minimum experience for a level.
pub fn xp_for_level(level: u8) -> u32 {
    level.clamp(1, MAX_LEVEL).saturating_sub(1) as u32 * XP_PER_LEVEL
}

// ============================================================================
// Attributes
// ============================================================================

/// The three base attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Body,
    Mind,
    Spirit,
}

impl Attribute {
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Body => "body",
            Attribute::Mind => "mind",
            Attribute::Spirit => "spirit",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Body, mind and spirit scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attributes {
    pub body: i32,
    pub mind: i32,
    pub spirit: i32,
}

impl Attributes {
    pub fn new(body: i32, mind: i32, spirit: i32) -> Self {
        Self { body, mind, spirit }
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Body => self.body,
            Attribute::Mind => self.mind,
            Attribute::Spirit => self.spirit,
        }
    }

    /// A copy with `amount` added to one attribute.
    pub fn raised(&self, attribute: Attribute, amount: i32) -> Self {
        let mut raised = *self;
        match attribute {
            Attribute::Body => raised.body += amount,
            Attribute::Mind => raised.mind += amount,
            Attribute::Spirit => raised.spirit += amount,
        }
        raised
    }
}

// ============================================================================
// Damage
// ============================================================================

/// Damage types dealt by attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Physical,
    Magical,
    Psychical,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Physical => "Physical",
            DamageType::Magical => "Magical",
            DamageType::Psychical => "Psychical",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Progression line a character belongs to. The line never changes; the
/// class tag within it follows the character's level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLine {
    /// Adventurer, then Warrior, then Champion. Body based.
    Fighter,
    /// Cleric, then Paladin. Spirit and mind based.
    Devoted,
    /// Wizard at every level. Mind based.
    Arcane,
}

impl ClassLine {
    /// The class tag this line holds at `level`.
    pub fn class_at(&self, level: u8) -> CharacterClass {
        match self {
            ClassLine::Fighter => match level {
                0..=3 => CharacterClass::Adventurer,
                4..=7 => CharacterClass::Warrior,
                _ => CharacterClass::Champion,
            },
            ClassLine::Devoted => match level {
                0..=4 => CharacterClass::Cleric,
                _ => CharacterClass::Paladin,
            },
            ClassLine::Arcane => CharacterClass::Wizard,
        }
    }
}

/// Class tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Adventurer,
    Warrior,
    Champion,
    Cleric,
    Paladin,
    Wizard,
}

impl CharacterClass {
    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Adventurer => "Adventurer",
            CharacterClass::Warrior => "Warrior",
            CharacterClass::Champion => "Champion",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Wizard => "Wizard",
        }
    }

    pub fn line(&self) -> ClassLine {
        match self {
            CharacterClass::Adventurer | CharacterClass::Warrior | CharacterClass::Champion => {
                ClassLine::Fighter
            }
            CharacterClass::Cleric | CharacterClass::Paladin => ClassLine::Devoted,
            CharacterClass::Wizard => ClassLine::Arcane,
        }
    }

    /// Damage type of this class's attacks.
    pub fn attack_type(&self) -> DamageType {
        match self {
            CharacterClass::Adventurer | CharacterClass::Warrior | CharacterClass::Champion => {
                DamageType::Physical
            }
            CharacterClass::Cleric | CharacterClass::Paladin => DamageType::Psychical,
            CharacterClass::Wizard => DamageType::Magical,
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Characters
// ============================================================================

/// A player character as stored in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub player: String,
    pub xp: u32,
    pub attributes: Attributes,
    #[serde(rename = "class")]
    pub class: CharacterClass,
}

impl Character {
    /// Create a character; the class tag is derived from `line` and `xp`.
    pub fn new(
        name: impl Into<String>,
        player: impl Into<String>,
        xp: u32,
        attributes: Attributes,
        line: ClassLine,
    ) -> Self {
        Self {
            name: name.into(),
            player: player.into(),
            xp,
            attributes,
            class: line.class_at(level_for_xp(xp)),
        }
    }

    pub fn level(&self) -> u8 {
        level_for_xp(self.xp)
    }

    pub fn line(&self) -> ClassLine {
        self.class.line()
    }

    /// Whether the stored class tag matches the character's level.
    pub fn is_class_consistent(&self) -> bool {
        self.line().class_at(self.level()) == self.class
    }

    /// A copy whose class tag matches its level.
    pub fn normalized(&self) -> Self {
        let mut character = self.clone();
        character.class = self.line().class_at(self.level());
        character
    }

    /// A copy with a new experience total, reclassified for its new level.
    pub fn with_xp(&self, xp: u32) -> Self {
        let mut character = self.clone();
        character.xp = xp;
        character.class = self.line().class_at(level_for_xp(xp));
        character
    }

    pub fn with_attributes(&self, attributes: Attributes) -> Self {
        let mut character = self.clone();
        character.attributes = attributes;
        character
    }

    /// Maximum hit points: `(10 + body) * level`, plus `body * level` for
    /// warriors.
    pub fn max_hit_points(&self) -> i32 {
        let level = self.level() as i32;
        let body = self.attributes.body;
        let base = (10 + body) * level;
        if self.class == CharacterClass::Warrior {
            base + body * level
        } else {
            base
        }
    }
}

/// A character taking part in an adventure, with its current hit points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMember {
    pub character: Character,
    pub hit_points: i32,
    /// Fixed when the roster is assembled.
    pub max_hit_points: i32,
    /// Roster spirit, fixed at assembly. Initiative rolls from this, so
    /// Preparation bonuses never move a member up the turn order.
    pub base_spirit: i32,
    /// Wizard shield, raised during preparation. Lives for one encounter.
    #[serde(skip)]
    pub shield: i32,
}

impl PartyMember {
    /// A member at full health.
    pub fn new(character: Character) -> Self {
        let max = character.max_hit_points();
        Self::with_vitals(character, max, max)
    }

    pub fn with_vitals(character: Character, hit_points: i32, max_hit_points: i32) -> Self {
        Self {
            base_spirit: character.attributes.spirit,
            character,
            hit_points,
            max_hit_points,
            shield: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.character.name
    }

    pub fn class(&self) -> CharacterClass {
        self.character.class
    }

    pub fn is_conscious(&self) -> bool {
        self.hit_points > 0
    }

    /// Strictly below half of maximum hit points (7 of 15 counts).
    pub fn needs_healing(&self) -> bool {
        self.hit_points * 2 < self.max_hit_points
    }

    pub fn is_wounded(&self) -> bool {
        self.hit_points < self.max_hit_points
    }

    pub fn with_hit_points(&self, hit_points: i32) -> Self {
        Self {
            hit_points,
            ..self.clone()
        }
    }

    pub fn with_character(&self, character: Character) -> Self {
        Self {
            character,
            ..self.clone()
        }
    }

    pub fn with_shield(&self, shield: i32) -> Self {
        Self {
            shield,
            ..self.clone()
        }
    }
}

// ============================================================================
// Monsters
// ============================================================================

/// Monster challenge rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Challenge {
    Normal,
    Boss,
}

/// A monster, as listed in the catalog and placed in encounters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub challenge: Challenge,
    pub experience: u32,
    pub hit_points: i32,
    pub initiative: i32,
    pub damage_dice: DieType,
    pub damage_type: DamageType,
}

impl Monster {
    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    pub fn is_boss(&self) -> bool {
        self.challenge == Challenge::Boss
    }

    pub fn with_hit_points(&self, hit_points: i32) -> Self {
        Self {
            hit_points,
            ..self.clone()
        }
    }
}

// ============================================================================
// Encounters and Adventures
// ============================================================================

/// One group of monsters fought together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Encounter {
    pub monsters: Vec<Monster>,
}

impl Encounter {
    pub fn new(monsters: Vec<Monster>) -> Self {
        Self { monsters }
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.monsters.iter().filter(|m| m.is_alive()).count()
    }

    pub fn all_dead(&self) -> bool {
        self.monsters.iter().all(|m| !m.is_alive())
    }

    /// Experience awarded for the encounter: the experience of the living
    /// monsters summed, times the number of living monsters.
    pub fn xp_reward(&self) -> u32 {
        let alive = self.monsters.iter().filter(|m| m.is_alive());
        let (sum, count) = alive.fold((0u32, 0u32), |(sum, count), m| {
            (sum.saturating_add(m.experience), count + 1)
        });
        sum.saturating_mul(count)
    }

    pub fn with_monster(&self, slot: usize, monster: Monster) -> Self {
        let mut monsters = self.monsters.clone();
        if let Some(entry) = monsters.get_mut(slot) {
            *entry = monster;
        }
        Self { monsters }
    }
}

/// An adventure: a fixed sequence of encounters and the party playing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adventure {
    pub name: String,
    pub num_encounters: usize,
    pub encounters: Vec<Encounter>,
    /// Empty between plays.
    #[serde(default)]
    pub party: Vec<PartyMember>,
}

impl Adventure {
    pub fn new(name: impl Into<String>, encounters: Vec<Encounter>) -> Self {
        Self {
            name: name.into(),
            num_encounters: encounters.len(),
            encounters,
            party: Vec::new(),
        }
    }

    pub fn encounter(&self, index: usize) -> Option<&Encounter> {
        self.encounters.get(index)
    }

    pub fn member(&self, name: &str) -> Option<&PartyMember> {
        self.party.iter().find(|m| m.name() == name)
    }

    pub fn party_wiped(&self) -> bool {
        self.party.iter().all(|m| !m.is_conscious())
    }

    pub fn with_party(&self, party: Vec<PartyMember>) -> Self {
        Self {
            party,
            ..self.clone()
        }
    }

    pub fn with_encounter(&self, index: usize, encounter: Encounter) -> Self {
        let mut encounters = self.encounters.clone();
        if let Some(entry) = encounters.get_mut(index) {
            *entry = encounter;
        }
        Self {
            encounters,
            ..self.clone()
        }
    }

    pub fn without_party(&self) -> Self {
        self.with_party(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin(hp: i32, xp: u32) -> Monster {
        Monster {
            name: "Goblin".to_string(),
            challenge: Challenge::Normal,
            experience: xp,
            hit_points: hp,
            initiative: 2,
            damage_dice: DieType::D6,
            damage_type: DamageType::Physical,
        }
    }

    #[test]
    fn test_level_for_xp() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(99), 1);
        assert_eq!(level_for_xp(100), 2);
        assert_eq!(level_for_xp(350), 4);
        assert_eq!(level_for_xp(900), 10);
        assert_eq!(level_for_xp(5000), MAX_LEVEL);
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(4), 300);
    }

    #[test]
    fn test_class_progression() {
        assert_eq!(ClassLine::Fighter.class_at(3), CharacterClass::Adventurer);
        assert_eq!(ClassLine::Fighter.class_at(4), CharacterClass::Warrior);
        assert_eq!(ClassLine::Fighter.class_at(8), CharacterClass::Champion);
        assert_eq!(ClassLine::Devoted.class_at(4), CharacterClass::Cleric);
        assert_eq!(ClassLine::Devoted.class_at(5), CharacterClass::Paladin);
        assert_eq!(ClassLine::Arcane.class_at(10), CharacterClass::Wizard);
    }

    #[test]
    fn test_gaining_xp_reclassifies() {
        let hero = Character::new(
            "Aria",
            "Sam",
            250,
            Attributes::new(2, 0, 1),
            ClassLine::Fighter,
        );
        assert_eq!(hero.class, CharacterClass::Adventurer);

        let promoted = hero.with_xp(300);
        assert_eq!(promoted.class, CharacterClass::Warrior);
        assert_eq!(promoted.level(), 4);
        // The receiver is untouched.
        assert_eq!(hero.xp, 250);
    }

    #[test]
    fn test_normalize_inconsistent_class() {
        let mut stale = Character::new("Oleg", "Kim", 0, Attributes::default(), ClassLine::Devoted);
        stale.xp = 600;
        assert!(!stale.is_class_consistent());
        assert_eq!(stale.normalized().class, CharacterClass::Paladin);
    }

    #[test]
    fn test_max_hit_points() {
        let adventurer = Character::new("A", "p", 0, Attributes::new(2, 0, 0), ClassLine::Fighter);
        assert_eq!(adventurer.max_hit_points(), 12);

        let warrior = Character::new("W", "p", 300, Attributes::new(2, 0, 0), ClassLine::Fighter);
        assert_eq!(warrior.max_hit_points(), (10 + 2) * 4 + 2 * 4);
    }

    #[test]
    fn test_needs_healing_uses_half_max() {
        let c = Character::new("C", "p", 0, Attributes::default(), ClassLine::Devoted);
        let member = PartyMember::with_vitals(c, 7, 15);
        assert!(member.needs_healing());
        assert!(!member.with_hit_points(8).needs_healing());
        assert!(member.with_hit_points(8).is_wounded());
    }

    #[test]
    fn test_xp_reward_counts_living_monsters() {
        let encounter = Encounter::new(vec![goblin(5, 10), goblin(5, 20), goblin(0, 40)]);
        assert_eq!(encounter.alive_count(), 2);
        assert_eq!(encounter.xp_reward(), (10 + 20) * 2);
    }

    #[test]
    fn test_with_encounter_is_copy_on_write() {
        let adventure = Adventure::new("Crypt", vec![Encounter::new(vec![goblin(5, 10)])]);
        let next = adventure.with_encounter(0, Encounter::new(vec![goblin(1, 10)]));
        assert_eq!(adventure.encounters[0].monsters[0].hit_points, 5);
        assert_eq!(next.encounters[0].monsters[0].hit_points, 1);
        assert_eq!(next.num_encounters, 1);
    }

    #[test]
    fn test_shield_is_not_serialized() {
        let wizard = Character::new("Zed", "p", 0, Attributes::new(0, 3, 0), ClassLine::Arcane);
        let member = PartyMember::new(wizard).with_shield(9);
        let json = serde_json::to_string(&member).unwrap();
        let back: PartyMember = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shield, 0);
        assert_eq!(back.hit_points, member.hit_points);
        assert!(json.contains("\"class\":\"Wizard\""));
    }
}
