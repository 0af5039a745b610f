//! Class behavior table.
//!
//! Each class tag maps to one implementation of [`ClassBehavior`], which
//! decides what a character does in Preparation, Short Rest and Combat.
//! Behaviors only decide; applying the result to a party is done by
//! [`prepare`] and the resolver in [`crate::rules`].

use crate::dice::{Dice, DieType};
use crate::world::{Attribute, CharacterClass, DamageType, Monster, PartyMember};
use serde::{Deserialize, Serialize};

/// What the acting character's Preparation action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreparationEffect {
    /// Raise one of the actor's own attributes.
    RaiseSelf { attribute: Attribute, amount: i32 },
    /// Raise an attribute of every other party member.
    RaiseAllies { attribute: Attribute, amount: i32 },
    /// Regenerate the Wizard shield.
    Shield { rolled: u32, shield: i32 },
    /// The actor was not found in the party.
    NoEffect,
}

/// What the acting character's Short Rest action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShortRestEffect {
    SelfHeal { rolled: i32 },
    NoAction,
}

/// What a party member does on its combat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CombatAction {
    /// Damage one monster.
    Strike {
        amount: i32,
        damage_type: DamageType,
    },
    /// Damage every monster in the encounter.
    AreaStrike {
        amount: i32,
        damage_type: DamageType,
    },
    /// Heal the first conscious member in need.
    HealOne { amount: i32 },
    /// Heal every conscious member.
    HealParty { amount: i32 },
}

/// Battlefield facts a combat decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatSituation {
    /// Some conscious member is below half of its maximum hit points.
    pub healing_needed: bool,
    pub alive_monsters: usize,
}

impl CombatSituation {
    pub fn assess(party: &[PartyMember], alive_monsters: usize) -> Self {
        Self {
            healing_needed: party_needs_healing(party),
            alive_monsters,
        }
    }
}

/// Whether any conscious member is below half of its maximum hit points.
pub fn party_needs_healing(party: &[PartyMember]) -> bool {
    party.iter().any(|m| m.is_conscious() && m.needs_healing())
}

/// Per-class behavior.
pub trait ClassBehavior: Sync {
    fn preparation(&self, actor: &PartyMember, dice: &mut dyn Dice) -> PreparationEffect;

    fn short_rest(&self, actor: &PartyMember, dice: &mut dyn Dice) -> ShortRestEffect;

    fn combat_action(
        &self,
        actor: &PartyMember,
        situation: &CombatSituation,
        dice: &mut dyn Dice,
    ) -> CombatAction;
}

fn roll(dice: &mut dyn Dice, die: DieType) -> i32 {
    dice.roll_die(die) as i32
}

fn strike(amount: i32, actor: &PartyMember) -> CombatAction {
    CombatAction::Strike {
        amount,
        damage_type: actor.class().attack_type(),
    }
}

pub struct Adventurer;
pub struct Warrior;
pub struct Champion;
pub struct Cleric;
pub struct Paladin;
pub struct Wizard;

impl ClassBehavior for Adventurer {
    fn preparation(&self, _actor: &PartyMember, _dice: &mut dyn Dice) -> PreparationEffect {
        PreparationEffect::RaiseSelf {
            attribute: Attribute::Spirit,
            amount: 1,
        }
    }

    fn short_rest(&self, _actor: &PartyMember, dice: &mut dyn Dice) -> ShortRestEffect {
        ShortRestEffect::SelfHeal {
            rolled: roll(dice, DieType::D8),
        }
    }

    fn combat_action(
        &self,
        actor: &PartyMember,
        _situation: &CombatSituation,
        dice: &mut dyn Dice,
    ) -> CombatAction {
        let amount = roll(dice, DieType::D6) + actor.character.attributes.body;
        strike(amount, actor)
    }
}

impl ClassBehavior for Warrior {
    fn preparation(&self, _actor: &PartyMember, _dice: &mut dyn Dice) -> PreparationEffect {
        PreparationEffect::RaiseSelf {
            attribute: Attribute::Spirit,
            amount: 1,
        }
    }

    fn short_rest(&self, _actor: &PartyMember, dice: &mut dyn Dice) -> ShortRestEffect {
        ShortRestEffect::SelfHeal {
            rolled: roll(dice, DieType::D8),
        }
    }

    fn combat_action(
        &self,
        actor: &PartyMember,
        _situation: &CombatSituation,
        dice: &mut dyn Dice,
    ) -> CombatAction {
        let amount = roll(dice, DieType::D10) + actor.character.attributes.body;
        strike(amount, actor)
    }
}

impl ClassBehavior for Champion {
    fn preparation(&self, _actor: &PartyMember, _dice: &mut dyn Dice) -> PreparationEffect {
        PreparationEffect::RaiseAllies {
            attribute: Attribute::Spirit,
            amount: 1,
        }
    }

    // Same d8 as the Adventurer, not a full heal.
    fn short_rest(&self, _actor: &PartyMember, dice: &mut dyn Dice) -> ShortRestEffect {
        ShortRestEffect::SelfHeal {
            rolled: roll(dice, DieType::D8),
        }
    }

    fn combat_action(
        &self,
        actor: &PartyMember,
        _situation: &CombatSituation,
        dice: &mut dyn Dice,
    ) -> CombatAction {
        let amount = roll(dice, DieType::D10) + actor.character.attributes.body;
        strike(amount, actor)
    }
}

impl ClassBehavior for Cleric {
    fn preparation(&self, _actor: &PartyMember, _dice: &mut dyn Dice) -> PreparationEffect {
        PreparationEffect::RaiseAllies {
            attribute: Attribute::Mind,
            amount: 1,
        }
    }

    fn short_rest(&self, _actor: &PartyMember, dice: &mut dyn Dice) -> ShortRestEffect {
        ShortRestEffect::SelfHeal {
            rolled: roll(dice, DieType::D10),
        }
    }

    fn combat_action(
        &self,
        actor: &PartyMember,
        situation: &CombatSituation,
        dice: &mut dyn Dice,
    ) -> CombatAction {
        let attributes = actor.character.attributes;
        if situation.healing_needed {
            CombatAction::HealOne {
                amount: roll(dice, DieType::D10) + attributes.mind,
            }
        } else {
            strike(roll(dice, DieType::D4) + attributes.spirit, actor)
        }
    }
}

impl ClassBehavior for Paladin {
    fn preparation(&self, _actor: &PartyMember, dice: &mut dyn Dice) -> PreparationEffect {
        PreparationEffect::RaiseAllies {
            attribute: Attribute::Mind,
            amount: dice.roll(3) as i32,
        }
    }

    fn short_rest(&self, _actor: &PartyMember, dice: &mut dyn Dice) -> ShortRestEffect {
        ShortRestEffect::SelfHeal {
            rolled: roll(dice, DieType::D10),
        }
    }

    fn combat_action(
        &self,
        actor: &PartyMember,
        situation: &CombatSituation,
        dice: &mut dyn Dice,
    ) -> CombatAction {
        let attributes = actor.character.attributes;
        if situation.healing_needed {
            CombatAction::HealParty {
                amount: roll(dice, DieType::D10) + attributes.mind,
            }
        } else {
            strike(roll(dice, DieType::D8) + attributes.spirit, actor)
        }
    }
}

/// Area attacks need more than this many living monsters.
pub const AREA_ATTACK_THRESHOLD: usize = 3;

impl ClassBehavior for Wizard {
    fn preparation(&self, actor: &PartyMember, dice: &mut dyn Dice) -> PreparationEffect {
        let rolled = dice.roll_die(DieType::D6);
        let character = &actor.character;
        let shield = (rolled as i32 + character.attributes.mind) * character.level() as i32;
        PreparationEffect::Shield { rolled, shield }
    }

    fn short_rest(&self, _actor: &PartyMember, _dice: &mut dyn Dice) -> ShortRestEffect {
        ShortRestEffect::NoAction
    }

    fn combat_action(
        &self,
        actor: &PartyMember,
        situation: &CombatSituation,
        dice: &mut dyn Dice,
    ) -> CombatAction {
        let mind = actor.character.attributes.mind;
        if situation.alive_monsters > AREA_ATTACK_THRESHOLD && !situation.healing_needed {
            CombatAction::AreaStrike {
                amount: roll(dice, DieType::D4) + mind,
                damage_type: DamageType::Magical,
            }
        } else {
            strike(roll(dice, DieType::D6) + mind, actor)
        }
    }
}

impl CharacterClass {
    /// The behavior implementation for this class tag.
    pub fn behavior(&self) -> &'static dyn ClassBehavior {
        match self {
            CharacterClass::Adventurer => &Adventurer,
            CharacterClass::Warrior => &Warrior,
            CharacterClass::Champion => &Champion,
            CharacterClass::Cleric => &Cleric,
            CharacterClass::Paladin => &Paladin,
            CharacterClass::Wizard => &Wizard,
        }
    }
}

/// Monster attack roll: one die of the monster's damage dice.
pub fn monster_strike(monster: &Monster, dice: &mut dyn Dice) -> i32 {
    roll(dice, monster.damage_dice)
}

/// Result of one character's Preparation action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationOutcome {
    pub actor: String,
    pub class: Option<CharacterClass>,
    pub effect: PreparationEffect,
    pub party: Vec<PartyMember>,
}

/// Run `actor`'s Preparation action against `party`, producing a new party.
///
/// An actor not present in the party leaves every entry unchanged.
pub fn prepare(party: &[PartyMember], actor: &str, dice: &mut dyn Dice) -> PreparationOutcome {
    let Some(member) = party.iter().find(|m| m.name() == actor) else {
        return PreparationOutcome {
            actor: actor.to_string(),
            class: None,
            effect: PreparationEffect::NoEffect,
            party: party.to_vec(),
        };
    };

    let class = member.class();
    let effect = class.behavior().preparation(member, dice);
    PreparationOutcome {
        actor: actor.to_string(),
        class: Some(class),
        effect,
        party: apply_preparation(party, actor, &effect),
    }
}

/// Apply a Preparation effect for `actor` to every party entry.
pub fn apply_preparation(
    party: &[PartyMember],
    actor: &str,
    effect: &PreparationEffect,
) -> Vec<PartyMember> {
    party
        .iter()
        .map(|member| {
            let is_actor = member.name() == actor;
            match *effect {
                PreparationEffect::RaiseSelf { attribute, amount } if is_actor => {
                    raise(member, attribute, amount)
                }
                PreparationEffect::RaiseAllies { attribute, amount } if !is_actor => {
                    raise(member, attribute, amount)
                }
                PreparationEffect::Shield { shield, .. } if is_actor => member.with_shield(shield),
                _ => member.clone(),
            }
        })
        .collect()
}

fn raise(member: &PartyMember, attribute: Attribute, amount: i32) -> PartyMember {
    let attributes = member.character.attributes.raised(attribute, amount);
    member.with_character(member.character.with_attributes(attributes))
}
