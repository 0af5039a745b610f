//! Encounter state machine.
//!
//! One encounter runs Preparation, Initiative, Combat and Short Rest in that
//! order. Every phase operation takes the current [`EncounterState`] by
//! reference and returns the next state together with a structured report;
//! the state it was called on is left untouched.

use crate::classes::{self, CombatAction, CombatSituation, PreparationEffect, ShortRestEffect};
use crate::dice::{Dice, HitRoll};
use crate::error::{EngineError, Result};
use crate::initiative::{self, InitiativeOrder, Side};
use crate::rules::{self, EncounterStatus, Heal, HealOutcome, MonsterAttackOutcome, MonsterDamage};
use crate::world::{Adventure, CharacterClass, Encounter, PartyMember};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Phase an encounter is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Preparation,
    Initiative,
    Combat,
    ShortRest,
    /// Short rest done; the adventure can move to the next encounter.
    Complete,
    /// The party was wiped out. No further phases run.
    Aborted,
}

/// How combat ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatOutcome {
    /// Every monster is dead.
    Victory,
    /// Every party member is unconscious.
    PartyWiped,
    /// The round ceiling was reached first.
    Stalemate,
}

/// Knobs for the combat round loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRules {
    /// Roll a d10 to hit before every single-target attack.
    pub hit_rolls: bool,
    /// End combat as a stalemate after this many rounds.
    pub max_rounds: Option<u32>,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            hit_rolls: true,
            max_rounds: Some(100),
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationStep {
    pub actor: String,
    pub class: Option<CharacterClass>,
    pub effect: PreparationEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationReport {
    pub steps: Vec<PreparationStep>,
}

/// What happened on one combatant's turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnAction {
    /// The combatant is down and does not act.
    Skipped,
    /// Single-target attack on a random monster slot. `damage` is `None`
    /// when the hit roll missed.
    Strike {
        hit: Option<HitRoll>,
        rolled: i32,
        damage: Option<MonsterDamage>,
    },
    /// Area attack on every monster.
    AreaStrike {
        rolled: i32,
        damage: Vec<MonsterDamage>,
    },
    HealOne {
        rolled: i32,
        outcome: HealOutcome,
    },
    HealParty {
        rolled: i32,
        outcome: HealOutcome,
    },
    /// A monster's attack. `outcome` is `None` when the hit roll missed.
    MonsterAttack {
        hit: Option<HitRoll>,
        rolled: i32,
        outcome: Option<MonsterAttackOutcome>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub actor: String,
    pub side: Side,
    pub action: TurnAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub turns: Vec<TurnReport>,
    pub status: EncounterStatus,
    /// Set when this round ended combat.
    pub outcome: Option<CombatOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestStep {
    pub actor: String,
    pub effect: ShortRestEffect,
    /// `None` when the actor was already at full health or has no rest action.
    pub heal: Option<Heal>,
}

/// A party member whose level changed with the experience award.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advancement {
    pub name: String,
    pub xp: u32,
    pub previous_level: u8,
    pub level: u8,
    pub class: CharacterClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortRestReport {
    pub rests: Vec<RestStep>,
    /// Experience given to each party member.
    pub xp_awarded: u32,
    pub advancements: Vec<Advancement>,
}

// ============================================================================
// State
// ============================================================================

/// Snapshot of one encounter in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    adventure: Adventure,
    index: usize,
    phase: Phase,
    order: InitiativeOrder,
    round: u32,
    xp_reward: u32,
    outcome: Option<CombatOutcome>,
}

impl EncounterState {
    /// Start encounter `index` of `adventure` in Preparation.
    ///
    /// Fails when the index is out of range, the encounter list disagrees
    /// with its declared length, or the party is empty.
    pub fn begin(adventure: Adventure, index: usize) -> Result<Self> {
        if adventure.encounters.len() != adventure.num_encounters {
            return Err(EngineError::invariant(format!(
                "adventure '{}' declares {} encounters but has {}",
                adventure.name,
                adventure.num_encounters,
                adventure.encounters.len()
            )));
        }
        let encounter = adventure.encounter(index).ok_or_else(|| {
            EngineError::invariant(format!(
                "encounter index {index} out of range for '{}'",
                adventure.name
            ))
        })?;
        if adventure.party.is_empty() {
            return Err(EngineError::invariant(format!(
                "adventure '{}' has no party",
                adventure.name
            )));
        }

        let xp_reward = encounter.xp_reward();
        // Shields never carry over from a previous encounter.
        let party = adventure.party.iter().map(|m| m.with_shield(0)).collect();
        info!(
            adventure = %adventure.name,
            encounter = index,
            monsters = encounter.len(),
            xp_reward,
            "Encounter started"
        );

        Ok(Self {
            adventure: adventure.with_party(party),
            index,
            phase: Phase::Preparation,
            order: InitiativeOrder::default(),
            round: 0,
            xp_reward,
            outcome: None,
        })
    }

    pub fn adventure(&self) -> &Adventure {
        &self.adventure
    }

    pub fn into_adventure(self) -> Adventure {
        self.adventure
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn order(&self) -> &InitiativeOrder {
        &self.order
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Experience each member earns on victory, fixed when the encounter began.
    pub fn xp_reward(&self) -> u32 {
        self.xp_reward
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.outcome
    }

    pub fn party(&self) -> &[PartyMember] {
        &self.adventure.party
    }

    pub fn encounter(&self) -> &Encounter {
        &self.adventure.encounters[self.index]
    }

    pub fn status(&self) -> EncounterStatus {
        rules::encounter_status(self.party(), self.encounter())
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(EngineError::invariant(format!(
                "expected phase {expected:?}, encounter is in {:?}",
                self.phase
            )))
        }
    }

    fn with_combat(&self, party: Vec<PartyMember>, encounter: Encounter) -> Adventure {
        self.adventure
            .with_party(party)
            .with_encounter(self.index, encounter)
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    /// Every member's Preparation action, in party order. Each action sees
    /// the party produced by the one before it.
    pub fn run_preparation(&self, dice: &mut dyn Dice) -> Result<(Self, PreparationReport)> {
        self.expect_phase(Phase::Preparation)?;

        let names: Vec<String> = self.party().iter().map(|m| m.name().to_string()).collect();
        let mut party = self.party().to_vec();
        let mut steps = Vec::with_capacity(names.len());
        for name in names {
            let outcome = classes::prepare(&party, &name, dice);
            debug!(actor = %name, effect = ?outcome.effect, "Preparation action");
            party = outcome.party;
            steps.push(PreparationStep {
                actor: outcome.actor,
                class: outcome.class,
                effect: outcome.effect,
            });
        }

        info!(encounter = self.index, "Preparation complete");
        let next = Self {
            adventure: self.adventure.with_party(party),
            phase: Phase::Initiative,
            ..self.clone()
        };
        Ok((next, PreparationReport { steps }))
    }

    // ========================================================================
    // Initiative
    // ========================================================================

    pub fn roll_initiative(&self, dice: &mut dyn Dice) -> Result<(Self, InitiativeOrder)> {
        self.expect_phase(Phase::Initiative)?;

        let order = initiative::roll_initiative(self.party(), self.encounter(), dice);
        info!(
            encounter = self.index,
            combatants = order.len(),
            first = order.combatants().first().map(|c| c.name.as_str()),
            "Initiative rolled"
        );
        let next = Self {
            order: order.clone(),
            phase: Phase::Combat,
            ..self.clone()
        };
        Ok((next, order))
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// One pass through the initiative order. Stops at the first action
    /// after which the encounter is decided.
    pub fn run_combat_round(
        &self,
        combat: &CombatRules,
        dice: &mut dyn Dice,
    ) -> Result<(Self, RoundReport)> {
        self.expect_phase(Phase::Combat)?;

        let round = self.round + 1;
        let mut party = self.party().to_vec();
        let mut encounter = self.encounter().clone();
        let mut turns = Vec::with_capacity(self.order.len());
        let mut status = rules::encounter_status(&party, &encounter);

        for combatant in self.order.iter() {
            if status.is_terminal() {
                break;
            }

            let action = match combatant.side {
                Side::Party => {
                    party_turn(&combatant.name, &mut party, &mut encounter, combat, dice)
                }
                Side::Monster { slot } => {
                    monster_turn(slot, &mut party, &encounter, combat, dice)
                }
            };
            debug!(round, actor = %combatant.name, action = ?action, "Combat turn");
            turns.push(TurnReport {
                actor: combatant.name.clone(),
                side: combatant.side,
                action,
            });
            status = rules::encounter_status(&party, &encounter);
        }

        let outcome = match status {
            EncounterStatus::AllMonstersDead => Some(CombatOutcome::Victory),
            EncounterStatus::AllPartyUnconscious => Some(CombatOutcome::PartyWiped),
            EncounterStatus::Ongoing => match combat.max_rounds {
                Some(max) if round >= max => {
                    warn!(round, encounter = self.index, "Round ceiling reached");
                    Some(CombatOutcome::Stalemate)
                }
                _ => None,
            },
        };
        let phase = match outcome {
            Some(CombatOutcome::PartyWiped) => Phase::Aborted,
            Some(_) => Phase::ShortRest,
            None => Phase::Combat,
        };
        if let Some(outcome) = outcome {
            info!(round, encounter = self.index, ?outcome, "Combat ended");
        }

        let next = Self {
            adventure: self.with_combat(party, encounter),
            phase,
            round,
            outcome,
            ..self.clone()
        };
        let report = RoundReport {
            round,
            turns,
            status,
            outcome,
        };
        Ok((next, report))
    }

    // ========================================================================
    // Short rest
    // ========================================================================

    /// Every member's Short Rest action, then the experience award. A
    /// stalemate earns no experience.
    pub fn run_short_rest(&self, dice: &mut dyn Dice) -> Result<(Self, ShortRestReport)> {
        self.expect_phase(Phase::ShortRest)?;

        let names: Vec<String> = self.party().iter().map(|m| m.name().to_string()).collect();
        let mut party = self.party().to_vec();
        let mut rests = Vec::with_capacity(names.len());
        for name in names {
            let Some(member) = party.iter().find(|m| m.name() == name) else {
                continue;
            };
            let effect = member.class().behavior().short_rest(member, dice);
            let heal = match effect {
                ShortRestEffect::SelfHeal { rolled } => {
                    let (rested, heal) = rules::rest_heal(&party, &name, rolled);
                    party = rested;
                    heal
                }
                ShortRestEffect::NoAction => None,
            };
            rests.push(RestStep {
                actor: name,
                effect,
                heal,
            });
        }

        let xp_awarded = match self.outcome {
            Some(CombatOutcome::Victory) => self.xp_reward,
            _ => 0,
        };
        let mut advancements = Vec::new();
        if xp_awarded > 0 {
            party = party
                .iter()
                .map(|member| {
                    let previous_level = member.character.level();
                    let character = member
                        .character
                        .with_xp(member.character.xp.saturating_add(xp_awarded));
                    if character.level() != previous_level {
                        advancements.push(Advancement {
                            name: character.name.clone(),
                            xp: character.xp,
                            previous_level,
                            level: character.level(),
                            class: character.class,
                        });
                    }
                    member.with_character(character)
                })
                .collect();
        }

        info!(
            encounter = self.index,
            xp_awarded,
            level_ups = advancements.len(),
            "Short rest complete"
        );
        let party = party.iter().map(|m| m.with_shield(0)).collect();
        let next = Self {
            adventure: self.adventure.with_party(party),
            phase: Phase::Complete,
            ..self.clone()
        };
        let report = ShortRestReport {
            rests,
            xp_awarded,
            advancements,
        };
        Ok((next, report))
    }
}

fn hit_roll(combat: &CombatRules, dice: &mut dyn Dice) -> Option<HitRoll> {
    combat.hit_rolls.then(|| HitRoll::roll(dice))
}

fn party_turn(
    name: &str,
    party: &mut Vec<PartyMember>,
    encounter: &mut Encounter,
    combat: &CombatRules,
    dice: &mut dyn Dice,
) -> TurnAction {
    let Some(actor) = party.iter().find(|m| m.name() == name) else {
        return TurnAction::Skipped;
    };
    if !actor.is_conscious() {
        return TurnAction::Skipped;
    }

    let situation = CombatSituation::assess(party, encounter.alive_count());
    match actor.class().behavior().combat_action(actor, &situation, dice) {
        CombatAction::Strike {
            amount,
            damage_type,
        } => {
            let hit = hit_roll(combat, dice);
            if hit.is_some_and(|h| h.is_miss()) {
                return TurnAction::Strike {
                    hit,
                    rolled: amount,
                    damage: None,
                };
            }
            let damage = hit.map_or(amount, |h| rules::apply_hit(amount, h));
            let struck = rules::strike_random_monster(encounter, damage, damage_type, dice);
            let damage = struck.map(|(updated, record)| {
                *encounter = updated;
                record
            });
            TurnAction::Strike {
                hit,
                rolled: amount,
                damage,
            }
        }
        CombatAction::AreaStrike {
            amount,
            damage_type,
        } => {
            let (updated, damage) = rules::damage_all_monsters(encounter, amount, damage_type);
            *encounter = updated;
            TurnAction::AreaStrike {
                rolled: amount,
                damage,
            }
        }
        CombatAction::HealOne { amount } => {
            let (healed, outcome) = rules::heal_one(party, amount);
            *party = healed;
            TurnAction::HealOne {
                rolled: amount,
                outcome,
            }
        }
        CombatAction::HealParty { amount } => {
            let (healed, outcome) = rules::heal_party(party, amount);
            *party = healed;
            TurnAction::HealParty {
                rolled: amount,
                outcome,
            }
        }
    }
}

fn monster_turn(
    slot: usize,
    party: &mut Vec<PartyMember>,
    encounter: &Encounter,
    combat: &CombatRules,
    dice: &mut dyn Dice,
) -> TurnAction {
    let Some(monster) = encounter.monsters.get(slot) else {
        return TurnAction::Skipped;
    };
    if !monster.is_alive() {
        return TurnAction::Skipped;
    }

    let rolled = classes::monster_strike(monster, dice);
    let hit = hit_roll(combat, dice);
    if hit.is_some_and(|h| h.is_miss()) {
        return TurnAction::MonsterAttack {
            hit,
            rolled,
            outcome: None,
        };
    }

    let damage = hit.map_or(rolled, |h| rules::apply_hit(rolled, h));
    let (attacked, outcome) = rules::monster_attack(party, monster, damage, dice);
    *party = attacked;
    TurnAction::MonsterAttack {
        hit,
        rolled,
        outcome: Some(outcome),
    }
}
