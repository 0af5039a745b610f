//! Damage and healing resolver.
//!
//! Pure functions: each takes the current party or encounter and returns a
//! new one together with a record of what happened. Nothing is mutated in
//! place.

use crate::dice::{Dice, HitRoll};
use crate::world::{CharacterClass, DamageType, Encounter, Monster, PartyMember};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// Results
// ============================================================================

/// How a single application of damage ended for its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageResult {
    /// Target took the hit and is still standing.
    Hit,
    /// Target dropped to 0 HP with this hit.
    Felled,
    /// Target was already at 0 HP; nothing changed.
    AlreadyDown,
}

/// Damage applied to one monster slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterDamage {
    pub slot: usize,
    pub name: String,
    /// Damage before Boss mitigation.
    pub incoming: i32,
    /// Hit points actually removed.
    pub taken: i32,
    pub hit_points: i32,
    pub result: DamageResult,
}

/// Damage applied to one party member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDamage {
    pub name: String,
    pub incoming: i32,
    /// Hit points actually removed.
    pub taken: i32,
    /// Damage soaked by a Wizard shield.
    pub absorbed: i32,
    pub hit_points: i32,
    pub shield: i32,
    pub result: DamageResult,
}

/// Hit points restored to one party member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heal {
    pub name: String,
    pub amount: i32,
    pub hit_points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HealOutcome {
    Healed { heals: Vec<Heal> },
    /// Nobody eligible for this heal.
    NoTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MonsterAttackOutcome {
    Hits { hits: Vec<MemberDamage> },
    /// No conscious party member left to hit.
    NoTarget,
}

/// Where an encounter stands after an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterStatus {
    Ongoing,
    AllMonstersDead,
    AllPartyUnconscious,
}

impl EncounterStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EncounterStatus::Ongoing)
    }
}

// ============================================================================
// Mitigation
// ============================================================================

/// Scale a rolled amount by the hit roll.
pub fn apply_hit(amount: i32, hit: HitRoll) -> i32 {
    amount * hit.multiplier()
}

/// Damage a monster takes: a Boss halves damage matching its own type.
pub fn monster_mitigation(monster: &Monster, damage: i32, damage_type: DamageType) -> i32 {
    let damage = damage.max(0);
    if monster.is_boss() && monster.damage_type == damage_type {
        damage / 2
    } else {
        damage
    }
}

/// How incoming damage splits between shield and hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mitigation {
    pub hit_point_loss: i32,
    pub absorbed: i32,
    pub shield: i32,
}

/// Damage a party member takes, by class.
///
/// Warriors and Champions halve physical damage, Paladins halve psychical
/// damage. A Wizard first reduces every hit by its level; a positive shield
/// then absorbs the whole reduced hit and may go negative.
pub fn member_mitigation(
    member: &PartyMember,
    damage: i32,
    damage_type: DamageType,
) -> Mitigation {
    let damage = damage.max(0);
    let full = Mitigation {
        hit_point_loss: damage,
        absorbed: 0,
        shield: member.shield,
    };

    match member.class() {
        CharacterClass::Warrior | CharacterClass::Champion
            if damage_type == DamageType::Physical =>
        {
            Mitigation {
                hit_point_loss: damage / 2,
                ..full
            }
        }
        CharacterClass::Paladin if damage_type == DamageType::Psychical => Mitigation {
            hit_point_loss: damage / 2,
            ..full
        },
        CharacterClass::Wizard => {
            let reduced = (damage - member.character.level() as i32).max(0);
            if member.shield > 0 {
                Mitigation {
                    hit_point_loss: 0,
                    absorbed: reduced,
                    shield: member.shield - reduced,
                }
            } else {
                Mitigation {
                    hit_point_loss: reduced,
                    ..full
                }
            }
        }
        _ => full,
    }
}

// ============================================================================
// Applying damage
// ============================================================================

fn hit_monster(
    slot: usize,
    monster: &Monster,
    damage: i32,
    damage_type: DamageType,
) -> (Monster, MonsterDamage) {
    if !monster.is_alive() {
        let record = MonsterDamage {
            slot,
            name: monster.name.clone(),
            incoming: damage,
            taken: 0,
            hit_points: monster.hit_points,
            result: DamageResult::AlreadyDown,
        };
        return (monster.clone(), record);
    }

    let mitigated = monster_mitigation(monster, damage, damage_type);
    let hit_points = (monster.hit_points - mitigated).max(0);
    let record = MonsterDamage {
        slot,
        name: monster.name.clone(),
        incoming: damage,
        taken: monster.hit_points - hit_points,
        hit_points,
        result: if hit_points == 0 {
            DamageResult::Felled
        } else {
            DamageResult::Hit
        },
    };
    (monster.with_hit_points(hit_points), record)
}

/// Damage the monster in `slot`. `None` if the slot does not exist.
pub fn damage_monster(
    encounter: &Encounter,
    slot: usize,
    damage: i32,
    damage_type: DamageType,
) -> Option<(Encounter, MonsterDamage)> {
    let monster = encounter.monsters.get(slot)?;
    let (monster, record) = hit_monster(slot, monster, damage, damage_type);
    Some((encounter.with_monster(slot, monster), record))
}

/// Pick any monster slot, dead or alive, and damage it.
pub fn strike_random_monster(
    encounter: &Encounter,
    damage: i32,
    damage_type: DamageType,
    dice: &mut dyn Dice,
) -> Option<(Encounter, MonsterDamage)> {
    if encounter.is_empty() {
        return None;
    }
    let slot = dice.pick(encounter.len());
    damage_monster(encounter, slot, damage, damage_type)
}

/// Damage every monster in the encounter.
pub fn damage_all_monsters(
    encounter: &Encounter,
    damage: i32,
    damage_type: DamageType,
) -> (Encounter, Vec<MonsterDamage>) {
    let (monsters, records): (Vec<Monster>, Vec<MonsterDamage>) = encounter
        .monsters
        .iter()
        .enumerate()
        .map(|(slot, monster)| hit_monster(slot, monster, damage, damage_type))
        .unzip();
    (Encounter::new(monsters), records)
}

fn hit_member(
    member: &PartyMember,
    damage: i32,
    damage_type: DamageType,
) -> (PartyMember, MemberDamage) {
    if !member.is_conscious() {
        let record = MemberDamage {
            name: member.name().to_string(),
            incoming: damage,
            taken: 0,
            absorbed: 0,
            hit_points: member.hit_points,
            shield: member.shield,
            result: DamageResult::AlreadyDown,
        };
        return (member.clone(), record);
    }

    let mitigation = member_mitigation(member, damage, damage_type);
    let hit_points = (member.hit_points - mitigation.hit_point_loss).max(0);
    if mitigation.absorbed > 0 {
        debug!(
            member = member.name(),
            absorbed = mitigation.absorbed,
            shield = mitigation.shield,
            "Shield absorbed hit"
        );
    }

    let record = MemberDamage {
        name: member.name().to_string(),
        incoming: damage,
        taken: member.hit_points - hit_points,
        absorbed: mitigation.absorbed,
        hit_points,
        shield: mitigation.shield,
        result: if hit_points == 0 {
            DamageResult::Felled
        } else {
            DamageResult::Hit
        },
    };
    let updated = member.with_hit_points(hit_points).with_shield(mitigation.shield);
    (updated, record)
}

/// Resolve a monster's attack worth `damage`.
///
/// A Boss hits every conscious member at once; any other monster hits one
/// conscious member chosen uniformly.
pub fn monster_attack(
    party: &[PartyMember],
    monster: &Monster,
    damage: i32,
    dice: &mut dyn Dice,
) -> (Vec<PartyMember>, MonsterAttackOutcome) {
    let conscious: Vec<usize> = party
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_conscious())
        .map(|(i, _)| i)
        .collect();
    if conscious.is_empty() {
        return (party.to_vec(), MonsterAttackOutcome::NoTarget);
    }

    let targets: Vec<usize> = if monster.is_boss() {
        conscious
    } else {
        vec![conscious[dice.pick(conscious.len())]]
    };

    let mut updated = party.to_vec();
    let mut hits = Vec::with_capacity(targets.len());
    for index in targets {
        let (member, record) = hit_member(&party[index], damage, monster.damage_type);
        updated[index] = member;
        hits.push(record);
    }
    (updated, MonsterAttackOutcome::Hits { hits })
}

// ============================================================================
// Healing
// ============================================================================

fn healed(member: &PartyMember, amount: i32) -> (PartyMember, Heal) {
    let hit_points = member.hit_points + amount;
    let heal = Heal {
        name: member.name().to_string(),
        amount,
        hit_points,
    };
    (member.with_hit_points(hit_points), heal)
}

/// Heal the first conscious member below half of its maximum. No upper
/// clamp.
pub fn heal_one(party: &[PartyMember], amount: i32) -> (Vec<PartyMember>, HealOutcome) {
    let Some(index) = party
        .iter()
        .position(|m| m.is_conscious() && m.needs_healing())
    else {
        return (party.to_vec(), HealOutcome::NoTarget);
    };

    let mut updated = party.to_vec();
    let (member, heal) = healed(&party[index], amount.max(0));
    updated[index] = member;
    (updated, HealOutcome::Healed { heals: vec![heal] })
}

/// Heal every conscious member. No upper clamp.
pub fn heal_party(party: &[PartyMember], amount: i32) -> (Vec<PartyMember>, HealOutcome) {
    let amount = amount.max(0);
    let mut heals = Vec::new();
    let updated = party
        .iter()
        .map(|member| {
            if member.is_conscious() {
                let (member, heal) = healed(member, amount);
                heals.push(heal);
                member
            } else {
                member.clone()
            }
        })
        .collect();

    if heals.is_empty() {
        (updated, HealOutcome::NoTarget)
    } else {
        (updated, HealOutcome::Healed { heals })
    }
}

/// Short-rest self heal for `actor`: only below maximum, clamped to it.
/// Revives an unconscious member.
pub fn rest_heal(
    party: &[PartyMember],
    actor: &str,
    rolled: i32,
) -> (Vec<PartyMember>, Option<Heal>) {
    let Some(index) = party
        .iter()
        .position(|m| m.name() == actor && m.is_wounded())
    else {
        return (party.to_vec(), None);
    };

    let member = &party[index];
    let hit_points = (member.hit_points + rolled.max(0)).min(member.max_hit_points);
    let heal = Heal {
        name: actor.to_string(),
        amount: hit_points - member.hit_points,
        hit_points,
    };
    let mut updated = party.to_vec();
    updated[index] = member.with_hit_points(hit_points);
    (updated, Some(heal))
}

// ============================================================================
// End check
// ============================================================================

pub fn encounter_status(party: &[PartyMember], encounter: &Encounter) -> EncounterStatus {
    if encounter.all_dead() {
        EncounterStatus::AllMonstersDead
    } else if party.iter().all(|m| !m.is_conscious()) {
        EncounterStatus::AllPartyUnconscious
    } else {
        EncounterStatus::Ongoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DieType;
    use crate::testing::{boss, goblin, member, scenario_party, ScriptedDice};
    use crate::world::{Attributes, Challenge, ClassLine};

    fn total_hp(party: &[PartyMember]) -> i32 {
        party.iter().map(|m| m.hit_points).sum()
    }

    #[test]
    fn test_boss_halves_matching_type() {
        let dragon = boss(30, DamageType::Magical);
        for roll in 1..=20 {
            let matching = monster_mitigation(&dragon, roll * 2, DamageType::Magical);
            let other = monster_mitigation(&dragon, roll * 2, DamageType::Physical);
            assert_eq!(matching, other / 2);
        }
        assert_eq!(monster_mitigation(&goblin(5), 9, DamageType::Physical), 9);
    }

    #[test]
    fn test_monster_hp_clamped_and_death_reported() {
        let encounter = Encounter::new(vec![goblin(4)]);
        let (after, record) = damage_monster(&encounter, 0, 10, DamageType::Physical).unwrap();
        assert_eq!(after.monsters[0].hit_points, 0);
        assert_eq!(record.taken, 4);
        assert_eq!(record.result, DamageResult::Felled);

        let (again, record) = damage_monster(&after, 0, 3, DamageType::Physical).unwrap();
        assert_eq!(record.result, DamageResult::AlreadyDown);
        assert_eq!(again, after);
        assert!(damage_monster(&after, 3, 3, DamageType::Physical).is_none());
    }

    #[test]
    fn test_area_damage_hits_every_slot() {
        let encounter = Encounter::new(vec![goblin(3), goblin(8), goblin(0)]);
        let (after, records) = damage_all_monsters(&encounter, 5, DamageType::Magical);
        let hp: Vec<i32> = after.monsters.iter().map(|m| m.hit_points).collect();
        assert_eq!(hp, vec![0, 3, 0]);
        assert_eq!(records[0].result, DamageResult::Felled);
        assert_eq!(records[1].result, DamageResult::Hit);
        assert_eq!(records[2].result, DamageResult::AlreadyDown);
    }

    #[test]
    fn test_physical_boss_against_scenario_party() {
        let party = scenario_party();
        let party: Vec<PartyMember> = party
            .iter()
            .map(|m| if m.name() == "Zed" { m.with_shield(8) } else { m.clone() })
            .collect();
        let ogre_boss = boss(30, DamageType::Physical);

        let mut dice = ScriptedDice::new(vec![1]);
        let (after, outcome) = monster_attack(&party, &ogre_boss, 10, &mut dice);
        let MonsterAttackOutcome::Hits { hits } = outcome else {
            panic!("expected hits");
        };
        assert_eq!(hits.len(), 3);

        // Warrior halves physical damage.
        assert_eq!(hits[0].taken, 5);
        assert_eq!(after[0].hit_points, 15);
        // Cleric takes it in full.
        assert_eq!(hits[1].taken, 10);
        assert_eq!(after[1].hit_points, 5);
        // Wizard: 10 - level 1 = 9 into shield 8, which goes negative.
        assert_eq!(hits[2].taken, 0);
        assert_eq!(hits[2].absorbed, 9);
        assert_eq!(after[2].shield, -1);
        assert_eq!(after[2].hit_points, 12);
    }

    #[test]
    fn test_magical_boss_is_not_halved_by_warrior() {
        let party = scenario_party();
        let lich = boss(30, DamageType::Magical);
        let (after, _) = monster_attack(&party, &lich, 10, &mut ScriptedDice::new(vec![1]));
        assert_eq!(after[0].hit_points, 10);
        assert_eq!(after[1].hit_points, 5);
        // No shield: level reduction only.
        assert_eq!(after[2].hit_points, 3);
    }

    #[test]
    fn test_paladin_and_champion_halve_their_own_damage_type() {
        let paladin = member(
            "Paz",
            ClassLine::Devoted,
            400,
            Attributes::new(1, 1, 1),
            50,
            50,
        );
        let champion = member(
            "Cora",
            ClassLine::Fighter,
            800,
            Attributes::new(3, 0, 0),
            60,
            60,
        );
        assert_eq!(paladin.class(), CharacterClass::Paladin);
        assert_eq!(champion.class(), CharacterClass::Champion);
        let party = vec![paladin, champion];
        let mut dice = ScriptedDice::new(vec![1]);

        let (after, _) = monster_attack(&party, &boss(30, DamageType::Psychical), 10, &mut dice);
        assert_eq!(after[0].hit_points, 45);
        assert_eq!(after[1].hit_points, 50);

        let (after, _) = monster_attack(&party, &boss(30, DamageType::Physical), 10, &mut dice);
        assert_eq!(after[0].hit_points, 40);
        assert_eq!(after[1].hit_points, 55);

        let (after, _) = monster_attack(&party, &boss(30, DamageType::Magical), 10, &mut dice);
        assert_eq!(after[0].hit_points, 40);
        assert_eq!(after[1].hit_points, 50);
    }

    #[test]
    fn test_normal_monster_hits_one_conscious_member() {
        let party = scenario_party();
        let party = vec![
            party[0].with_hit_points(0),
            party[1].clone(),
            party[2].clone(),
        ];
        let goblin = goblin(5);

        // Pick index 1 among the two conscious members: Zed.
        let mut dice = ScriptedDice::new(vec![1]).with_picks(vec![1]);
        let (after, outcome) = monster_attack(&party, &goblin, 4, &mut dice);
        let MonsterAttackOutcome::Hits { hits } = outcome else {
            panic!("expected a hit");
        };
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Zed");
        assert_eq!(after[2].hit_points, 12 - 3);
        assert_eq!(after[0].hit_points, 0);
    }

    #[test]
    fn test_no_conscious_target() {
        let party: Vec<PartyMember> = scenario_party()
            .iter()
            .map(|m| m.with_hit_points(0))
            .collect();
        let mut dice = ScriptedDice::new(vec![1]);
        let (after, outcome) = monster_attack(&party, &goblin(5), 4, &mut dice);
        assert_eq!(outcome, MonsterAttackOutcome::NoTarget);
        assert_eq!(after, party);
    }

    #[test]
    fn test_party_hp_clamped_and_unconscious_reported() {
        let party = scenario_party();
        let mut dice = ScriptedDice::new(vec![1]).with_picks(vec![1]);
        let (after, outcome) = monster_attack(&party, &goblin(5), 40, &mut dice);
        let MonsterAttackOutcome::Hits { hits } = outcome else {
            panic!("expected a hit");
        };
        assert_eq!(hits[0].result, DamageResult::Felled);
        assert_eq!(after[1].hit_points, 0);
        assert!(!after[1].is_conscious());
    }

    #[test]
    fn test_heal_one_skips_unconscious() {
        let party = scenario_party();
        let party = vec![
            party[0].with_hit_points(0),
            party[1].with_hit_points(4),
            party[2].with_hit_points(2),
        ];
        let before = total_hp(&party);

        let (after, outcome) = heal_one(&party, 30);
        assert_eq!(after[0].hit_points, 0);
        assert_eq!(after[1].hit_points, 34);
        assert_eq!(after[2].hit_points, 2);
        assert!(matches!(outcome, HealOutcome::Healed { ref heals } if heals.len() == 1));
        assert!(total_hp(&after) > before);
    }

    #[test]
    fn test_heal_one_without_target_changes_nothing() {
        let party = scenario_party();
        let (after, outcome) = heal_one(&party, 5);
        assert_eq!(outcome, HealOutcome::NoTarget);
        assert_eq!(total_hp(&after), total_hp(&party));
    }

    #[test]
    fn test_heal_party_conscious_only() {
        let party = scenario_party();
        let party = vec![
            party[0].with_hit_points(0),
            party[1].clone(),
            party[2].clone(),
        ];
        let (after, outcome) = heal_party(&party, 6);
        assert_eq!(after[0].hit_points, 0);
        assert_eq!(after[1].hit_points, 21);
        assert_eq!(after[2].hit_points, 18);
        assert!(matches!(outcome, HealOutcome::Healed { ref heals } if heals.len() == 2));
    }

    #[test]
    fn test_rest_heal_clamps_and_is_idempotent_at_max() {
        let party = scenario_party();
        let (same, heal) = rest_heal(&party, "Mira", 7);
        assert!(heal.is_none());
        assert_eq!(same, party);

        let hurt = vec![
            party[0].clone(),
            party[1].with_hit_points(12),
            party[2].clone(),
        ];
        let (after, heal) = rest_heal(&hurt, "Mira", 7);
        assert_eq!(after[1].hit_points, 15);
        assert_eq!(heal.map(|h| h.amount), Some(3));
    }

    #[test]
    fn test_status_checks() {
        let party = scenario_party();
        let alive = Encounter::new(vec![goblin(3)]);
        let dead = Encounter::new(vec![goblin(0)]);
        assert_eq!(encounter_status(&party, &alive), EncounterStatus::Ongoing);
        assert_eq!(
            encounter_status(&party, &dead),
            EncounterStatus::AllMonstersDead
        );

        let down: Vec<PartyMember> = party.iter().map(|m| m.with_hit_points(0)).collect();
        assert_eq!(
            encounter_status(&down, &alive),
            EncounterStatus::AllPartyUnconscious
        );
        assert!(EncounterStatus::AllPartyUnconscious.is_terminal());
    }

    #[test]
    fn test_hit_roll_scaling() {
        assert_eq!(apply_hit(6, HitRoll::Critical), 12);
        assert_eq!(apply_hit(6, HitRoll::Miss), 0);
        let monster = Monster {
            challenge: Challenge::Normal,
            damage_dice: DieType::D8,
            ..goblin(1)
        };
        assert_eq!(
            monster_mitigation(&monster, apply_hit(7, HitRoll::Hit), DamageType::Magical),
            7
        );
    }
}
