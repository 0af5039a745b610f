//! Initiative sequencing.
//!
//! Turn order for one encounter, rolled once and kept for every round.

use crate::dice::{Dice, DieType};
use crate::world::{Encounter, PartyMember};
use serde::{Deserialize, Serialize};

/// Which side a combatant fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Party,
    /// Slot of the monster in the encounter's list.
    Monster { slot: usize },
}

/// One entry in the turn order. Holds no game state of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub initiative: i32,
    pub side: Side,
}

impl Combatant {
    pub fn is_monster(&self) -> bool {
        matches!(self.side, Side::Monster { .. })
    }
}

/// Combatants sorted by rolled initiative, highest first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitiativeOrder {
    combatants: Vec<Combatant>,
}

impl InitiativeOrder {
    /// Sort rolled combatants, highest first. Ties keep insertion order.
    pub fn from_rolls(mut combatants: Vec<Combatant>) -> Self {
        combatants.sort_by(|a, b| b.initiative.cmp(&a.initiative));
        Self { combatants }
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn len(&self) -> usize {
        self.combatants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combatants.is_empty()
    }
}

/// Roll `base + d12` for every party member (base: roster spirit) and every
/// monster slot (base: initiative bonus). Party members are inserted first,
/// then monsters in slot order, dead or alive.
pub fn roll_initiative(
    party: &[PartyMember],
    encounter: &Encounter,
    dice: &mut dyn Dice,
) -> InitiativeOrder {
    let mut rolled = Vec::with_capacity(party.len() + encounter.len());

    for member in party {
        let roll = dice.roll_die(DieType::D12) as i32;
        rolled.push(Combatant {
            name: member.name().to_string(),
            initiative: member.base_spirit + roll,
            side: Side::Party,
        });
    }

    for (slot, monster) in encounter.monsters.iter().enumerate() {
        let roll = dice.roll_die(DieType::D12) as i32;
        rolled.push(Combatant {
            name: monster.name.clone(),
            initiative: monster.initiative + roll,
            side: Side::Monster { slot },
        });
    }

    InitiativeOrder::from_rolls(rolled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes;
    use crate::testing::{goblin, member, scenario_party, ScriptedDice};
    use crate::world::{Attributes, ClassLine};

    #[test]
    fn test_sorted_descending() {
        let party = scenario_party();
        let encounter = Encounter::new(vec![goblin(5)]);
        // Brann spirit 0, Mira 0, Zed 0; goblin bonus 2.
        let mut dice = ScriptedDice::new(vec![3, 9, 5, 12]);
        let order = roll_initiative(&party, &encounter, &mut dice);

        let names: Vec<&str> = order.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Goblin", "Mira", "Zed", "Brann"]);
        assert_eq!(order.combatants()[0].initiative, 14);
        assert_eq!(order.combatants()[0].side, Side::Monster { slot: 0 });
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let party = scenario_party();
        let encounter = Encounter::new(vec![goblin(5), goblin(5)]);
        // Everyone lands on 7: party first, then goblins by slot.
        let mut dice = ScriptedDice::new(vec![7, 7, 7, 5, 5]);
        let order = roll_initiative(&party, &encounter, &mut dice);

        let sides: Vec<Side> = order.iter().map(|c| c.side).collect();
        assert_eq!(
            sides,
            vec![
                Side::Party,
                Side::Party,
                Side::Party,
                Side::Monster { slot: 0 },
                Side::Monster { slot: 1 },
            ]
        );
        assert_eq!(order.combatants()[0].name, "Brann");
    }

    #[test]
    fn test_duplicate_monsters_are_separate_entries() {
        let encounter = Encounter::new(vec![goblin(5), goblin(0), goblin(5)]);
        let order = roll_initiative(&[], &encounter, &mut ScriptedDice::new(vec![1]));
        assert_eq!(order.len(), 3);
        assert!(order.iter().all(|c| c.is_monster()));
    }

    #[test]
    fn test_preparation_bonus_does_not_raise_initiative() {
        let ash = member(
            "Ash",
            ClassLine::Fighter,
            0,
            Attributes::new(1, 0, 0),
            11,
            11,
        );
        let prepared = classes::prepare(&[ash], "Ash", &mut ScriptedDice::new(vec![1])).party;
        assert_eq!(prepared[0].character.attributes.spirit, 1);
        assert_eq!(prepared[0].base_spirit, 0);

        let mut dice = ScriptedDice::new(vec![5]);
        let order = roll_initiative(&prepared, &Encounter::default(), &mut dice);
        assert_eq!(order.combatants()[0].initiative, 5);
    }
}
