//! AdventureSession - the public API for playing an adventure.
//!
//! A session owns the storage port and the dice. It loads an adventure,
//! assembles a party from the character roster, drives each encounter
//! through its phases and writes every new snapshot back to the store.

use crate::dice::{Dice, RngDice};
use crate::encounter::{
    CombatOutcome, CombatRules, EncounterState, Phase, PreparationReport, RoundReport,
    ShortRestReport,
};
use crate::error::{EngineError, Result};
use crate::initiative::InitiativeOrder;
use crate::persist::AdventureStore;
use crate::world::{Adventure, PartyMember};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for opening a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Adventure to play.
    pub adventure_name: String,

    /// Combat ends as a stalemate after this many rounds.
    pub max_rounds: Option<u32>,

    /// Seed for the dice. `None` seeds from the OS.
    pub seed: Option<u64>,

    /// Put the untouched encounters and an empty party back in the store
    /// when the adventure ends.
    pub restore_on_finish: bool,

    /// Roll to hit before single-target attacks.
    pub hit_rolls: bool,
}

impl SessionConfig {
    pub fn new(adventure_name: impl Into<String>) -> Self {
        Self {
            adventure_name: adventure_name.into(),
            max_rounds: Some(100),
            seed: None,
            restore_on_finish: true,
            hit_rolls: true,
        }
    }

    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Let combat run until one side is down.
    pub fn without_round_limit(mut self) -> Self {
        self.max_rounds = None;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_restore_on_finish(mut self, restore: bool) -> Self {
        self.restore_on_finish = restore;
        self
    }

    pub fn with_hit_rolls(mut self, hit_rolls: bool) -> Self {
        self.hit_rolls = hit_rolls;
        self
    }

    pub fn combat_rules(&self) -> CombatRules {
        CombatRules {
            hit_rolls: self.hit_rolls,
            max_rounds: self.max_rounds,
        }
    }
}

/// Everything that happened in one encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterReport {
    pub index: usize,
    pub preparation: PreparationReport,
    pub initiative: InitiativeOrder,
    pub rounds: Vec<RoundReport>,
    pub outcome: CombatOutcome,
    /// `None` when the party was wiped out.
    pub short_rest: Option<ShortRestReport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdventureResult {
    /// Every encounter was played.
    Completed,
    /// The party was wiped out in this encounter.
    Aborted { encounter: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdventureReport {
    pub adventure: String,
    pub result: AdventureResult,
    pub encounters: Vec<EncounterReport>,
    /// The party as it stood when the adventure ended.
    pub party: Vec<PartyMember>,
}

/// A single play-through of one adventure.
pub struct AdventureSession<S, D = RngDice<StdRng>> {
    id: SessionId,
    config: SessionConfig,
    store: S,
    dice: D,
    pristine: Adventure,
    current: Adventure,
}

impl<S: AdventureStore> AdventureSession<S> {
    /// Open a session with dice seeded from the config.
    pub fn open(config: SessionConfig, store: S) -> Result<Self> {
        let dice = match config.seed {
            Some(seed) => RngDice::seeded(seed),
            None => RngDice::from_entropy(),
        };
        Self::open_with_dice(config, store, dice)
    }
}

impl<S: AdventureStore, D: Dice> AdventureSession<S, D> {
    /// Open a session with caller-supplied dice.
    pub fn open_with_dice(config: SessionConfig, store: S, dice: D) -> Result<Self> {
        let current = store.load_adventure(&config.adventure_name)?;
        if current.encounters.len() != current.num_encounters {
            return Err(EngineError::invariant(format!(
                "adventure '{}' declares {} encounters but has {}",
                current.name,
                current.num_encounters,
                current.encounters.len()
            )));
        }

        let id = SessionId::new();
        info!(
            session = %id,
            adventure = %current.name,
            encounters = current.num_encounters,
            "Session opened"
        );
        Ok(Self {
            id,
            pristine: current.without_party(),
            current,
            config,
            store,
            dice,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The latest committed snapshot.
    pub fn adventure(&self) -> &Adventure {
        &self.current
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn dice_mut(&mut self) -> &mut D {
        &mut self.dice
    }

    /// Build the party from roster characters and write it back.
    pub fn assemble_party(&mut self, names: &[&str]) -> Result<&[PartyMember]> {
        if names.is_empty() {
            return Err(EngineError::invariant("a party needs at least one member"));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(EngineError::invariant(format!(
                    "'{name}' was selected twice"
                )));
            }
        }

        let roster = self.store.load_character_roster()?;
        let party = names
            .iter()
            .map(|name| {
                roster
                    .iter()
                    .find(|c| c.name == *name)
                    .map(|c| PartyMember::new(c.normalized()))
                    .ok_or_else(|| EngineError::not_found("character", *name))
            })
            .collect::<Result<Vec<_>>>()?;

        let adventure = self.current.with_party(party);
        self.store.save_adventure(&adventure)?;
        self.current = adventure;
        info!(session = %self.id, members = names.len(), "Party assembled");
        Ok(self.current.party.as_slice())
    }

    /// Start encounter `index` from the latest snapshot.
    pub fn begin_encounter(&self, index: usize) -> Result<EncounterState> {
        EncounterState::begin(self.current.clone(), index)
    }

    /// Write an encounter state's adventure back to the store.
    pub fn commit(&mut self, state: &EncounterState) -> Result<()> {
        let adventure = state.adventure();
        if adventure.name != self.current.name {
            return Err(EngineError::invariant(format!(
                "state belongs to '{}', session plays '{}'",
                adventure.name, self.current.name
            )));
        }
        self.store.save_adventure(adventure)?;
        self.current = adventure.clone();
        Ok(())
    }

    /// Run one encounter through every phase, committing after each.
    pub fn play_encounter(&mut self, index: usize) -> Result<EncounterReport> {
        let rules = self.config.combat_rules();

        let state = self.begin_encounter(index)?;
        let (state, preparation) = state.run_preparation(&mut self.dice)?;
        self.commit(&state)?;

        let (mut state, initiative) = state.roll_initiative(&mut self.dice)?;
        let mut rounds = Vec::new();
        while state.phase() == Phase::Combat {
            let (next, round) = state.run_combat_round(&rules, &mut self.dice)?;
            self.commit(&next)?;
            rounds.push(round);
            state = next;
        }

        let outcome = state
            .outcome()
            .ok_or_else(|| EngineError::invariant("combat ended without an outcome"))?;
        let short_rest = if state.phase() == Phase::ShortRest {
            let (rested, report) = state.run_short_rest(&mut self.dice)?;
            self.commit(&rested)?;
            Some(report)
        } else {
            None
        };

        Ok(EncounterReport {
            index,
            preparation,
            initiative,
            rounds,
            outcome,
            short_rest,
        })
    }

    /// Play every encounter in order. A wiped party aborts the adventure.
    pub fn play(&mut self) -> Result<AdventureReport> {
        if self.current.party.is_empty() {
            return Err(EngineError::invariant(format!(
                "adventure '{}' has no party",
                self.current.name
            )));
        }

        let mut encounters = Vec::with_capacity(self.current.num_encounters);
        let mut result = AdventureResult::Completed;
        for index in 0..self.current.num_encounters {
            let report = self.play_encounter(index)?;
            let wiped = report.outcome == CombatOutcome::PartyWiped;
            encounters.push(report);
            if wiped {
                warn!(session = %self.id, encounter = index, "Party wiped out");
                result = AdventureResult::Aborted { encounter: index };
                break;
            }
        }

        let party = self.current.party.clone();
        self.finish()?;
        info!(session = %self.id, ?result, "Adventure finished");
        Ok(AdventureReport {
            adventure: self.current.name.clone(),
            result,
            encounters,
            party,
        })
    }

    fn finish(&mut self) -> Result<()> {
        if self.config.restore_on_finish {
            self.store.save_adventure(&self.pristine)?;
            self.current = self.pristine.clone();
        }
        Ok(())
    }
}
