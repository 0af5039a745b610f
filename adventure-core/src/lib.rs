//! Encounter resolution engine for tabletop-style adventures.
//!
//! This crate provides:
//! - The data model: characters, party members, monsters, adventures
//! - A per-class behavior table for Preparation, Short Rest and Combat
//! - Initiative ordering and a pure damage and healing resolver
//! - The encounter state machine and an adventure session driver
//! - A storage port with in-memory and JSON file implementations
//!
//! # Quick Start
//!
//! ```ignore
//! use adventure_core::{AdventureSession, JsonStore, SessionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JsonStore::open("data")?;
//!     let config = SessionConfig::new("Goblin Caves").with_seed(7);
//!
//!     let mut session = AdventureSession::open(config, store)?;
//!     session.assemble_party(&["Brann", "Mira", "Zed"])?;
//!
//!     let report = session.play()?;
//!     println!("{:?}", report.result);
//!     Ok(())
//! }
//! ```

pub mod classes;
pub mod dice;
pub mod directory;
pub mod encounter;
pub mod error;
pub mod initiative;
pub mod persist;
pub mod rules;
pub mod session;
pub mod testing;
pub mod world;

// Primary public API
pub use dice::{Dice, DiceError, DieType, HitRoll, RngDice};
pub use directory::{EncounterDirectory, MonsterRosterEntry, PartyVitals};
pub use encounter::{CombatOutcome, CombatRules, EncounterState, Phase};
pub use error::EngineError;
pub use initiative::{Combatant, InitiativeOrder, Side};
pub use persist::{AdventureStore, JsonStore, MemoryStore, StorageError};
pub use rules::EncounterStatus;
pub use session::{
    AdventureReport, AdventureResult, AdventureSession, EncounterReport, SessionConfig, SessionId,
};
pub use world::{
    Adventure, Attributes, Challenge, Character, CharacterClass, ClassLine, DamageType, Encounter,
    Monster, PartyMember,
};
