//! QA tests for the storage port: JSON round-trips and store failures.
//! Run with: `cargo test -p adventure-core --test qa_persistence`

use adventure_core::testing::{
    goblin, orc, roster, roster_store, scenario_adventure, FailingStore, ScriptedDice,
};
use adventure_core::{
    Adventure, AdventureSession, AdventureStore, EngineError, Encounter, JsonStore,
    SessionConfig, StorageError,
};
use tempfile::TempDir;

// =============================================================================
// TEST 1: Adventure round-trip
// =============================================================================

#[test]
fn test_adventure_round_trip_preserves_monsters_and_hp() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut store = JsonStore::open(temp_dir.path()).expect("Failed to open store");

    let adventure = scenario_adventure()
        .with_encounter(0, Encounter::new(vec![orc(12), goblin(3), goblin(0), orc(1)]));
    let wounded: Vec<_> = adventure
        .party
        .iter()
        .enumerate()
        .map(|(i, m)| m.with_hit_points(m.hit_points - i as i32 * 4))
        .collect();
    let adventure = adventure.with_party(wounded);

    store.save_adventure(&adventure).expect("save should succeed");
    let loaded = store.load_adventure("Ogre Den").expect("load should succeed");

    assert_eq!(loaded.encounters, adventure.encounters);
    let hp: Vec<i32> = loaded.party.iter().map(|m| m.hit_points).collect();
    assert_eq!(hp, vec![20, 11, 4]);
    assert_eq!(loaded, adventure);
}

#[test]
fn test_save_replaces_by_name() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut store = JsonStore::open(temp_dir.path()).expect("Failed to open store");

    store
        .save_adventure(&scenario_adventure())
        .expect("first save");
    store
        .save_adventure(&Adventure::new("Crypt", vec![Encounter::new(vec![goblin(4)])]))
        .expect("second save");
    store
        .save_adventure(&scenario_adventure().without_party())
        .expect("replacing save");

    let names = store.list_adventures().expect("list");
    assert_eq!(names, vec!["Ogre Den".to_string(), "Crypt".to_string()]);
    assert!(store
        .load_adventure("Ogre Den")
        .expect("load")
        .party
        .is_empty());
}

#[test]
fn test_stored_json_uses_readable_tags() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut store = JsonStore::open(temp_dir.path()).expect("Failed to open store");
    store
        .save_adventure(&scenario_adventure())
        .expect("save should succeed");

    let text = std::fs::read_to_string(temp_dir.path().join("adventures.json"))
        .expect("store file exists");
    let json: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");

    assert_eq!(json["version"], 1);
    let adventure = &json["items"][0];
    assert_eq!(adventure["num_encounters"], 1);
    assert_eq!(adventure["encounters"][0][0]["damage_dice"], "d6");
    assert_eq!(adventure["encounters"][0][0]["challenge"], "Normal");
    assert_eq!(adventure["party"][2]["character"]["class"], "Wizard");
    assert!(adventure["party"][2].get("shield").is_none());
}

// =============================================================================
// TEST 2: Session over a JSON store
// =============================================================================

#[test]
fn test_session_restores_adventure_after_play() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut store = JsonStore::open(temp_dir.path()).expect("Failed to open store");
    store
        .save_adventure(&scenario_adventure().without_party())
        .expect("seed adventure");
    store.save_character_roster(&roster()).expect("seed roster");

    let config = SessionConfig::new("Ogre Den").with_seed(11);
    let mut session = AdventureSession::open(config, store).expect("open session");
    session
        .assemble_party(&["Brann", "Mira", "Zed"])
        .expect("assemble party");
    let report = session.play().expect("play");
    assert_eq!(report.encounters.len(), 1);
    assert_eq!(report.party.len(), 3);

    let store = session.into_store();
    let stored = store.load_adventure("Ogre Den").expect("load");
    assert!(stored.party.is_empty());
    assert_eq!(stored.encounters, scenario_adventure().encounters);
}

// =============================================================================
// TEST 3: Storage failures surface unchanged
// =============================================================================

#[test]
fn test_write_failure_is_reported_and_snapshot_kept() {
    let mut session = AdventureSession::open_with_dice(
        SessionConfig::new("Ogre Den"),
        FailingStore::new(roster_store()),
        ScriptedDice::new(vec![3]),
    )
    .expect("reads still work");

    let err = session
        .assemble_party(&["Brann"])
        .expect_err("write should fail");
    assert!(matches!(
        err,
        EngineError::Storage(StorageError::Backend(_))
    ));
    assert!(session.adventure().party.is_empty());
}

#[test]
fn test_unknown_character_is_not_found() {
    let mut session = AdventureSession::open_with_dice(
        SessionConfig::new("Ogre Den"),
        roster_store(),
        ScriptedDice::new(vec![3]),
    )
    .expect("open session");

    let err = session
        .assemble_party(&["Nobody"])
        .expect_err("unknown name");
    assert!(matches!(
        err,
        EngineError::NotFound {
            kind: "character",
            ..
        }
    ));
}
