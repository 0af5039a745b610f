//! Play a seeded two-encounter adventure against an in-memory store and
//! print what happened.
//!
//! Run with: `cargo run -p adventure-core --example seeded_adventure [seed]`
//! Set `RUST_LOG=adventure_core=debug` to see every resolved action.

use adventure_core::encounter::TurnAction;
use adventure_core::testing::{goblin, orc, roster_store};
use adventure_core::{Adventure, AdventureSession, Encounter, SessionConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adventure_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let seed = std::env::args()
        .nth(1)
        .map(|s| s.parse::<u64>())
        .transpose()?
        .unwrap_or(7);

    let adventure = Adventure::new(
        "Goblin Caves",
        vec![
            Encounter::new(vec![goblin(6), goblin(6), goblin(6)]),
            Encounter::new(vec![orc(14)]),
        ],
    );
    let store = roster_store().with_adventure(adventure);

    println!("=== Goblin Caves (seed {seed}) ===\n");
    let config = SessionConfig::new("Goblin Caves").with_seed(seed);
    let mut session = AdventureSession::open(config, store)?;
    for member in session.assemble_party(&["Brann", "Mira", "Zed", "Paz"])? {
        println!(
            "{:>6}  {:<10} HP {}/{}",
            member.name(),
            member.class(),
            member.hit_points,
            member.max_hit_points
        );
    }

    let report = session.play()?;
    for encounter in &report.encounters {
        println!("\n--- Encounter {} ---", encounter.index + 1);
        let order: Vec<String> = encounter
            .initiative
            .iter()
            .map(|c| format!("{} ({})", c.name, c.initiative))
            .collect();
        println!("Initiative: {}", order.join(", "));

        for round in &encounter.rounds {
            let acted = round
                .turns
                .iter()
                .filter(|t| !matches!(t.action, TurnAction::Skipped))
                .count();
            println!("Round {}: {acted} actions, {:?}", round.round, round.status);
        }
        println!("Outcome: {:?}", encounter.outcome);
        if let Some(rest) = &encounter.short_rest {
            println!("XP awarded: {}", rest.xp_awarded);
            for advancement in &rest.advancements {
                println!(
                    "  {} reaches level {} as {}",
                    advancement.name, advancement.level, advancement.class
                );
            }
        }
    }

    println!("\nResult: {:?}", report.result);
    Ok(())
}
