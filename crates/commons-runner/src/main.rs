//! Scripted session driver for the Commons workshop game.
//!
//! Runs one full session in-process: a facilitator seat plus a scripted
//! team seat per roster entry, all talking to the same in-memory store
//! exactly as independent clients would talk to a shared remote one.
//! Useful for demoing the game loop and for eyeballing the settlement
//! numbers under structured logging.

mod error;
mod facilitator;
mod team;

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;
use tracing_subscriber::EnvFilter;

use commons_core::SessionConfig;
use commons_sync::MemorySessionStore;

use crate::error::RunnerError;
use crate::facilitator::run_facilitator;
use crate::team::{demo_roster, run_team};

/// Application entry point.
///
/// Initializes logging, loads the session configuration, then runs the
/// facilitator and the scripted teams to completion.
///
/// # Errors
///
/// Returns an error if configuration loading or any scripted seat fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("commons-runner starting");
    let started_at = chrono::Utc::now();

    // Optional YAML override; defaults otherwise.
    let config = match std::env::var("COMMONS_CONFIG") {
        Ok(path) => SessionConfig::load_from_path(std::path::Path::new(&path))?,
        Err(_) => SessionConfig::default(),
    };
    info!(
        total_rounds = config.total_rounds,
        initial_tokens = config.initial_tokens,
        base_multiplier = config.base_multiplier,
        final_round_multiplier = config.final_round_multiplier,
        "configuration loaded"
    );

    let store = Arc::new(MemorySessionStore::new());
    let roster = demo_roster();
    info!(teams = roster.len(), "spawning scripted seats");

    let mut seats = Vec::with_capacity(roster.len().saturating_add(1));
    seats.push(tokio::spawn(run_facilitator(
        Arc::clone(&store),
        config.clone(),
        roster.len(),
    )));
    for script in roster {
        seats.push(tokio::spawn(run_team(
            Arc::clone(&store),
            config.clone(),
            script,
        )));
    }

    let results = try_join_all(seats).await?;
    results
        .into_iter()
        .collect::<Result<Vec<()>, RunnerError>>()?;

    let elapsed = chrono::Utc::now().signed_duration_since(started_at);
    info!(elapsed_ms = elapsed.num_milliseconds(), "session complete");
    Ok(())
}
