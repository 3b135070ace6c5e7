//! Stat battle client binary.
//!
//! Composition root: loads configuration, assembles the runtime through
//! `client-bootstrap`, attaches the log renderer and lets a simulated player
//! play the configured number of matches.
//!
//! ```bash
//! BATTLE_MATCHES=3 BATTLE_SKIP_COOLDOWN=true cargo run -p battle-client
//! ```
mod logging;

use anyhow::{Context, Result};
use client_bootstrap::{ClientConfig, SessionBuilder, SimulatedPlayer};
use runtime::TracingRenderSink;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();
    let _log_guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!(
        matches = config.matches,
        round_timer_secs = config.round_timer_secs,
        cooldown_secs = config.cooldown_secs,
        "Starting battle client"
    );

    let setup = SessionBuilder::new(config).build().await?;
    let handle = setup.runtime.handle();
    TracingRenderSink.attach(handle.event_bus());

    let player = SimulatedPlayer::new(
        handle.clone(),
        setup.config.auto_select,
        setup.config.player_delay,
    );

    let mut wins = 0;
    for index in 1..=setup.config.matches {
        if index > 1 {
            handle
                .restart_match()
                .await
                .context("failed to reset for the next match")?;
        }

        let concluded = player.play_match().await?;
        if concluded.winner == Some(battle_core::Side::A) {
            wins += 1;
        }
        tracing::info!(
            match_index = index,
            winner = ?concluded.winner,
            score_a = concluded.score.a,
            score_b = concluded.score.b,
            "Match finished"
        );
    }

    tracing::info!(
        wins,
        played = setup.config.matches,
        transitions = setup.log.records().len(),
        "All matches played"
    );

    setup
        .runtime
        .shutdown()
        .await
        .context("runtime did not shut down cleanly")?;
    Ok(())
}
