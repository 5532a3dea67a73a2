//! Offline simulation
//!
//! Runs `SIM_BLOCKS` blocks in-process with the configured rivals and
//! strategy, then prints what the predictor won and what it paid.

use anyhow::Result;
use rollcheck_host::{Config, Session};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from_env();
    info!("╔═══════════════════════════════════════════════╗");
    info!("║          rollcheck offline simulation         ║");
    info!("╚═══════════════════════════════════════════════╝");
    info!("  Blocks:    {}", config.sim_blocks);
    info!("  Strategy:  {:?}", config.strategy);
    info!("  Rivals:    {} (p={})", config.rival_count, config.rival_play_probability);
    info!("  Seed:      {}", config.seed);

    let mut session = Session::new(&config)?;
    let mut rival_plays = 0usize;
    for number in 1..=config.sim_blocks {
        // one second per block keeps timestamps deterministic
        let report = session.step(number);
        rival_plays += report.rival_plays;
    }

    let summary = session.summary();
    let stats = &summary.operator;
    info!("");
    info!("Results after {} blocks:", summary.blocks);
    info!("  Predictor balance:   {} ETH", summary.predictor_balance);
    info!("  Predictor wins:      {}", summary.predictor_wins);
    info!("  Attempts submitted:  {}", stats.submitted);
    info!("  Pre-check skips:     {}", stats.skipped);
    info!(
        "  Predicted losses:    {} (stale pre-checks: {})",
        stats.predicted_losses, stats.stale_prechecks
    );
    info!("  External failures:   {}", stats.external_failures);
    info!("  Underfunded:         {}", stats.insufficient_balance);
    info!("  Rival plays:         {}", rival_plays);
    info!("  Game plays settled:  {} (counter {})", summary.total_plays, summary.sequence_counter);

    Ok(())
}
