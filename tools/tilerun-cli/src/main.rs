//! Tilerun CLI - replay inspection and score ledger tool
//!
//! # Commands
//!
//! - `tilerun replay inspect` - Print a replay's header and input frames
//! - `tilerun replay validate` - Decode and consistency-check a replay
//! - `tilerun replay encode` / `decode-b64` - Convert between raw and base64
//! - `tilerun level publish` - Publish or overwrite a level
//! - `tilerun score submit` / `hide` - Upload a run, change its visibility
//! - `tilerun leaderboard` - Print one page of a level's leaderboard
//!
//! # Usage
//!
//! ```bash
//! # Check a replay before uploading it
//! tilerun replay validate run.rpl
//!
//! # Publish a level with the author's clear, then rank it
//! tilerun level publish --user 1 --title "Cliffs" --code level.txt --verification clear.rpl
//! tilerun score submit --user 2 run.rpl
//! tilerun leaderboard 1 --limit 10
//! ```
//!
//! Ledger commands read `config.toml` from the platform config directory
//! (or `--config`) and operate on the snapshot file it names (or `--store`).

mod leaderboard;
mod ledger;
mod level;
mod replay;
mod score;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Tilerun CLI - replay inspection and score ledger tool
#[derive(Parser)]
#[command(name = "tilerun")]
#[command(about = "Replay verification and score ledger tool")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    ledger: ledger::LedgerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect, validate and convert replay files
    #[command(subcommand)]
    Replay(replay::ReplayAction),

    /// Publish levels
    #[command(subcommand)]
    Level(level::LevelAction),

    /// Submit runs and manage their visibility
    #[command(subcommand)]
    Score(score::ScoreAction),

    /// Print one page of a level's leaderboard
    Leaderboard(leaderboard::LeaderboardArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(action) => replay::execute(action, &cli.ledger),
        Commands::Level(action) => level::execute(action, &cli.ledger),
        Commands::Score(action) => score::execute(action, &cli.ledger),
        Commands::Leaderboard(args) => leaderboard::execute(args, &cli.ledger),
    }
}
