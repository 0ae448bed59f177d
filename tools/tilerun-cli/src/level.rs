//! Level commands

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use tilerun_core::{LevelContent, LevelId, UserId};
use tilerun_shared::LevelResponse;

use crate::ledger::{LedgerArgs, api_error, print_json, settle};
use crate::replay::read_replay_bytes;

/// Level subcommands
#[derive(Subcommand)]
pub enum LevelAction {
    /// Publish a new level, or overwrite one of yours
    Publish {
        /// Publishing user
        #[arg(long)]
        user: u32,

        /// Level title (unique across levels)
        #[arg(long)]
        title: String,

        /// Level description
        #[arg(long, default_value = "")]
        description: String,

        /// File holding the level code
        #[arg(long)]
        code: PathBuf,

        /// Replay of the author clearing the level
        #[arg(long)]
        verification: PathBuf,

        /// Verification file holds base64 text
        #[arg(long)]
        base64: bool,

        /// Existing level to overwrite (default: look up by title)
        #[arg(long)]
        level: Option<u32>,

        /// Confirm replacing an existing level
        #[arg(long)]
        overwrite: bool,
    },
}

/// Execute a level action
pub fn execute(action: LevelAction, ledger: &LedgerArgs) -> Result<()> {
    match action {
        LevelAction::Publish {
            user,
            title,
            description,
            code,
            verification,
            base64,
            level,
            overwrite,
        } => {
            let code = std::fs::read_to_string(&code)
                .with_context(|| format!("Failed to read level code: {}", code.display()))?;
            let content = LevelContent {
                code: code.trim().to_string(),
                title,
                description,
            };
            let bytes = read_replay_bytes(&verification, base64)?;

            let engine = ledger.open()?;
            let replay = engine.decode(&bytes).map_err(api_error)?;
            let target = level.map(LevelId);
            let result = engine
                .levels()
                .publish(target, content, replay, UserId(user), overwrite);
            let published = settle(&engine, result)?;

            let summary = engine
                .leaderboard()
                .summary(published.id, Some(UserId(user)))
                .map_err(api_error)?;
            print_json(&LevelResponse::from(&summary))
        }
    }
}
