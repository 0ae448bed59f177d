//! Score commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;

use tilerun_core::{LevelId, ScoreId, UserId};
use tilerun_shared::{ScoreResponse, UploadReplayResponse};

use crate::ledger::{LedgerArgs, api_error, print_json, settle};
use crate::replay::read_replay_bytes;

/// Score subcommands
#[derive(Subcommand)]
pub enum ScoreAction {
    /// Upload a run
    Submit {
        /// Submitting user
        #[arg(long)]
        user: u32,

        /// Level to score against (default: level in the replay header)
        #[arg(long)]
        level: Option<u32>,

        /// Replay file
        file: PathBuf,

        /// File holds base64 text
        #[arg(long)]
        base64: bool,
    },

    /// Hide one of your scores from everyone else
    Hide {
        /// Owner of the score
        #[arg(long)]
        user: u32,

        /// Score id
        score: u32,

        /// Make the score visible again
        #[arg(long)]
        unhide: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitOutput {
    #[serde(flatten)]
    upload: UploadReplayResponse,
    outcome: String,
    score: ScoreResponse,
}

/// Execute a score action
pub fn execute(action: ScoreAction, ledger: &LedgerArgs) -> Result<()> {
    match action {
        ScoreAction::Submit {
            user,
            level,
            file,
            base64,
        } => {
            let bytes = read_replay_bytes(&file, base64)?;
            let engine = ledger.open()?;
            let replay = engine.decode(&bytes).map_err(api_error)?;
            let result = engine
                .ledger()
                .submit_current(replay, UserId(user), level.map(LevelId));
            let submission = settle(&engine, result)?;

            print_json(&SubmitOutput {
                upload: UploadReplayResponse::from(&submission),
                outcome: format!("{:?}", submission.outcome),
                score: ScoreResponse::from(&submission.entry),
            })
        }

        ScoreAction::Hide {
            user,
            score,
            unhide,
        } => {
            let engine = ledger.open()?;
            let result = engine
                .ledger()
                .set_hidden(ScoreId(score), UserId(user), !unhide);
            let entry = settle(&engine, result)?;
            print_json(&ScoreResponse::from(&entry))
        }
    }
}
