//! Replay CLI commands
//!
//! Commands for inspecting, validating and converting replay files.

mod convert;
mod inspect;
mod validate;

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::ledger::LedgerArgs;

/// Replay subcommands
#[derive(Subcommand)]
pub enum ReplayAction {
    /// Print the header and the first input frames
    Inspect {
        /// Replay file
        file: PathBuf,

        /// File holds base64 text instead of raw bytes
        #[arg(long)]
        base64: bool,

        /// Number of frames to print
        #[arg(long, default_value = "20")]
        frames: usize,
    },

    /// Decode and run the consistency checks; fails on rejection
    Validate {
        /// Replay file
        file: PathBuf,

        /// File holds base64 text instead of raw bytes
        #[arg(long)]
        base64: bool,
    },

    /// Print a raw replay as base64
    Encode {
        /// Raw replay file
        file: PathBuf,
    },

    /// Write the raw bytes of a base64 replay
    DecodeB64 {
        /// Base64 text file
        file: PathBuf,

        /// Output raw replay file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Execute a replay action
pub fn execute(action: ReplayAction, ledger: &LedgerArgs) -> Result<()> {
    match action {
        ReplayAction::Inspect {
            file,
            base64,
            frames,
        } => inspect::execute(&file, base64, frames),

        ReplayAction::Validate { file, base64 } => {
            let config = ledger.load_config()?;
            validate::execute(&file, base64, &config.replay.decode_options())
        }

        ReplayAction::Encode { file } => convert::encode(&file),

        ReplayAction::DecodeB64 { file, output } => convert::decode_b64(&file, &output),
    }
}

/// Read a replay file as raw bytes, decoding base64 text if asked to.
pub fn read_replay_bytes(path: &Path, base64: bool) -> Result<Vec<u8>> {
    if base64 {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay: {}", path.display()))?;
        tilerun_core::replay::b64_to_bytes(&text)
            .with_context(|| format!("Not valid base64: {}", path.display()))
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read replay: {}", path.display()))
    }
}
