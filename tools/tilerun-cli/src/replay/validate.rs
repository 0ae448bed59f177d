//! Validate a replay the way an upload would be checked

use anyhow::Result;
use std::path::Path;

use tilerun_core::replay::{DecodeOptions, decode_with};

/// Validate a replay
pub fn execute(path: &Path, base64: bool, options: &DecodeOptions) -> Result<()> {
    println!("Validating replay: {}", path.display());

    let bytes = super::read_replay_bytes(path, base64)?;
    match decode_with(&bytes, options) {
        Ok(record) => {
            println!();
            println!("=== Replay Valid ===");
            println!("Bytes: {}", record.raw().len());
            println!("Frames: {}", record.frame_count());
            println!("Declared time: {:.2}s", record.elapsed_time());
            println!(
                "Recorded time: {:.2}s",
                record.recorded_duration().as_secs_f64()
            );
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "replay rejected");
            println!();
            println!("=== Replay Rejected ===");
            println!("  {}", e);
            anyhow::bail!("replay rejected: {}", e)
        }
    }
}
