//! Convert replays between raw bytes and base64 transport text

use anyhow::{Context, Result};
use std::path::Path;

use tilerun_core::replay::{b64_to_bytes, encode_b64};

/// Print a raw replay file as base64
pub fn encode(path: &Path) -> Result<()> {
    let bytes = super::read_replay_bytes(path, false)?;
    println!("{}", encode_b64(&bytes));
    Ok(())
}

/// Write the raw bytes behind a base64 replay file
pub fn decode_b64(path: &Path, output: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    let bytes = b64_to_bytes(&text).with_context(|| format!("Not valid base64: {}", path.display()))?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write: {}", output.display()))?;

    println!("Wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}
