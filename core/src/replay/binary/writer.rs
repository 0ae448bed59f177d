//! Binary replay format writer
//!
//! Produces the exact byte layout the decoder reads. Used by tooling and tests
//! to build replays; the ledger itself only ever stores the bytes it received.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

use super::bits::pack_group;
use crate::replay::types::*;

/// Reasons a header cannot be written.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("{field} is {len} bytes, at most {max} fit")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} must be printable ASCII")]
    NotAscii { field: &'static str },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Encode a header and frame stream into replay bytes.
///
/// The frame stream is padded with empty frames to a multiple of four.
pub fn encode(header: &ReplayHeader, frames: &[InputFrame]) -> Result<Vec<u8>, EncodeError> {
    let groups = frames.len().div_ceil(FRAMES_PER_GROUP);
    let mut buffer = Vec::with_capacity(HEADER_SIZE + groups * GROUP_BYTES);
    let mut writer = BinaryWriter::new(&mut buffer);
    writer.write_header(header)?;
    writer.write_frames(frames)?;
    Ok(buffer)
}

/// Writer for binary replay format
pub struct BinaryWriter<W: Write> {
    writer: W,
}

impl<W: Write> BinaryWriter<W> {
    /// Create a new binary writer
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write the 84-byte header
    pub fn write_header(&mut self, header: &ReplayHeader) -> Result<(), EncodeError> {
        self.write_padded_text(&header.format_version, FORMAT_TAG_LEN, "format_version")?;
        self.writer.write_i32::<LittleEndian>(header.level_id)?;
        self.writer.write_i32::<LittleEndian>(header.created_at)?;
        self.write_padded_text(&header.player_name, PLAYER_NAME_LEN, "player_name")?;
        self.writer.write_u8(u8::from(header.used_alt_controls))?;
        self.writer.write_f32::<LittleEndian>(header.elapsed_time)?;
        Ok(())
    }

    /// Write the packed input stream
    pub fn write_frames(&mut self, frames: &[InputFrame]) -> Result<(), EncodeError> {
        for chunk in frames.chunks(FRAMES_PER_GROUP) {
            let mut group = [InputFrame::empty(); FRAMES_PER_GROUP];
            group[..chunk.len()].copy_from_slice(chunk);
            self.writer.write_all(&pack_group(group))?;
        }
        Ok(())
    }

    fn write_padded_text(
        &mut self,
        text: &str,
        width: usize,
        field: &'static str,
    ) -> Result<(), EncodeError> {
        let bytes = text.as_bytes();
        if !bytes.iter().all(|b| (0x20..=0x7E).contains(b)) {
            return Err(EncodeError::NotAscii { field });
        }
        // The player name keeps room for a terminating NUL, the tag does not.
        let max = if width == PLAYER_NAME_LEN { width - 1 } else { width };
        if bytes.len() > max {
            return Err(EncodeError::FieldTooLong {
                field,
                len: bytes.len(),
                max,
            });
        }
        self.writer.write_all(bytes)?;
        self.writer.write_all(&vec![0u8; width - bytes.len()])?;
        Ok(())
    }

    /// Consume the writer and return the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}
