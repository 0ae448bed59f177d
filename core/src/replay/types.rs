//! Core types for the replay system
//!
//! A replay is an 84-byte header followed by a packed stream of input frames,
//! one frame per 10ms simulation tick.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size of the fixed header block in bytes.
pub const HEADER_SIZE: usize = 84;
/// Width of the NUL-padded format tag.
pub const FORMAT_TAG_LEN: usize = 12;
/// Width of the NUL-padded player name.
pub const PLAYER_NAME_LEN: usize = 59;
/// Bytes in one packed frame group.
pub const GROUP_BYTES: usize = 3;
/// Frames carried by one packed frame group.
pub const FRAMES_PER_GROUP: usize = 4;
/// Bits used by one frame inside a group.
pub const BITS_PER_FRAME: u32 = 6;
/// Simulation rate the inputs were captured at.
pub const FRAMES_PER_SECOND: u32 = 100;
/// Simulated time covered by one frame.
pub const FRAME_DURATION: Duration = Duration::from_millis(10);

/// Decoded replay header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayHeader {
    /// Game build tag the replay was recorded with
    pub format_version: String,
    /// Level played, or -1 if the run was not on a published level
    pub level_id: i32,
    /// Recording time (seconds since the Unix epoch)
    pub created_at: i32,
    /// Name of the player who recorded the run
    pub player_name: String,
    /// Alternate control scheme
    pub used_alt_controls: bool,
    /// Declared completion time in seconds
    pub elapsed_time: f32,
}

impl Default for ReplayHeader {
    fn default() -> Self {
        Self {
            format_version: String::new(),
            level_id: -1,
            created_at: 0,
            player_name: String::new(),
            used_alt_controls: false,
            elapsed_time: 0.0,
        }
    }
}

bitflags::bitflags! {
    /// Control signals held during one frame, in wire bit order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputFrame: u8 {
        const LEFT = 0b0000_0001;
        const RIGHT = 0b0000_0010;
        const JUMP = 0b0000_0100;
        const DASH = 0b0000_1000;
        const UP = 0b0001_0000;
        const DOWN = 0b0010_0000;
    }
}

impl InputFrame {
    /// Signals in wire order: left, right, jump, dash, up, down.
    pub fn signals(self) -> [bool; 6] {
        [
            self.contains(Self::LEFT),
            self.contains(Self::RIGHT),
            self.contains(Self::JUMP),
            self.contains(Self::DASH),
            self.contains(Self::UP),
            self.contains(Self::DOWN),
        ]
    }

    /// Inverse of [`InputFrame::signals`].
    pub fn from_signals(signals: [bool; 6]) -> Self {
        signals
            .iter()
            .enumerate()
            .filter(|(_, held)| **held)
            .fold(Self::empty(), |acc, (bit, _)| {
                acc | Self::from_bits_truncate(1 << bit)
            })
    }
}

// Manual serde implementation for InputFrame
impl Serialize for InputFrame {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InputFrame {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(InputFrame::from_bits_truncate(bits))
    }
}

/// A decoded, consistency-checked replay.
///
/// Only the decoder constructs these, so holding one means the bytes passed
/// the length and duration checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayRecord {
    header: ReplayHeader,
    frames: Vec<InputFrame>,
    raw: Vec<u8>,
}

impl ReplayRecord {
    pub(crate) fn new(header: ReplayHeader, frames: Vec<InputFrame>, raw: Vec<u8>) -> Self {
        Self {
            header,
            frames,
            raw,
        }
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    pub fn frames(&self) -> &[InputFrame] {
        &self.frames
    }

    /// Get inputs for a specific frame
    pub fn frame(&self, step: usize) -> Option<InputFrame> {
        self.frames.get(step).copied()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The bytes this record was decoded from, for verbatim storage.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Simulated time covered by the recorded input stream.
    pub fn recorded_duration(&self) -> Duration {
        Duration::from_millis(FRAME_DURATION.as_millis() as u64 * self.frames.len() as u64)
    }

    /// Declared completion time in seconds.
    pub fn elapsed_time(&self) -> f32 {
        self.header.elapsed_time
    }

    pub fn into_parts(self) -> (ReplayHeader, Vec<InputFrame>, Vec<u8>) {
        (self.header, self.frames, self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_roundtrip_every_combination() {
        for bits in 0u8..64 {
            let frame = InputFrame::from_bits_truncate(bits);
            assert_eq!(InputFrame::from_signals(frame.signals()), frame);
        }
    }

    #[test]
    fn test_signal_order() {
        let frame = InputFrame::JUMP | InputFrame::DOWN;
        assert_eq!(frame.signals(), [false, false, true, false, false, true]);
        assert_eq!(frame.bits(), 0b10_0100);
    }

    #[test]
    fn test_upper_bits_are_dropped() {
        assert_eq!(InputFrame::from_bits_truncate(0xFF).bits(), 0b11_1111);
    }

    #[test]
    fn test_recorded_duration() {
        let record = ReplayRecord::new(
            ReplayHeader::default(),
            vec![InputFrame::empty(); 250],
            Vec::new(),
        );
        assert_eq!(record.recorded_duration(), Duration::from_millis(2500));
        assert_eq!(record.frame(249), Some(InputFrame::empty()));
        assert_eq!(record.frame(250), None);
    }
}
