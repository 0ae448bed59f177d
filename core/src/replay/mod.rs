//! Replay codec
//!
//! A replay is a recorded play-through: an 84-byte header describing the run
//! plus one packed [`InputFrame`] per 10ms tick. Decoding is pure and
//! stateless, so it can run in parallel across unrelated uploads.
//!
//! ```text
//! base64 text ─> bytes ─> decode ─> ReplayRecord ─> ScoreLedger
//!                                        │
//!                                        └─> Playback (100Hz frame stream)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tilerun_core::replay::{decode, Playback};
//!
//! let record = decode(&bytes)?;
//! let mut playback = Playback::new(&record);
//! while let Some(inputs) = playback.next() {
//!     // Apply inputs to the ghost
//! }
//! ```

pub mod binary;
pub mod playback;
pub mod transport;
pub mod types;

// Re-export core types
pub use types::{
    FRAME_DURATION, FRAMES_PER_SECOND, HEADER_SIZE, InputFrame, ReplayHeader, ReplayRecord,
};

// Re-export binary format
pub use binary::{
    BinaryWriter, DecodeError, DecodeOptions, EncodeError, decode, decode_with, encode,
};

pub use playback::{Playback, SeekResult};
pub use transport::{b64_to_bytes, decode_b64, encode_b64};
