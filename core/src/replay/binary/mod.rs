//! Binary replay format
//!
//! Fixed little-endian layout, bit-exact with existing replay files.
//!
//! # File Structure
//!
//! ```text
//! offset  size  field
//! ------  ----  -------------------------------------------------
//!      0    12  format_version   ASCII, NUL-padded
//!     12     4  level_id         i32 (-1 = not a published level)
//!     16     4  created_at       i32 epoch seconds
//!     20    59  player_name      ASCII, NUL-padded
//!     79     1  used_alt_controls nonzero = true
//!     80     4  elapsed_time     f32 seconds
//!     84   3k   input stream     4 frames per 3 bytes, 6 bits each
//! ```

mod bits;
mod reader;
mod writer;

pub use reader::{
    DEFAULT_DURATION_TOLERANCE_SECS, DecodeError, DecodeOptions, check_duration, check_length,
    decode, decode_with,
};
pub use writer::{BinaryWriter, EncodeError, encode};
