//! Binary replay format reader
//!
//! Decodes and validates replay bytes. Decoding is pure and never panics on
//! adversarial input: the total length is checked before any field is read
//! and every read goes through a bounds-checked cursor.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Cursor, Read};

use super::bits::unpack_group;
use crate::replay::types::*;

/// Maximum allowed gap between declared and recorded duration, in seconds.
pub const DEFAULT_DURATION_TOLERANCE_SECS: f64 = 0.25;

/// Reasons a replay is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Length is not a whole header plus whole frame groups
    #[error("replay truncated: {len} bytes is not an 84-byte header plus 3-byte frame groups")]
    Truncated { len: usize },

    /// Declared time disagrees with the recorded input length
    #[error("replay declares {declared}s but records {frames} frames ({recorded:.2}s)")]
    DurationMismatch {
        frames: usize,
        declared: f32,
        recorded: f64,
    },

    /// A header field holds a value no recorder produces
    #[error("malformed replay header: {field} {reason}")]
    MalformedHeader {
        field: &'static str,
        reason: &'static str,
    },

    /// Transport text was not standard base64
    #[error("replay is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Tunables for [`decode_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeOptions {
    /// Allowed `|frames * 0.01 - elapsed_time|`, in seconds
    pub duration_tolerance_secs: f64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            duration_tolerance_secs: DEFAULT_DURATION_TOLERANCE_SECS,
        }
    }
}

/// Decode replay bytes with the default tolerance.
pub fn decode(bytes: &[u8]) -> Result<ReplayRecord, DecodeError> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decode replay bytes, checking declared time against the input stream.
pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<ReplayRecord, DecodeError> {
    check_length(bytes.len())?;

    let mut reader = BinaryReader::new(bytes);
    let header = reader.read_header()?;
    let frames = reader.read_frames()?;

    check_duration(frames.len(), header.elapsed_time, options.duration_tolerance_secs)?;

    Ok(ReplayRecord::new(header, frames, bytes.to_vec()))
}

/// Reject lengths that are not `84 + 3k`.
pub fn check_length(len: usize) -> Result<(), DecodeError> {
    if len < HEADER_SIZE || (len - HEADER_SIZE) % GROUP_BYTES != 0 {
        return Err(DecodeError::Truncated { len });
    }
    Ok(())
}

/// Accept iff `|frames * 0.01 - declared| <= tolerance`.
///
/// This only catches replays whose declared time does not match their own
/// input length. A replay crafted to be internally consistent passes.
pub fn check_duration(frames: usize, declared: f32, tolerance: f64) -> Result<(), DecodeError> {
    let recorded = frames as f64 / f64::from(FRAMES_PER_SECOND);
    if (recorded - f64::from(declared)).abs() > tolerance {
        return Err(DecodeError::DurationMismatch {
            frames,
            declared,
            recorded,
        });
    }
    Ok(())
}

/// Reader for binary replay format
struct BinaryReader<'a> {
    reader: Cursor<&'a [u8]>,
}

impl<'a> BinaryReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: Cursor::new(bytes),
        }
    }

    fn len(&self) -> usize {
        self.reader.get_ref().len()
    }

    /// Read the 84-byte header
    fn read_header(&mut self) -> Result<ReplayHeader, DecodeError> {
        let mut tag = [0u8; FORMAT_TAG_LEN];
        self.reader.read_exact(&mut tag).map_err(truncated(self.len()))?;
        let level_id = self.reader.read_i32::<LittleEndian>().map_err(truncated(self.len()))?;
        let created_at = self.reader.read_i32::<LittleEndian>().map_err(truncated(self.len()))?;
        let mut name = [0u8; PLAYER_NAME_LEN];
        self.reader.read_exact(&mut name).map_err(truncated(self.len()))?;
        let alt = self.reader.read_u8().map_err(truncated(self.len()))?;
        let elapsed_time = self.reader.read_f32::<LittleEndian>().map_err(truncated(self.len()))?;

        if !elapsed_time.is_finite() {
            return Err(DecodeError::MalformedHeader {
                field: "elapsed_time",
                reason: "is not finite",
            });
        }
        if elapsed_time < 0.0 {
            return Err(DecodeError::MalformedHeader {
                field: "elapsed_time",
                reason: "is negative",
            });
        }

        Ok(ReplayHeader {
            format_version: read_padded_text(&tag, "format_version")?,
            level_id,
            created_at,
            player_name: read_padded_text(&name, "player_name")?,
            used_alt_controls: alt != 0,
            elapsed_time,
        })
    }

    /// Read the packed input stream that follows the header
    fn read_frames(&mut self) -> Result<Vec<InputFrame>, DecodeError> {
        let remaining = self.len().saturating_sub(self.reader.position() as usize);
        let mut frames = Vec::with_capacity(remaining / GROUP_BYTES * FRAMES_PER_GROUP);

        let mut group = [0u8; GROUP_BYTES];
        for _ in 0..remaining / GROUP_BYTES {
            self.reader.read_exact(&mut group).map_err(truncated(self.len()))?;
            frames.extend_from_slice(&unpack_group(group));
        }

        Ok(frames)
    }
}

fn truncated(len: usize) -> impl Fn(io::Error) -> DecodeError {
    move |err| {
        tracing::debug!(error = %err, len, "replay read past end of buffer");
        DecodeError::Truncated { len }
    }
}

/// Text up to the first NUL; must be printable ASCII.
fn read_padded_text(bytes: &[u8], field: &'static str) -> Result<String, DecodeError> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = &bytes[..end];
    if !text.iter().all(|b| (0x20..=0x7E).contains(b)) {
        return Err(DecodeError::MalformedHeader {
            field,
            reason: "is not printable ASCII",
        });
    }
    Ok(text.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::binary::writer::encode;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg64;

    fn header(elapsed_time: f32) -> ReplayHeader {
        ReplayHeader {
            format_version: "v1.4.2".to_string(),
            level_id: 17,
            created_at: 1_700_000_000,
            player_name: "speedy".to_string(),
            used_alt_controls: true,
            elapsed_time,
        }
    }

    fn raw_replay(groups: usize, elapsed_time: f32) -> Vec<u8> {
        let frames = vec![InputFrame::RIGHT; groups * FRAMES_PER_GROUP];
        encode(&header(elapsed_time), &frames).unwrap()
    }

    #[test]
    fn test_decode_header_fields() {
        let record = decode(&raw_replay(25, 1.0)).unwrap();
        assert_eq!(record.header(), &header(1.0));
        assert_eq!(record.frame_count(), 100);
        assert!(record.frames().iter().all(|f| *f == InputFrame::RIGHT));
    }

    #[test]
    fn test_decode_keeps_raw_bytes() {
        let bytes = raw_replay(3, 0.12);
        let record = decode(&bytes).unwrap();
        assert_eq!(record.raw(), bytes.as_slice());
    }

    #[test]
    fn test_header_offsets_are_bit_exact() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[..3].copy_from_slice(b"0.9");
        bytes[12..16].copy_from_slice(&(-1i32).to_le_bytes());
        bytes[16..20].copy_from_slice(&1234i32.to_le_bytes());
        bytes[20..23].copy_from_slice(b"bob");
        bytes[79] = 7;
        bytes[80..84].copy_from_slice(&0.2f32.to_le_bytes());

        let record = decode(&bytes).unwrap();
        let h = record.header();
        assert_eq!(h.format_version, "0.9");
        assert_eq!(h.level_id, -1);
        assert_eq!(h.created_at, 1234);
        assert_eq!(h.player_name, "bob");
        assert!(h.used_alt_controls);
        assert_eq!(h.elapsed_time, 0.2);
        assert_eq!(record.frame_count(), 0);
    }

    #[test]
    fn test_truncated_lengths() {
        for len in [0, 1, 83, 85, 86, 88, 89] {
            let bytes = vec![0u8; len];
            assert_eq!(decode(&bytes), Err(DecodeError::Truncated { len }), "len {len}");
        }
        assert!(decode(&[0u8; 84]).is_ok());
        assert!(decode(&[0u8; 87]).is_ok());
    }

    #[test]
    fn test_duration_bound_is_inclusive() {
        // 100 frames = 1.00s
        assert!(decode(&raw_replay(25, 1.25)).is_ok());
        assert!(decode(&raw_replay(25, 0.75)).is_ok());
        assert!(matches!(
            decode(&raw_replay(25, 1.26)),
            Err(DecodeError::DurationMismatch { frames: 100, .. })
        ));
        assert!(matches!(
            decode(&raw_replay(25, 0.74)),
            Err(DecodeError::DurationMismatch { frames: 100, .. })
        ));
    }

    #[test]
    fn test_duration_bound_over_many_lengths() {
        for groups in 0..200usize {
            let recorded = (groups * FRAMES_PER_GROUP) as f64 / 100.0;
            for offset in [-0.5f64, -0.3, -0.2, 0.0, 0.1, 0.24, 0.3, 1.0] {
                let declared = recorded + offset;
                if declared < 0.0 {
                    continue;
                }
                let declared = declared as f32;
                let expected_ok = (recorded - f64::from(declared)).abs() <= 0.25;
                let result = decode(&raw_replay(groups, declared));
                assert_eq!(result.is_ok(), expected_ok, "groups {groups} declared {declared}");
            }
        }
    }

    #[test]
    fn test_custom_tolerance() {
        let bytes = raw_replay(25, 1.5);
        assert!(decode(&bytes).is_err());
        let loose = DecodeOptions {
            duration_tolerance_secs: 0.5,
        };
        assert!(decode_with(&bytes, &loose).is_ok());
    }

    #[test]
    fn test_malformed_text() {
        let mut bytes = raw_replay(0, 0.0);
        bytes[2] = 0x07;
        assert_eq!(
            decode(&bytes),
            Err(DecodeError::MalformedHeader {
                field: "format_version",
                reason: "is not printable ASCII",
            })
        );

        let mut bytes = raw_replay(0, 0.0);
        bytes[20] = 0xC3;
        assert!(matches!(
            decode(&bytes),
            Err(DecodeError::MalformedHeader {
                field: "player_name",
                ..
            })
        ));
    }

    #[test]
    fn test_text_stops_at_first_nul() {
        let mut bytes = raw_replay(0, 0.0);
        // garbage after the terminator is ignored
        bytes[20..30].copy_from_slice(b"ann\0\xFF\xFF\xFF\xFF\xFF\xFF");
        assert_eq!(decode(&bytes).unwrap().header().player_name, "ann");
    }

    #[test]
    fn test_malformed_elapsed_time() {
        for bad in [f32::NAN, f32::INFINITY, -1.0] {
            let mut bytes = raw_replay(0, 0.0);
            bytes[80..84].copy_from_slice(&bad.to_le_bytes());
            assert!(matches!(
                decode(&bytes),
                Err(DecodeError::MalformedHeader {
                    field: "elapsed_time",
                    ..
                })
            ));
        }
    }

    /// Random frame payloads under a well-formed header decode to exactly 4k frames
    /// or fail the duration check, nothing else.
    #[test]
    fn test_random_payloads_decode_to_whole_groups() {
        let mut rng = Pcg64::seed_from_u64(0x7171_5eed);
        for _ in 0..500 {
            let groups = rng.random_range(0..400usize);
            let declared = rng.random_range(0.0f32..5.0);
            let mut bytes = encode(&header(declared), &[]).unwrap();
            bytes.extend((0..groups * GROUP_BYTES).map(|_| rng.random::<u8>()));

            match decode(&bytes) {
                Ok(record) => assert_eq!(record.frame_count(), groups * FRAMES_PER_GROUP),
                Err(DecodeError::DurationMismatch { frames, .. }) => {
                    assert_eq!(frames, groups * FRAMES_PER_GROUP)
                }
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
    }

    /// Fully random bytes never panic.
    #[test]
    fn test_random_bytes_never_panic() {
        let mut rng = Pcg64::seed_from_u64(42);
        for _ in 0..2000 {
            let len = rng.random_range(0..400usize);
            let bytes: Vec<u8> = (0..len).map(|_| rng.random::<u8>()).collect();
            match decode(&bytes) {
                Ok(record) => assert_eq!(record.frame_count(), (len - HEADER_SIZE) / 3 * 4),
                Err(DecodeError::Truncated { len: reported }) => assert_eq!(reported, len),
                Err(DecodeError::DurationMismatch { .. } | DecodeError::MalformedHeader { .. }) => {}
                Err(DecodeError::Base64(_)) => unreachable!(),
            }
        }
    }
}
