//! Frame group packing.
//!
//! Three bytes form a little-endian 24-bit group `b0 | b1 << 8 | b2 << 16`.
//! Frame `j` of the group occupies bits `6j..6j + 6`, so frames 1 and 2
//! straddle byte boundaries:
//!
//! ```text
//! byte:   |        b0         |        b1         |        b2         |
//! bit:    |0 1 2 3 4 5 | 6 7  |0 1 2 3 | 4 5 6 7  |0 1 | 2 3 4 5 6 7  |
//! frame:  |     0      |      1          |      2         |     3       |
//! ```

use crate::replay::types::{BITS_PER_FRAME, FRAMES_PER_GROUP, GROUP_BYTES, InputFrame};

const FRAME_MASK: u32 = (1 << BITS_PER_FRAME) - 1;

/// Extract `width` bits of `value` starting at bit `offset`.
pub(crate) const fn bit_window(value: u32, offset: u32, width: u32) -> u32 {
    (value >> offset) & ((1 << width) - 1)
}

/// Assemble three bytes into the 24-bit group value.
pub(crate) const fn group_value(group: [u8; GROUP_BYTES]) -> u32 {
    group[0] as u32 | (group[1] as u32) << 8 | (group[2] as u32) << 16
}

/// Unpack one 3-byte group into its four frames.
pub(crate) fn unpack_group(group: [u8; GROUP_BYTES]) -> [InputFrame; FRAMES_PER_GROUP] {
    let value = group_value(group);
    std::array::from_fn(|slot| {
        let bits = bit_window(value, slot as u32 * BITS_PER_FRAME, BITS_PER_FRAME);
        InputFrame::from_bits_truncate(bits as u8)
    })
}

/// Pack four frames into one 3-byte group.
pub(crate) fn pack_group(frames: [InputFrame; FRAMES_PER_GROUP]) -> [u8; GROUP_BYTES] {
    let value = frames
        .iter()
        .enumerate()
        .fold(0u32, |acc, (slot, frame)| {
            acc | (frame.bits() as u32 & FRAME_MASK) << (slot as u32 * BITS_PER_FRAME)
        });
    [
        bit_window(value, 0, 8) as u8,
        bit_window(value, 8, 8) as u8,
        bit_window(value, 16, 8) as u8,
    ]
}
