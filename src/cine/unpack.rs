//! Expansion of packed sensor samples into per-pixel `u16` intensities.
//!
//! Pure functions, no I/O; safe to run on many frames in parallel.

use crate::cine::error::{CineError, Result};

/// Packed byte length of a frame: `ceil(width * height * bit_count / 8)`.
///
/// `None` when the bit total does not fit in `usize`.
pub fn expected_byte_len(width: u32, height: u32, bit_count: u16) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(bit_count as usize)
        .map(|bits| bits.div_ceil(8))
}

/// Expands `raw` into exactly `width * height` samples.
///
/// 8-bit samples are widened, 16-bit samples are little-endian pairs.
/// 10- and 12-bit data is an MSB-first packed bitstream: sample `n`
/// occupies bits `[n*b, n*b + b)` of the byte sequence read big-endian,
/// so for 10-bit data the first sample is `b0 << 2 | b1 >> 6`. The
/// first sample is the top-left pixel.
pub fn unpack(raw: &[u8], width: u32, height: u32, bit_count: u16) -> Result<Vec<u16>> {
    let expected =
        expected_byte_len(width, height, bit_count).ok_or(CineError::InvalidHeaderField {
            field: "bi_width",
            value: width as i64,
        })?;
    if raw.len() != expected {
        return Err(CineError::UnpackLengthMismatch {
            width,
            height,
            bit_count,
            expected,
            actual: raw.len(),
        });
    }

    let pixel_count = width as usize * height as usize;
    match bit_count {
        8 => Ok(raw.iter().map(|&b| b as u16).collect()),
        16 => Ok(raw
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect()),
        10 | 12 => Ok(unpack_msb_first(raw, pixel_count, bit_count as u32)),
        other => Err(CineError::InvalidHeaderField {
            field: "bit_count",
            value: other as i64,
        }),
    }
}

/// Bit-accurate unpack of an MSB-first stream.
///
/// For 10-bit data every 5 bytes carry 4 samples:
/// ```text
/// 00000000 00|000000 0000|0000 000000|00 00000000
/// ----p0-- --|----p1 ----|---- p2----|-- p3------
/// ```
fn unpack_msb_first(raw: &[u8], count: usize, bits: u32) -> Vec<u16> {
    let mask = (1u32 << bits) - 1;
    let mut out = Vec::with_capacity(count);
    let mut acc = 0u32;
    let mut have = 0u32;
    for &byte in raw {
        acc = (acc << 8) | byte as u32;
        have += 8;
        while have >= bits {
            have -= bits;
            out.push(((acc >> have) & mask) as u16);
            if out.len() == count {
                return out;
            }
        }
        // Keep only the pending bits so the accumulator never overflows.
        acc &= (1 << have) - 1;
    }
    out
}

/// Swaps rows top-for-bottom in place.
///
/// Raw (unpacked) frames are stored bottom-up while packed frames are
/// top-down; the accessor flips raw frames so every decoded buffer
/// reads top-down.
pub fn flip_vertical(samples: &mut [u16], width: u32, height: u32) {
    let row = width as usize;
    let h = height as usize;
    for y in 0..h / 2 {
        let top = y * row;
        let bottom = (h - 1 - y) * row;
        for x in 0..row {
            samples.swap(top + x, bottom + x);
        }
    }
}
