//! Short varint: a prefix-continuation encoding for small `u16` magnitudes.
//!
//! | Prefix | Payload | Values           | Bits |
//! |--------|---------|------------------|------|
//! | `0`    | 4 bits  | `0..=15`         | 5    |
//! | `10`   | 8 bits  | `16..=255`       | 10   |
//! | `110`  | 16 bits | `256..=65534`    | 19   |
//! | `111`  | -       | `65535`          | 3    |
//!
//! Each prefix bit is its own write. `u16::MAX` is reserved as a list
//! terminator and gets the 3-bit code, so a terminator costs exactly three
//! single-bit writes.
//!
//! Signed values are written as magnitude followed by a sign bit
//! (1 = non-negative, 0 = negative). This is not zigzag.

use crate::error::{BitError, BitResult};
use crate::stream::OutBitStream;

/// Value reserved as a terminator inside the short-varint domain.
pub const SHORT_VARINT_SENTINEL: u16 = u16::MAX;

/// Number of single-bit writes used to encode [`SHORT_VARINT_SENTINEL`].
pub const SENTINEL_WRITES: usize = 3;

const SMALL_BITS: u8 = 4;
const MEDIUM_BITS: u8 = 8;
const LARGE_BITS: u8 = 16;

/// Writes `value` as a short varint.
pub fn write_short_varint<S>(stream: &mut S, value: u16) -> BitResult<()>
where
    S: OutBitStream + ?Sized,
{
    if value == SHORT_VARINT_SENTINEL {
        stream.write_bits(1, 1)?;
        stream.write_bits(1, 1)?;
        return stream.write_bits(1, 1);
    }
    if value < 1 << SMALL_BITS {
        stream.write_bits(0, 1)?;
        return stream.write_bits(u64::from(value), SMALL_BITS);
    }
    if value < 1 << MEDIUM_BITS {
        stream.write_bits(1, 1)?;
        stream.write_bits(0, 1)?;
        return stream.write_bits(u64::from(value), MEDIUM_BITS);
    }
    stream.write_bits(1, 1)?;
    stream.write_bits(1, 1)?;
    stream.write_bits(0, 1)?;
    stream.write_bits(u64::from(value), LARGE_BITS)
}

/// Writes `value` as a short-varint magnitude followed by a sign bit.
///
/// # Errors
///
/// Returns [`BitError::MagnitudeOutOfRange`] if `|value| > u16::MAX`.
pub fn write_short_varint_signed<S>(stream: &mut S, value: i32) -> BitResult<()>
where
    S: OutBitStream + ?Sized,
{
    let magnitude = u16::try_from(value.unsigned_abs()).map_err(|_| {
        BitError::MagnitudeOutOfRange {
            value: i64::from(value),
        }
    })?;
    write_short_varint(stream, magnitude)?;
    stream.write_bits(u64::from(value >= 0), 1)
}

/// Encoded width of `value` in bits, excluding any debug bookkeeping.
#[must_use]
pub const fn short_varint_bits(value: u16) -> usize {
    if value == SHORT_VARINT_SENTINEL {
        3
    } else if value < 1 << SMALL_BITS {
        1 + SMALL_BITS as usize
    } else if value < 1 << MEDIUM_BITS {
        2 + MEDIUM_BITS as usize
    } else {
        3 + LARGE_BITS as usize
    }
}

/// Number of stream writes used to encode `value`.
#[must_use]
pub const fn short_varint_writes(value: u16) -> usize {
    if value == SHORT_VARINT_SENTINEL {
        SENTINEL_WRITES
    } else if value < 1 << SMALL_BITS {
        2
    } else if value < 1 << MEDIUM_BITS {
        3
    } else {
        4
    }
}

pub(crate) const fn payload_bits(tier: u8) -> Option<u8> {
    match tier {
        0 => Some(SMALL_BITS),
        1 => Some(MEDIUM_BITS),
        2 => Some(LARGE_BITS),
        _ => None,
    }
}
