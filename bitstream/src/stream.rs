//! The capacity-bounded output stream abstraction.

use crate::error::BitResult;

/// A capacity-bounded, bit-granular output sink.
///
/// Writes that do not fit never fail and never touch memory outside the
/// buffer. The stream instead clamps its position to the capacity and adds
/// the bits that could not be stored to [`overflow_bit_count`]. Callers
/// detect this through [`is_full`] and roll back with [`seek`].
///
/// Errors are reserved for malformed requests (a width above 64 bits, a value
/// that does not fit its width), never for running out of room.
///
/// [`overflow_bit_count`]: Self::overflow_bit_count
/// [`is_full`]: Self::is_full
/// [`seek`]: Self::seek
pub trait OutBitStream {
    /// Writes the low `bits` bits of `value`, most significant bit first.
    fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()>;

    /// Writes a single bit.
    fn write_bool(&mut self, value: bool) -> BitResult<()> {
        self.write_bits(u64::from(value), 1)
    }

    /// Writes an 8-bit value.
    fn write_u8(&mut self, value: u8) -> BitResult<()> {
        self.write_bits(u64::from(value), 8)
    }

    /// Writes a 16-bit value.
    fn write_u16(&mut self, value: u16) -> BitResult<()> {
        self.write_bits(u64::from(value), 16)
    }

    /// Writes a 64-bit value.
    fn write_u64(&mut self, value: u64) -> BitResult<()> {
        self.write_bits(value, 64)
    }

    /// Appends the first `bit_count` bits of `bytes`, with no alignment.
    fn write_bytes_unaligned(&mut self, bytes: &[u8], bit_count: usize) -> BitResult<()>;

    /// Number of bits written so far (never above the capacity).
    fn position(&self) -> usize;

    /// Total capacity in bits.
    fn capacity_bits(&self) -> usize;

    /// Number of bits past the capacity that writes attempted to store.
    fn overflow_bit_count(&self) -> usize;

    /// Moves the write cursor to `position`, discarding the overflow counter.
    fn seek(&mut self, position: usize);

    /// Pads with zero bits up to the next byte boundary.
    fn flush(&mut self) -> BitResult<()>;

    /// Bits left before the capacity is reached.
    fn remaining_bit_count(&self) -> usize {
        self.capacity_bits().saturating_sub(self.position())
    }

    /// Returns `true` once the position has reached the capacity.
    fn is_full(&self) -> bool {
        self.position() >= self.capacity_bits()
    }

    /// Returns `true` for streams that interleave debug bookkeeping bits.
    fn is_debug(&self) -> bool {
        false
    }
}
