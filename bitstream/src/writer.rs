//! Bounded bit-level writer over a caller-supplied buffer.

use crate::error::{BitError, BitResult};
use crate::stream::OutBitStream;

/// A bit-level writer for encoding packed binary data into a fixed buffer.
///
/// The writer never grows the buffer. Bits that do not fit are counted in
/// [`overflow_bit_count`](OutBitStream::overflow_bit_count) and dropped.
#[derive(Debug)]
pub struct BitWriter<'a> {
    /// Destination buffer; only the first `capacity_bits` bits are used.
    buf: &'a mut [u8],
    /// Capacity in bits (at most `buf.len() * 8`).
    capacity_bits: usize,
    /// Current write position in bits.
    bit_pos: usize,
    /// Bits that writes attempted to store past the capacity.
    overflow_bits: usize,
}

impl<'a> BitWriter<'a> {
    /// Creates a writer whose capacity is the whole buffer.
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        let capacity_bits = buf.len().saturating_mul(8);
        Self {
            buf,
            capacity_bits,
            bit_pos: 0,
            overflow_bits: 0,
        }
    }

    /// Creates a writer limited to `capacity_bits`, clamped to the buffer size.
    #[must_use]
    pub fn with_capacity_bits(buf: &'a mut [u8], capacity_bits: usize) -> Self {
        let capacity_bits = capacity_bits.min(buf.len().saturating_mul(8));
        Self {
            buf,
            capacity_bits,
            bit_pos: 0,
            overflow_bits: 0,
        }
    }

    /// Number of bytes touched by the bits written so far.
    #[must_use]
    pub const fn bytes_written(&self) -> usize {
        self.bit_pos.div_ceil(8)
    }

    /// The written bytes; a trailing partial byte is included as-is.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.bytes_written()]
    }

    /// Finishes writing and returns the number of bytes used.
    ///
    /// If the last byte is incomplete, its unused low bits are cleared.
    #[must_use]
    pub fn finish(mut self) -> usize {
        let rem = self.bit_pos % 8;
        let used = self.bytes_written();
        if rem != 0 {
            self.buf[used - 1] &= 0xFF << (8 - rem);
        }
        used
    }

    fn put_bit(&mut self, bit: bool) {
        let idx = self.bit_pos / 8;
        let mask = 1u8 << (7 - self.bit_pos % 8);
        if bit {
            self.buf[idx] |= mask;
        } else {
            self.buf[idx] &= !mask;
        }
        self.bit_pos += 1;
    }
}

impl OutBitStream for BitWriter<'_> {
    fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >> bits != 0 {
            return Err(BitError::ValueOutOfRange {
                value,
                bits: bits as usize,
            });
        }

        let bits = usize::from(bits);
        let fit = bits.min(self.remaining_bit_count());
        for i in (bits - fit..bits).rev() {
            self.put_bit((value >> i) & 1 == 1);
        }
        self.overflow_bits += bits - fit;
        Ok(())
    }

    fn write_bytes_unaligned(&mut self, bytes: &[u8], bit_count: usize) -> BitResult<()> {
        let max_bits = bytes.len().saturating_mul(8);
        if bit_count > max_bits {
            return Err(BitError::InvalidBitCount {
                bits: bit_count,
                max_bits,
            });
        }

        let full = bit_count / 8;
        for &byte in &bytes[..full] {
            self.write_bits(u64::from(byte), 8)?;
        }
        let rem = bit_count % 8;
        if rem != 0 {
            let tail = bytes[full] >> (8 - rem);
            self.write_bits(u64::from(tail), rem as u8)?;
        }
        Ok(())
    }

    fn position(&self) -> usize {
        self.bit_pos
    }

    fn capacity_bits(&self) -> usize {
        self.capacity_bits
    }

    fn overflow_bit_count(&self) -> usize {
        self.overflow_bits
    }

    fn seek(&mut self, position: usize) {
        self.bit_pos = position.min(self.capacity_bits);
        self.overflow_bits = 0;
    }

    fn flush(&mut self) -> BitResult<()> {
        let pad = (8 - self.bit_pos % 8) % 8;
        self.write_bits(0, pad as u8)
    }
}
