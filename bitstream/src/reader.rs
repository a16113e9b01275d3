//! Reader that mirrors the bounded writer.
//!
//! The reader mirrors [`BitWriter`](crate::BitWriter) bit for bit. Packet
//! decoding lives with the receiving peer; this type exists so encoders can be
//! verified against an independent decoder.

use crate::error::{BitError, BitResult};
use crate::varint::{payload_bits, SHORT_VARINT_SENTINEL};

/// Reads bits MSB-first from a byte slice.
///
/// Reads past the end return [`BitError::UnexpectedEof`]; malformed input
/// never panics.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
    bit_len: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` over every bit of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_pos: 0,
            bit_len: data.len().saturating_mul(8),
        }
    }

    /// Creates a reader limited to the first `bit_len` bits of `data`.
    #[must_use]
    pub fn with_bit_len(data: &'a [u8], bit_len: usize) -> Self {
        Self {
            data,
            bit_pos: 0,
            bit_len: bit_len.min(data.len().saturating_mul(8)),
        }
    }

    /// Bits left before the end.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.bit_len.saturating_sub(self.bit_pos)
    }

    /// Whether every bit has been consumed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Bits consumed so far.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Reads one bit.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let byte_idx = self.bit_pos / 8;
        let bit_idx = self.bit_pos % 8;
        let bit = (self.data[byte_idx] >> (7 - bit_idx)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads a `bits`-wide unsigned value, at most 64 bits.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        self.ensure_bits(usize::from(bits))?;

        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Reads an 8-bit value.
    pub fn read_u8(&mut self) -> BitResult<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a 16-bit value.
    pub fn read_u16(&mut self) -> BitResult<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Reads a 64-bit value.
    pub fn read_u64(&mut self) -> BitResult<u64> {
        self.read_bits(64)
    }

    /// Reads `bit_count` bits into bytes, MSB-first, zero-padding the tail.
    pub fn read_bytes_unaligned(&mut self, bit_count: usize) -> BitResult<Vec<u8>> {
        self.ensure_bits(bit_count)?;
        let mut out = Vec::with_capacity(bit_count.div_ceil(8));
        let mut left = bit_count;
        while left > 0 {
            let take = left.min(8);
            let chunk = self.read_bits(take as u8)? as u8;
            out.push(chunk << (8 - take));
            left -= take;
        }
        Ok(out)
    }

    /// Skips `bits` bits.
    pub fn skip_bits(&mut self, bits: usize) -> BitResult<()> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    /// Reads a short varint.
    pub fn read_short_varint(&mut self) -> BitResult<u16> {
        let mut tier = 0u8;
        while tier < 3 && self.read_bit()? {
            tier += 1;
        }
        match payload_bits(tier) {
            Some(bits) => Ok(self.read_bits(bits)? as u16),
            None => Ok(SHORT_VARINT_SENTINEL),
        }
    }

    /// Reads a short-varint magnitude followed by its sign bit.
    pub fn read_short_varint_signed(&mut self) -> BitResult<i32> {
        let magnitude = i32::from(self.read_short_varint()?);
        let non_negative = self.read_bit()?;
        Ok(if non_negative { magnitude } else { -magnitude })
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reader() {
        let reader = BitReader::new(&[]);
        assert!(reader.is_empty());
        assert_eq!(reader.bits_remaining(), 0);
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn reading_past_the_end_is_an_error() {
        let mut reader = BitReader::new(&[]);
        assert_eq!(
            reader.read_bit(),
            Err(BitError::UnexpectedEof {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn read_bits_spans_bytes() {
        let mut reader = BitReader::new(&[0b1010_0000, 0b0000_0110]);
        assert_eq!(reader.read_bits(13).unwrap(), 0b1_0100_0000_0000);
        assert_eq!(reader.bit_position(), 13);
        assert_eq!(reader.read_bits(3).unwrap(), 0b110);
    }

    #[test]
    fn read_u16_msb_first() {
        let mut reader = BitReader::new(&[0xAB, 0xCD]);
        assert_eq!(reader.read_u16().unwrap(), 0xABCD);
    }

    #[test]
    fn with_bit_len_stops_early() {
        let mut reader = BitReader::with_bit_len(&[0xFF], 3);
        assert_eq!(reader.read_bits(3).unwrap(), 0b111);
        assert!(reader.read_bit().is_err());
    }

    #[test]
    fn read_short_varint_tiers() {
        // 0 0101 | 111 | 10 1100_1000
        let mut reader = BitReader::new(&[0b0010_1111, 0b1011_0010, 0b0000_0000]);
        assert_eq!(reader.read_short_varint().unwrap(), 5);
        assert_eq!(reader.read_short_varint().unwrap(), SHORT_VARINT_SENTINEL);
        assert_eq!(reader.read_short_varint().unwrap(), 200);
    }

    #[test]
    fn read_short_varint_signed_negative() {
        let mut reader = BitReader::new(&[0b0010_1000]);
        assert_eq!(reader.read_short_varint_signed().unwrap(), -5);
    }

    #[test]
    fn read_bytes_unaligned_pads_tail() {
        let mut reader = BitReader::new(&[0b1101_0101, 0b0110_0000]);
        reader.skip_bits(1).unwrap();
        let bytes = reader.read_bytes_unaligned(10).unwrap();
        assert_eq!(bytes, vec![0b1010_1010, 0b1100_0000]);
    }

    #[test]
    fn truncated_varint_fails() {
        let mut reader = BitReader::with_bit_len(&[0b1000_0000], 4);
        assert!(matches!(
            reader.read_short_varint(),
            Err(BitError::UnexpectedEof { .. })
        ));
    }
}
