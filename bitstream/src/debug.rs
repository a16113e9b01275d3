//! Debug-instrumented stream decorator.
//!
//! [`DebugBitWriter`] wraps any [`OutBitStream`] and precedes every value
//! write with a small header (a type tag and the payload width). A decoder
//! built for debug streams can use the header to detect desynchronisation.
//! The header bits go through the wrapped stream, so every capacity query
//! (`remaining_bit_count`, `is_full`, overflow) already accounts for them.

use crate::error::BitResult;
use crate::stream::OutBitStream;

/// Width of the type tag written before each value.
pub const DEBUG_TYPE_BITS: u8 = 4;

/// Width of the payload length written before each value.
pub const DEBUG_LENGTH_BITS: u8 = 16;

/// Bookkeeping bits added by a debug stream to a single write.
pub const DEBUG_BITS_PER_WRITE: usize = DEBUG_TYPE_BITS as usize + DEBUG_LENGTH_BITS as usize;

/// Bookkeeping bits a debug stream adds to `writes` value writes.
#[must_use]
pub const fn debug_bits_size(writes: usize) -> usize {
    writes * DEBUG_BITS_PER_WRITE
}

/// Kind of value recorded in a debug header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DebugStreamType {
    Bits = 1,
    Bool = 2,
    U8 = 3,
    U16 = 4,
    U64 = 5,
    Bytes = 6,
}

impl DebugStreamType {
    /// All debug stream types in tag order.
    pub const ALL: [Self; 6] = [
        Self::Bits,
        Self::Bool,
        Self::U8,
        Self::U16,
        Self::U64,
        Self::Bytes,
    ];

    const fn slot(self) -> usize {
        self as usize - 1
    }
}

/// Aggregated bit usage for one [`DebugStreamType`].
///
/// Counts include writes that were later rolled back with `seek`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugUsage {
    /// Number of value writes.
    pub writes: usize,
    /// Payload bits requested by those writes.
    pub value_bits: usize,
    /// Header bits spent on those writes.
    pub bookkeeping_bits: usize,
}

/// An [`OutBitStream`] decorator that interleaves debug headers.
#[derive(Debug)]
pub struct DebugBitWriter<S> {
    inner: S,
    usage: [DebugUsage; DebugStreamType::ALL.len()],
}

impl<S: OutBitStream> DebugBitWriter<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            usage: [DebugUsage::default(); DebugStreamType::ALL.len()],
        }
    }

    /// Returns the wrapped stream.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Usage recorded for one value type.
    pub fn usage(&self, ty: DebugStreamType) -> DebugUsage {
        self.usage[ty.slot()]
    }

    /// Usage summed over every value type.
    pub fn total_usage(&self) -> DebugUsage {
        self.usage.iter().fold(DebugUsage::default(), |acc, u| DebugUsage {
            writes: acc.writes + u.writes,
            value_bits: acc.value_bits + u.value_bits,
            bookkeeping_bits: acc.bookkeeping_bits + u.bookkeeping_bits,
        })
    }

    fn header(&mut self, ty: DebugStreamType, len: usize) -> BitResult<()> {
        self.inner.write_bits(ty as u64, DEBUG_TYPE_BITS)?;
        self.inner.write_bits(len as u64, DEBUG_LENGTH_BITS)?;
        let usage = &mut self.usage[ty.slot()];
        usage.writes += 1;
        usage.value_bits += len;
        usage.bookkeeping_bits += DEBUG_BITS_PER_WRITE;
        Ok(())
    }
}

impl<S: OutBitStream> OutBitStream for DebugBitWriter<S> {
    fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        self.header(DebugStreamType::Bits, usize::from(bits))?;
        self.inner.write_bits(value, bits)
    }

    fn write_bool(&mut self, value: bool) -> BitResult<()> {
        self.header(DebugStreamType::Bool, 1)?;
        self.inner.write_bool(value)
    }

    fn write_u8(&mut self, value: u8) -> BitResult<()> {
        self.header(DebugStreamType::U8, 8)?;
        self.inner.write_u8(value)
    }

    fn write_u16(&mut self, value: u16) -> BitResult<()> {
        self.header(DebugStreamType::U16, 16)?;
        self.inner.write_u16(value)
    }

    fn write_u64(&mut self, value: u64) -> BitResult<()> {
        self.header(DebugStreamType::U64, 64)?;
        self.inner.write_u64(value)
    }

    fn write_bytes_unaligned(&mut self, bytes: &[u8], bit_count: usize) -> BitResult<()> {
        self.header(DebugStreamType::Bytes, bit_count)?;
        self.inner.write_bytes_unaligned(bytes, bit_count)
    }

    fn position(&self) -> usize {
        self.inner.position()
    }

    fn capacity_bits(&self) -> usize {
        self.inner.capacity_bits()
    }

    fn overflow_bit_count(&self) -> usize {
        self.inner.overflow_bit_count()
    }

    fn seek(&mut self, position: usize) {
        self.inner.seek(position);
    }

    fn flush(&mut self) -> BitResult<()> {
        self.inner.flush()
    }

    fn is_debug(&self) -> bool {
        true
    }
}
