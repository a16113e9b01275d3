//! Bounded bit streams for the netpack packet serializer.
//!
//! This crate provides the [`OutBitStream`] abstraction with two
//! implementations sharing identical capacity semantics: the plain
//! [`BitWriter`] and the [`DebugBitWriter`] decorator. It also provides the
//! short-varint codec and a [`BitReader`] that mirrors the writer.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Overflow is data, not failure** - Writes past the capacity are counted so
//!   callers can roll back with [`OutBitStream::seek`].
//! - **No domain knowledge** - This crate knows nothing about entities, components, or messages.
//! - **Explicit errors** - Malformed requests return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{write_short_varint, BitReader, BitWriter, OutBitStream};
//!
//! let mut buf = [0u8; 4];
//! let mut writer = BitWriter::new(&mut buf);
//! writer.write_bool(true).unwrap();
//! write_short_varint(&mut writer, 42).unwrap();
//! let used = writer.finish();
//!
//! let mut reader = BitReader::new(&buf[..used]);
//! assert!(reader.read_bit().unwrap());
//! assert_eq!(reader.read_short_varint().unwrap(), 42);
//! ```

mod debug;
mod error;
mod reader;
mod stream;
mod varint;
mod writer;

pub use debug::{
    debug_bits_size, DebugBitWriter, DebugStreamType, DebugUsage, DEBUG_BITS_PER_WRITE,
    DEBUG_LENGTH_BITS, DEBUG_TYPE_BITS,
};
pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use stream::OutBitStream;
pub use varint::{
    short_varint_bits, short_varint_writes, write_short_varint, write_short_varint_signed,
    SENTINEL_WRITES, SHORT_VARINT_SENTINEL,
};
pub use writer::BitWriter;
