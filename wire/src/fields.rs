//! Fixed field widths, in bits.
//!
//! These widths are part of the wire contract. Changing any of them breaks
//! every decoder in the field.

/// Message type tag.
pub const NUM_BITS_FOR_MESSAGE_TYPE: u8 = 8;

/// Destroy reason carried by destroyed entities.
pub const NUM_BITS_FOR_DESTROY_REASON: u8 = 3;

/// Presence flag in front of a simulation-frame delta.
pub const NUM_BITS_FOR_SIMFRAME_DELTA_FLAG: u8 = 1;

/// Each of the state and input authority flags.
pub const NUM_BITS_FOR_AUTHORITY: u8 = 1;

/// Orphan flag.
pub const NUM_BITS_FOR_ORPHAN: u8 = 1;

/// Entity operation.
pub const NUM_BITS_FOR_OPERATION: u8 = 2;

/// Level of detail.
pub const NUM_BITS_FOR_LOD: u8 = 4;

/// Number of component records following an entity header.
pub const NUM_BITS_FOR_COMPONENT_COUNT: u8 = 5;

/// Component state in front of each component record.
pub const NUM_BITS_FOR_COMPONENT_STATE: u8 = 2;

/// Component serialize type id.
pub const NUM_BITS_FOR_COMPONENT_ID: u8 = 16;

/// Message target of a command or input.
pub const NUM_BITS_FOR_MESSAGE_TARGET: u8 = 2;

/// Channel id, present from [`ProtocolVersion::INCLUDES_CHANNEL_ID`](crate::ProtocolVersion::INCLUDES_CHANNEL_ID).
pub const NUM_BITS_FOR_CHANNEL_ID: u8 = 4;

/// Sender client id inside command meta.
pub const NUM_BITS_FOR_CLIENT_ID: u8 = 32;

/// Plain bits of the end-of-entities marker (the short-varint sentinel).
pub const NUM_BITS_FOR_END_OF_ENTITIES: usize = 3;

/// Largest number of component records one entity change can carry.
pub const MAX_COMPONENT_COUNT: usize = (1 << NUM_BITS_FOR_COMPONENT_COUNT) - 1;

/// Largest level of detail that fits [`NUM_BITS_FOR_LOD`].
pub const MAX_LOD: u8 = (1 << NUM_BITS_FOR_LOD) - 1;

/// Largest simulation-frame delta magnitude; larger deltas are clamped.
pub const MAX_SIMFRAME_DELTA: i64 = u8::MAX as i64;

/// Upper bound for one serialized command or input.
pub const MAX_SERIALIZED_MESSAGE_BYTES: usize = 1024;
