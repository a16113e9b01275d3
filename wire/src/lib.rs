//! Wire vocabulary for the netpack packet serializer.
//!
//! This crate names every value that appears on the wire: message type tags,
//! entity operations, destroy reasons, component states, message targets,
//! channel ids and protocol versions, together with the fixed bit width of
//! each field. It does not write anything itself; the codec does that.
//!
//! # Design Principles
//!
//! - **Stable wire format** - Widths and raw values are versioned and documented.
//! - **Total parsing** - Every raw value either maps onto a variant or yields a [`WireError`].
//! - **No domain knowledge** - This crate names fields, it does not sequence them.
//!
//! See `WIRE_FORMAT.md` for the complete layout.

mod entity;
mod error;
mod fields;
mod message;

pub use entity::{
    check_lod, wire_version, ComponentState, DestroyReason, EntityOperation, END_OF_ENTITIES,
    MAX_ENTITY_INDEX, MAX_VERSIONS, NUM_BITS_FOR_MESSAGE_ENTITY, NUM_VERSION_BITS,
};
pub use error::{WireError, WireResult};
pub use fields::{
    MAX_COMPONENT_COUNT, MAX_LOD, MAX_SERIALIZED_MESSAGE_BYTES, MAX_SIMFRAME_DELTA, NUM_BITS_FOR_AUTHORITY,
    NUM_BITS_FOR_CHANNEL_ID, NUM_BITS_FOR_CLIENT_ID, NUM_BITS_FOR_COMPONENT_COUNT,
    NUM_BITS_FOR_COMPONENT_ID, NUM_BITS_FOR_COMPONENT_STATE, NUM_BITS_FOR_DESTROY_REASON,
    NUM_BITS_FOR_END_OF_ENTITIES, NUM_BITS_FOR_LOD, NUM_BITS_FOR_MESSAGE_TARGET,
    NUM_BITS_FOR_MESSAGE_TYPE, NUM_BITS_FOR_OPERATION, NUM_BITS_FOR_ORPHAN,
    NUM_BITS_FOR_SIMFRAME_DELTA_FLAG,
};
pub use message::{ChannelId, MessageTarget, MessageType, ProtocolVersion};
