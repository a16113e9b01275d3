//! Entity change and message serialization for the netpack packet serializer.
//!
//! This is the main codec crate. It ties together bitstream and wire to pack
//! entity changes, commands and inputs into fixed-capacity packets.
//!
//! # Features
//!
//! - Entity create/update/destroy records with index and frame deltas
//! - Per-component field masks through a pluggable [`ComponentSerializer`]
//! - Ordered commands with message-id deltas
//! - Unordered message queues drained against a bit budget
//! - Trailing-marker reservations that hold for plain and debug streams
//!
//! # Design Principles
//!
//! - **Write what fits** - Overflow rolls back to the last record boundary, never fails.
//! - **No steady-state allocations** - Packets are written into caller-provided buffers.
//! - **Deterministic** - Same inputs produce same outputs.
//!
//! # Example
//!
//! ```
//! use bitstream::BitWriter;
//! use codec::{
//!     write_entity_updates, ComponentChanges, Entity, EntityChange, EntityMeta,
//!     RawFieldSerializer, SerializerContext, SimulationFrame,
//! };
//! use wire::{EntityOperation, ProtocolVersion};
//!
//! let changes = vec![EntityChange::update(
//!     Entity::new(3, 0),
//!     EntityMeta::new(0, EntityOperation::Create),
//!     ComponentChanges::default(),
//! )];
//!
//! let mut buf = [0u8; 64];
//! let mut ctx = SerializerContext::new(BitWriter::new(&mut buf), ProtocolVersion::CURRENT);
//! let mut written = Vec::new();
//! write_entity_updates(
//!     &mut written,
//!     &changes,
//!     SimulationFrame::new(10),
//!     &RawFieldSerializer,
//!     &mut ctx,
//! )
//! .unwrap();
//! assert_eq!(written, vec![Entity::new(3, 0)]);
//! ```

mod change;
mod component;
mod config;
mod context;
mod entity;
mod error;
mod message;
mod packet;
mod types;

pub use change::{
    ComponentChanges, ComponentData, ComponentUpdate, EntityChange, EntityMeta, EntityUpdate,
    FieldValue,
};
pub use component::{
    ComponentSerializer, FieldWriter, RawFieldSerializer, MAX_FIELDS_PER_COMPONENT,
};
pub use config::SerializerConfig;
pub use context::{ReservationScope, SectionStats, SerializerContext};
pub use entity::{
    min_simulation_frame, serialize_destroyed, serialize_simulation_frame, serialize_updated,
    write_entity_meta, EntityWrite,
};
pub use error::{CodecError, CodecResult, LimitKind, Marker};
pub use message::{
    serialize_command, serialize_input, EntityCommand, EntityInput, SerializedEntityMessage,
};
pub use packet::{
    channel_id_bits, end_of_entities_bits, message_type_bits,
    new_end_of_channels_reservation_scope, new_end_of_entities_reservation_scope,
    new_end_of_messages_reservation_scope, write_channel_id, write_end_of_channels,
    write_end_of_messages, write_entity_updates, write_floating_origin, write_message_type,
    write_messages, write_ordered_commands, FLOATING_ORIGIN_SECTION, ORDERED_COMMANDS_SECTION,
};
pub use types::{ClientId, ComponentTypeId, Entity, MessageId, SimulationFrame, Vector3d};
