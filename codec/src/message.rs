//! Command and input serialization.
//!
//! Each command or input becomes a self-contained, byte-padded buffer that is
//! later spliced bit-exactly into packets by the orchestrators. Layout:
//!
//! ```text
//! entity index (16) | version (8) | target (2) | component type (16) | meta | payload
//! ```
//!
//! Command meta is a has-meta bit, then (if set) an include-sender bit, an
//! optional 32-bit sender client id and the 64-bit frame. Input meta is just
//! the 64-bit frame.

use bitstream::{BitWriter, DebugBitWriter, OutBitStream};
use wire::{
    MessageTarget, MessageType, MAX_SERIALIZED_MESSAGE_BYTES, NUM_BITS_FOR_CLIENT_ID,
    NUM_BITS_FOR_MESSAGE_TARGET, NUM_VERSION_BITS,
};

use crate::change::FieldValue;
use crate::component::{ComponentSerializer, FieldWriter};
use crate::config::SerializerConfig;
use crate::error::{CodecError, CodecResult};
use crate::types::{ClientId, ComponentTypeId, Entity, SimulationFrame};

/// A serialized command or input, ready to be written into packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedEntityMessage {
    pub target_entity: Entity,
    /// Message bytes; the last one is zero-padded.
    pub octets: Vec<u8>,
    /// Number of meaningful bits in `octets`.
    pub bit_count: usize,
}

/// A command addressed to an entity.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EntityCommand {
    pub entity: Entity,
    pub target: MessageTarget,
    pub component_type: ComponentTypeId,
    /// Whether the sender and frame meta block is present.
    pub uses_meta: bool,
    pub sender_client_id: ClientId,
    pub frame: SimulationFrame,
    pub fields: Vec<FieldValue>,
}

/// An input sample for an entity.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EntityInput {
    pub entity: Entity,
    pub target: MessageTarget,
    pub component_type: ComponentTypeId,
    pub frame: SimulationFrame,
    pub fields: Vec<FieldValue>,
}

struct MessageHeader {
    kind: MessageType,
    entity: Entity,
    target: MessageTarget,
    component_type: ComponentTypeId,
}

/// Serializes a command.
///
/// Fails with [`CodecError::MessageTooLarge`] if the command does not fit in
/// [`MAX_SERIALIZED_MESSAGE_BYTES`]; such a command must not be retried.
pub fn serialize_command(
    command: &EntityCommand,
    serializer: &dyn ComponentSerializer,
    config: &SerializerConfig,
) -> CodecResult<SerializedEntityMessage> {
    let header = MessageHeader {
        kind: MessageType::Command,
        entity: command.entity,
        target: command.target,
        component_type: command.component_type,
    };
    let include_sender = config.include_sender_client_id;
    serialize_message(&header, config.use_debug_streams, |out| {
        out.write_bool(command.uses_meta)?;
        if command.uses_meta {
            out.write_bool(include_sender)?;
            if include_sender {
                out.write_bits(
                    u64::from(command.sender_client_id.raw()),
                    NUM_BITS_FOR_CLIENT_ID,
                )?;
            }
            out.write_long(command.frame.raw())?;
        }
        serializer.write_command(command, out)
    })
}

/// Serializes an input.
///
/// Fails with [`CodecError::MessageTooLarge`] if the input does not fit in
/// [`MAX_SERIALIZED_MESSAGE_BYTES`].
pub fn serialize_input(
    input: &EntityInput,
    serializer: &dyn ComponentSerializer,
    config: &SerializerConfig,
) -> CodecResult<SerializedEntityMessage> {
    let header = MessageHeader {
        kind: MessageType::Input,
        entity: input.entity,
        target: input.target,
        component_type: input.component_type,
    };
    serialize_message(&header, config.use_debug_streams, |out| {
        out.write_long(input.frame.raw())?;
        serializer.write_input(input, out)
    })
}

fn serialize_message<F>(
    header: &MessageHeader,
    use_debug_streams: bool,
    body: F,
) -> CodecResult<SerializedEntityMessage>
where
    F: FnOnce(&mut FieldWriter<'_>) -> CodecResult<()>,
{
    let mut octets = vec![0u8; MAX_SERIALIZED_MESSAGE_BYTES];
    let bit_count = {
        let mut writer = BitWriter::new(&mut octets);
        if use_debug_streams {
            write_message(&mut DebugBitWriter::new(writer), header, body)?
        } else {
            write_message(&mut writer, header, body)?
        }
    };
    octets.truncate(bit_count.div_ceil(8));
    Ok(SerializedEntityMessage {
        target_entity: header.entity,
        octets,
        bit_count,
    })
}

fn write_message<F>(
    stream: &mut dyn OutBitStream,
    header: &MessageHeader,
    body: F,
) -> CodecResult<usize>
where
    F: FnOnce(&mut FieldWriter<'_>) -> CodecResult<()>,
{
    stream.write_u16(header.entity.index())?;
    stream.write_bits(u64::from(header.entity.wire_version()), NUM_VERSION_BITS)?;
    stream.write_bits(u64::from(header.target.raw()), NUM_BITS_FOR_MESSAGE_TARGET)?;
    stream.write_u16(header.component_type.raw())?;

    body(&mut FieldWriter::new(stream))?;

    if stream.is_full() {
        return Err(CodecError::MessageTooLarge {
            kind: header.kind,
            max_bytes: MAX_SERIALIZED_MESSAGE_BYTES,
        });
    }
    stream.flush()?;
    Ok(stream.position())
}
