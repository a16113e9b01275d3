//! Packet and section orchestration.
//!
//! Every batch writer follows the same protocol: remember the position, hold
//! back room for the trailing marker, write records one at a time and roll
//! the stream back to the last record boundary as soon as the budget is
//! exceeded. Records that did not fit are left for a later packet.

use std::collections::VecDeque;

use bitstream::{
    debug_bits_size, write_short_varint, write_short_varint_signed, OutBitStream, SENTINEL_WRITES,
};
use tracing::{trace, warn};
use wire::{
    ChannelId, MessageType, ProtocolVersion, END_OF_ENTITIES, NUM_BITS_FOR_CHANNEL_ID,
    NUM_BITS_FOR_END_OF_ENTITIES, NUM_BITS_FOR_MESSAGE_TYPE,
};

use crate::change::{EntityChange, EntityUpdate};
use crate::component::{ComponentSerializer, FieldWriter};
use crate::context::{ReservationScope, SerializerContext};
use crate::entity::{serialize_destroyed, serialize_updated, EntityWrite};
use crate::error::{CodecError, CodecResult, Marker};
use crate::message::SerializedEntityMessage;
use crate::types::{Entity, MessageId, SimulationFrame, Vector3d};

/// Section name used for ordered commands.
pub const ORDERED_COMMANDS_SECTION: &str = "OrderedCommands";

/// Section name used for the floating origin.
pub const FLOATING_ORIGIN_SECTION: &str = "FloatingOrigin";

/// Bits needed for the end-of-entities marker.
pub const fn end_of_entities_bits(use_debug_streams: bool) -> usize {
    if use_debug_streams {
        NUM_BITS_FOR_END_OF_ENTITIES + debug_bits_size(SENTINEL_WRITES)
    } else {
        NUM_BITS_FOR_END_OF_ENTITIES
    }
}

/// Bits needed for a message type tag.
pub const fn message_type_bits(use_debug_streams: bool) -> usize {
    let bits = NUM_BITS_FOR_MESSAGE_TYPE as usize;
    if use_debug_streams {
        bits + debug_bits_size(1)
    } else {
        bits
    }
}

/// Bits needed for a channel id, zero before channel ids were introduced.
pub const fn channel_id_bits(version: ProtocolVersion, use_debug_streams: bool) -> usize {
    if !version.includes_channel_id() {
        return 0;
    }
    let bits = NUM_BITS_FOR_CHANNEL_ID as usize;
    if use_debug_streams {
        bits + debug_bits_size(1)
    } else {
        bits
    }
}

/// Writes a message type tag.
pub fn write_message_type<S: OutBitStream + ?Sized>(
    stream: &mut S,
    message_type: MessageType,
) -> CodecResult<()> {
    Ok(stream.write_u8(message_type.raw())?)
}

/// Reserves room for the end-of-entities marker.
pub fn new_end_of_entities_reservation_scope<S: OutBitStream>(
    ctx: &mut SerializerContext<S>,
) -> ReservationScope<'_, S> {
    let bits = end_of_entities_bits(ctx.use_debug_streams());
    ctx.new_reservation_scope(bits)
}

/// Reserves room for the end-of-messages marker.
pub fn new_end_of_messages_reservation_scope<S: OutBitStream>(
    ctx: &mut SerializerContext<S>,
) -> ReservationScope<'_, S> {
    let bits = message_type_bits(ctx.use_debug_streams());
    ctx.new_reservation_scope(bits)
}

/// Reserves room for the end-of-channels marker.
pub fn new_end_of_channels_reservation_scope<S: OutBitStream>(
    ctx: &mut SerializerContext<S>,
) -> ReservationScope<'_, S> {
    let bits = channel_id_bits(ctx.protocol_version(), ctx.use_debug_streams());
    ctx.new_reservation_scope(bits)
}

/// Writes as many entity changes as fit, in input order.
///
/// Committed entities are appended to `written`. An entity that does not fit
/// is rolled back and ends the batch; the rest are left for a later packet.
/// Nothing is written if there are no changes or not even an empty update
/// fits.
///
/// On error the whole section is rolled back: the stream returns to where the
/// section started, `written` is restored and the section is aborted.
pub fn write_entity_updates<S: OutBitStream>(
    written: &mut Vec<Entity>,
    changes: &[EntityChange],
    reference_frame: SimulationFrame,
    serializer: &dyn ComponentSerializer,
    ctx: &mut SerializerContext<S>,
) -> CodecResult<()> {
    if changes.is_empty() {
        return Ok(());
    }

    let section_start = ctx.stream().position();
    let committed_before = written.len();
    ctx.start_section(MessageType::EcsWorldUpdate.name());

    match write_entity_batch(written, changes, reference_frame, serializer, ctx) {
        Ok(true) => {
            ctx.end_section();
            Ok(())
        }
        Ok(false) => {
            ctx.stream_mut().seek(section_start);
            ctx.abort_section();
            Ok(())
        }
        Err(err) => {
            ctx.stream_mut().seek(section_start);
            written.truncate(committed_before);
            ctx.abort_section();
            Err(err)
        }
    }
}

/// Returns `false` if not even an empty update fits.
fn write_entity_batch<S: OutBitStream>(
    written: &mut Vec<Entity>,
    changes: &[EntityChange],
    reference_frame: SimulationFrame,
    serializer: &dyn ComponentSerializer,
    ctx: &mut SerializerContext<S>,
) -> CodecResult<bool> {
    write_message_type(ctx.stream_mut(), MessageType::EcsWorldUpdate)?;
    ctx.set_bits_remaining_in_empty_packet();

    let mut scope = new_end_of_entities_reservation_scope(ctx);
    if scope.is_stream_full() {
        return Ok(false);
    }

    let mut last_index = 0u16;
    for change in changes {
        scope.set_entity(change.id);
        let rewind_point = scope.stream().position();

        let outcome = match &change.update {
            EntityUpdate::Destroy { reason } => {
                serialize_destroyed(change.id, &change.meta, *reason, &mut *scope, &mut last_index)?
            }
            EntityUpdate::Update(components) => serialize_updated(
                change.id,
                &change.meta,
                components,
                reference_frame,
                serializer,
                &mut *scope,
                &mut last_index,
            )?,
        };
        let EntityWrite::Written { bits_taken } = outcome else {
            continue;
        };

        if scope.is_stream_full() {
            scope.stream_mut().seek(rewind_point);
            let max_size_bits = scope.free_bits_in_empty_packet();
            if bits_taken > max_size_bits {
                warn!(
                    entity = %change.id,
                    entity_size_bits = bits_taken,
                    max_size_bits,
                    "entity is too big to fit in any packet"
                );
            }
            break;
        }

        written.push(change.id);
    }
    drop(scope);

    write_end_of_entities(ctx)?;
    Ok(true)
}

fn write_end_of_entities<S: OutBitStream>(ctx: &mut SerializerContext<S>) -> CodecResult<()> {
    let stream = ctx.stream_mut();
    write_short_varint(stream, END_OF_ENTITIES)?;
    if stream.overflow_bit_count() > 0 {
        return Err(CodecError::InsufficientSpace {
            marker: Marker::EndOfEntities,
        });
    }
    Ok(())
}

/// Writes ordered commands until one does not fit.
///
/// Each command is a `Command` tag, the id delta against the previous command
/// of this call (starting from zero) and the message bits. Returns the ids
/// that were committed. `EndOfMessages` follows only if at least one was.
pub fn write_ordered_commands<S: OutBitStream>(
    messages: &[(MessageId, SerializedEntityMessage)],
    ctx: &mut SerializerContext<S>,
) -> CodecResult<Vec<MessageId>> {
    ctx.start_section(ORDERED_COMMANDS_SECTION);

    let mut committed = Vec::with_capacity(messages.len().min(32));
    let mut last_id = 0u16;

    let mut scope = new_end_of_messages_reservation_scope(ctx);
    for (id, message) in messages {
        let rewind_point = scope.stream().position();

        write_message_type(scope.stream_mut(), MessageType::Command)?;
        let delta = i32::from(id.raw()) - i32::from(last_id);
        write_short_varint_signed(scope.stream_mut(), delta)?;
        last_id = id.raw();

        scope.set_entity(message.target_entity);
        scope
            .stream_mut()
            .write_bytes_unaligned(&message.octets, message.bit_count)?;

        if scope.is_stream_full() {
            scope.stream_mut().seek(rewind_point);
            break;
        }
        committed.push(*id);
    }
    drop(scope);

    if !committed.is_empty() {
        write_end_of_messages(ctx)?;
    }
    ctx.end_section();
    Ok(committed)
}

/// Drains serialized messages from the front of `queue` while they fit.
///
/// The budget is the unreserved room at the start of the call. Each message
/// is written as a `message_type` tag followed by its bits. Written messages
/// are moved to `written`; the first one that does not fit stays queued.
pub fn write_messages<S: OutBitStream>(
    written: &mut Vec<SerializedEntityMessage>,
    message_type: MessageType,
    queue: &mut VecDeque<SerializedEntityMessage>,
    ctx: &mut SerializerContext<S>,
) -> CodecResult<()> {
    ctx.start_section(message_type.name());

    let budget = ctx.remaining_unreserved_bit_count();
    let start = ctx.stream().position();

    while let Some(message) = queue.front() {
        let rewind_point = ctx.stream().position();
        ctx.set_entity(message.target_entity);

        let stream = ctx.stream_mut();
        write_message_type(stream, message_type)?;
        stream.write_bytes_unaligned(&message.octets, message.bit_count)?;

        let used = stream.position() - start;
        if stream.overflow_bit_count() > 0 || used > budget {
            stream.seek(rewind_point);
            break;
        }
        if let Some(message) = queue.pop_front() {
            written.push(message);
        }
    }

    ctx.end_section();
    Ok(())
}

/// Writes a channel id. Writes nothing before channel ids were introduced.
pub fn write_channel_id<S: OutBitStream>(
    channel: ChannelId,
    ctx: &mut SerializerContext<S>,
) -> CodecResult<()> {
    if !ctx.protocol_version().includes_channel_id() {
        return Ok(());
    }
    if !channel.is_valid() {
        return Err(CodecError::InvalidChannelId { channel });
    }
    write_channel_marker(ctx, channel, Marker::ChannelId)
}

/// Writes the end-of-channels marker. Writes nothing before channel ids were
/// introduced.
pub fn write_end_of_channels<S: OutBitStream>(ctx: &mut SerializerContext<S>) -> CodecResult<()> {
    if !ctx.protocol_version().includes_channel_id() {
        return Ok(());
    }
    write_channel_marker(ctx, ChannelId::END_OF_CHANNELS, Marker::EndOfChannels)
}

fn write_channel_marker<S: OutBitStream>(
    ctx: &mut SerializerContext<S>,
    channel: ChannelId,
    marker: Marker,
) -> CodecResult<()> {
    let stream = ctx.stream_mut();
    stream.write_bits(u64::from(channel.raw()), NUM_BITS_FOR_CHANNEL_ID)?;
    if stream.is_full() && stream.overflow_bit_count() > 0 {
        return Err(CodecError::InsufficientSpace { marker });
    }
    Ok(())
}

/// Writes the end-of-messages marker.
pub fn write_end_of_messages<S: OutBitStream>(ctx: &mut SerializerContext<S>) -> CodecResult<()> {
    let stream = ctx.stream_mut();
    write_message_type(stream, MessageType::EndOfMessages)?;
    if stream.is_full() && stream.overflow_bit_count() > 0 {
        return Err(CodecError::InsufficientSpace {
            marker: Marker::EndOfMessages,
        });
    }
    Ok(())
}

/// Writes the floating origin in its own section.
pub fn write_floating_origin<S: OutBitStream>(
    origin: Vector3d,
    ctx: &mut SerializerContext<S>,
) -> CodecResult<()> {
    trace!(origin = %origin, "write floating origin");
    ctx.start_section(FLOATING_ORIGIN_SECTION);
    FieldWriter::new(ctx.stream_mut()).write_vector3d(origin)?;
    ctx.end_section();
    Ok(())
}
