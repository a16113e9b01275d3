//! Entity change serializer.
//!
//! Layout of one entity record:
//!
//! ```text
//! index delta (signed short varint) | meta | destroy reason
//! index delta (signed short varint) | meta | frame delta | count | components...
//! ```
//!
//! Each component record is a 2-bit state, a 16-bit serialize type and, for
//! updates, the payload written by the [`ComponentSerializer`].

use bitstream::{write_short_varint_signed, OutBitStream};
use tracing::{debug, error, trace};
use wire::{
    check_lod, wire_version, ComponentState, DestroyReason, EntityOperation,
    MAX_COMPONENT_COUNT, MAX_SIMFRAME_DELTA, NUM_BITS_FOR_AUTHORITY,
    NUM_BITS_FOR_COMPONENT_COUNT, NUM_BITS_FOR_COMPONENT_STATE, NUM_BITS_FOR_DESTROY_REASON,
    NUM_BITS_FOR_LOD, NUM_BITS_FOR_OPERATION, NUM_BITS_FOR_ORPHAN,
    NUM_BITS_FOR_SIMFRAME_DELTA_FLAG, NUM_VERSION_BITS,
};

use crate::change::{ComponentChanges, EntityMeta};
use crate::component::{ComponentSerializer, FieldWriter};
use crate::context::SerializerContext;
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::types::{ComponentTypeId, Entity, SimulationFrame};

/// Outcome of serializing one entity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityWrite {
    /// Nothing was written (the change carried an unknown operation).
    Skipped,
    /// The record was written. `bits_taken` counts overflowed bits too, so it
    /// is the size the record needs, not what landed in the buffer.
    Written { bits_taken: usize },
}

/// Writes a destroyed entity: index delta, meta and destroy reason.
pub fn serialize_destroyed<S: OutBitStream>(
    id: Entity,
    meta: &EntityMeta,
    reason: DestroyReason,
    ctx: &mut SerializerContext<S>,
    last_index: &mut u16,
) -> CodecResult<EntityWrite> {
    if meta.operation.is_unknown() {
        error!(entity = %id, operation = ?meta.operation, "invalid entity operation");
        return Ok(EntityWrite::Skipped);
    }
    check_lod(meta.lod)?;

    let stream = ctx.stream_mut();
    let initial_remaining = stream.remaining_bit_count();
    let initial_position = stream.position();

    *last_index = write_entity_index(stream, id, *last_index)?;
    write_entity_meta(stream, meta)?;
    stream.write_bits(u64::from(reason.raw()), NUM_BITS_FOR_DESTROY_REASON)?;

    debug!(entity = %id, reason = ?reason, "serialize destroyed");
    Ok(EntityWrite::Written {
        bits_taken: bits_taken(stream, initial_remaining, initial_position),
    })
}

/// Writes an updated or created entity.
///
/// The frame delta is taken from the smallest simulation frame reported by the
/// updated components, or `reference_frame` if none reports one.
pub fn serialize_updated<S: OutBitStream>(
    id: Entity,
    meta: &EntityMeta,
    components: &ComponentChanges,
    reference_frame: SimulationFrame,
    serializer: &dyn ComponentSerializer,
    ctx: &mut SerializerContext<S>,
    last_index: &mut u16,
) -> CodecResult<EntityWrite> {
    if meta.operation.is_unknown() {
        error!(entity = %id, operation = ?meta.operation, "invalid entity operation");
        return Ok(EntityWrite::Skipped);
    }
    check_lod(meta.lod)?;
    let count = components.count();
    if count > MAX_COMPONENT_COUNT {
        return Err(CodecError::LimitsExceeded {
            kind: LimitKind::ComponentsPerEntity,
            limit: MAX_COMPONENT_COUNT,
            actual: count,
        });
    }

    let initial_remaining = ctx.stream().remaining_bit_count();
    let initial_position = ctx.stream().position();

    {
        let stream = ctx.stream_mut();
        *last_index = write_entity_index(stream, id, *last_index)?;
        write_entity_meta(stream, meta)?;
    }

    let entity_frame = min_simulation_frame(id, components).unwrap_or(reference_frame);
    let is_reference_frame_valid =
        serialize_simulation_frame(ctx.stream_mut(), reference_frame, entity_frame)?;

    ctx.stream_mut()
        .write_bits(count as u64, NUM_BITS_FOR_COMPONENT_COUNT)?;

    for update in &components.updates {
        ctx.set_component(update.serialize_type);
        let stream = ctx.stream_mut();
        write_component_header(stream, ComponentState::Update, update.serialize_type)?;

        let mut out = FieldWriter::new(stream);
        let leftover_mask = serializer.write_component_update(
            &update.data,
            update.serialize_type,
            is_reference_frame_valid,
            entity_frame,
            &mut out,
        )?;
        if leftover_mask != 0 {
            debug!(
                entity = %id,
                component = %update.component_type,
                serialize_type = %update.serialize_type,
                original_mask = update.data.fields_mask,
                leftover_mask,
                "component mask not fully consumed"
            );
        }
    }

    for &component in &components.destroys {
        ctx.set_component(component);
        write_component_header(ctx.stream_mut(), ComponentState::Destruct, component)?;
    }

    let taken = bits_taken(ctx.stream(), initial_remaining, initial_position);
    if meta.operation == EntityOperation::Update {
        trace!(entity = %id, operation = ?meta.operation, components = count, "serialize updated");
    } else {
        debug!(entity = %id, operation = ?meta.operation, components = count, "serialize updated");
    }
    Ok(EntityWrite::Written { bits_taken: taken })
}

/// Writes the frame delta of `frame` against `reference`.
///
/// The delta is clamped to `±255`; a delta clamped to `-255` is still written
/// but reported as invalid (returns `false`). Frame `0` writes as "no delta".
pub fn serialize_simulation_frame<S: OutBitStream + ?Sized>(
    stream: &mut S,
    reference: SimulationFrame,
    frame: SimulationFrame,
) -> CodecResult<bool> {
    let delta = if frame.is_zero() {
        0
    } else {
        frame
            .delta_from(reference)
            .clamp(-MAX_SIMFRAME_DELTA, MAX_SIMFRAME_DELTA)
    };
    let is_valid = delta != -MAX_SIMFRAME_DELTA;

    if delta == 0 {
        stream.write_bits(0, NUM_BITS_FOR_SIMFRAME_DELTA_FLAG)?;
    } else {
        stream.write_bits(1, NUM_BITS_FOR_SIMFRAME_DELTA_FLAG)?;
        write_short_varint_signed(stream, delta as i32)?;
    }
    Ok(is_valid)
}

/// Smallest simulation frame reported by the updated components.
///
/// A component reporting frame `0` is logged as an error but its frame still
/// takes part in the minimum.
pub fn min_simulation_frame(id: Entity, components: &ComponentChanges) -> Option<SimulationFrame> {
    let mut min: Option<SimulationFrame> = None;
    for update in &components.updates {
        let Some(frame) = update.data.min_simulation_frame else {
            continue;
        };
        if frame.is_zero() {
            error!(entity = %id, component = %update.component_type, "component reports simulation frame zero");
        }
        if min.map_or(true, |m| frame < m) {
            min = Some(frame);
        }
    }
    min
}

/// Writes the entity meta block. The leading has-meta bit is always set.
pub fn write_entity_meta<S: OutBitStream + ?Sized>(
    stream: &mut S,
    meta: &EntityMeta,
) -> CodecResult<()> {
    let lod = check_lod(meta.lod)?;
    stream.write_bits(1, 1)?;
    stream.write_bits(u64::from(wire_version(meta.version)), NUM_VERSION_BITS)?;
    stream.write_bits(u64::from(meta.has_state_authority), NUM_BITS_FOR_AUTHORITY)?;
    stream.write_bits(u64::from(meta.has_input_authority), NUM_BITS_FOR_AUTHORITY)?;
    stream.write_bits(u64::from(meta.is_orphan), NUM_BITS_FOR_ORPHAN)?;
    stream.write_bits(u64::from(lod), NUM_BITS_FOR_LOD)?;
    stream.write_bits(u64::from(meta.operation.raw()), NUM_BITS_FOR_OPERATION)?;
    Ok(())
}

fn write_entity_index<S: OutBitStream + ?Sized>(
    stream: &mut S,
    id: Entity,
    last_index: u16,
) -> CodecResult<u16> {
    let delta = i32::from(id.index()) - i32::from(last_index);
    write_short_varint_signed(stream, delta)?;
    Ok(id.index())
}

fn write_component_header<S: OutBitStream + ?Sized>(
    stream: &mut S,
    state: ComponentState,
    component: ComponentTypeId,
) -> CodecResult<()> {
    stream.write_bits(u64::from(state.raw()), NUM_BITS_FOR_COMPONENT_STATE)?;
    stream.write_u16(component.raw())?;
    Ok(())
}

fn bits_taken<S: OutBitStream + ?Sized>(
    stream: &S,
    initial_remaining: usize,
    initial_position: usize,
) -> usize {
    if stream.is_full() {
        initial_remaining + stream.overflow_bit_count()
    } else {
        stream.position() - initial_position
    }
}
