//! Mirror decoder for packets written with plain streams and `RawFieldSerializer`.

#![allow(dead_code)]

use std::collections::HashMap;

use bitstream::{BitReader, BitResult};
use codec::{
    ComponentChanges, ComponentData, ComponentTypeId, ComponentUpdate, Entity, EntityChange,
    EntityMeta, FieldValue, SimulationFrame,
};
use wire::{ComponentState, DestroyReason, EntityOperation, MessageType, END_OF_ENTITIES};

/// Field widths per serialize type.
pub type Layouts = HashMap<u16, Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEntity {
    pub index: u16,
    pub version: u8,
    pub has_state_authority: bool,
    pub has_input_authority: bool,
    pub is_orphan: bool,
    pub lod: u8,
    pub operation: EntityOperation,
    pub body: DecodedBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedBody {
    Destroy(DestroyReason),
    Update {
        frame_delta: Option<i32>,
        components: Vec<DecodedComponent>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedComponent {
    Update {
        serialize_type: u16,
        mask: u64,
        values: Vec<u64>,
    },
    Destruct(u16),
}

/// Reads an `EcsWorldUpdate` section up to and including its end marker.
pub fn decode_world_update(
    reader: &mut BitReader<'_>,
    layouts: &Layouts,
) -> BitResult<Vec<DecodedEntity>> {
    assert_eq!(
        reader.read_u8()?,
        MessageType::EcsWorldUpdate.raw(),
        "section tag"
    );

    let mut entities = Vec::new();
    let mut last_index = 0i32;
    loop {
        let magnitude = reader.read_short_varint()?;
        if magnitude == END_OF_ENTITIES {
            return Ok(entities);
        }
        let delta = if reader.read_bit()? {
            i32::from(magnitude)
        } else {
            -i32::from(magnitude)
        };
        last_index += delta;

        assert!(reader.read_bit()?, "has-meta bit");
        let version = reader.read_bits(8)? as u8;
        let has_state_authority = reader.read_bit()?;
        let has_input_authority = reader.read_bit()?;
        let is_orphan = reader.read_bit()?;
        let lod = reader.read_bits(4)? as u8;
        let operation = EntityOperation::parse(reader.read_bits(2)? as u8).expect("operation");

        let body = if operation == EntityOperation::Destroy {
            let reason = DestroyReason::parse(reader.read_bits(3)? as u8).expect("reason");
            DecodedBody::Destroy(reason)
        } else {
            let frame_delta = if reader.read_bit()? {
                Some(reader.read_short_varint_signed()?)
            } else {
                None
            };
            let count = reader.read_bits(5)?;
            let mut components = Vec::new();
            for _ in 0..count {
                let state = ComponentState::parse(reader.read_bits(2)? as u8).expect("state");
                let serialize_type = reader.read_u16()?;
                match state {
                    ComponentState::Update => {
                        let widths = &layouts[&serialize_type];
                        let mask = reader.read_bits(widths.len() as u8)?;
                        let mut values = Vec::new();
                        for (i, &width) in widths.iter().enumerate() {
                            if (mask >> i) & 1 == 1 {
                                values.push(reader.read_bits(width)?);
                            }
                        }
                        components.push(DecodedComponent::Update {
                            serialize_type,
                            mask,
                            values,
                        });
                    }
                    ComponentState::Destruct => {
                        components.push(DecodedComponent::Destruct(serialize_type));
                    }
                }
            }
            DecodedBody::Update {
                frame_delta,
                components,
            }
        };

        entities.push(DecodedEntity {
            index: u16::try_from(last_index).expect("index in range"),
            version,
            has_state_authority,
            has_input_authority,
            is_orphan,
            lod,
            operation,
            body,
        });
    }
}

/// A component of serialize type `ty` whose fields are unsigned values of the given widths.
pub fn component(ty: u16, values: &[(u64, u8)]) -> ComponentUpdate {
    let fields = values
        .iter()
        .map(|&(value, bits)| FieldValue::UInt { value, bits })
        .collect();
    ComponentUpdate::new(ComponentTypeId::new(ty), ComponentData::all_changed(fields))
}

pub fn update(index: u16, operation: EntityOperation, updates: Vec<ComponentUpdate>) -> EntityChange {
    EntityChange::update(
        Entity::new(index, 1),
        EntityMeta::new(1, operation),
        ComponentChanges {
            updates,
            destroys: Vec::new(),
        },
    )
}

pub fn destroy(index: u16, reason: DestroyReason) -> EntityChange {
    EntityChange::destroy(
        Entity::new(index, 1),
        EntityMeta::new(1, EntityOperation::Destroy),
        reason,
    )
}

pub fn with_frame(mut update: ComponentUpdate, frame: i64) -> ComponentUpdate {
    update.data.min_simulation_frame = Some(SimulationFrame::new(frame));
    update
}
