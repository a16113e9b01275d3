//! Entity change records consumed by the entity serializer.
//!
//! These are plain values owned by the simulation layer. The serializer only
//! reads them.

use wire::{DestroyReason, EntityOperation};

use crate::types::{ComponentTypeId, Entity, SimulationFrame};

/// Per-entity header written in front of every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EntityMeta {
    /// Full version counter; written modulo [`wire::MAX_VERSIONS`].
    pub version: u32,
    pub has_state_authority: bool,
    pub has_input_authority: bool,
    pub is_orphan: bool,
    /// Level of detail, at most [`wire::MAX_LOD`].
    pub lod: u8,
    pub operation: EntityOperation,
}

impl EntityMeta {
    /// Creates meta for `operation` with every flag cleared.
    #[must_use]
    pub const fn new(version: u32, operation: EntityOperation) -> Self {
        Self {
            version,
            has_state_authority: false,
            has_input_authority: false,
            is_orphan: false,
            lod: 0,
            operation,
        }
    }

    /// Sets the authority flags.
    #[must_use]
    pub const fn with_authority(mut self, state: bool, input: bool) -> Self {
        self.has_state_authority = state;
        self.has_input_authority = input;
        self
    }

    /// Sets the level of detail.
    #[must_use]
    pub const fn with_lod(mut self, lod: u8) -> Self {
        self.lod = lod;
        self
    }

    /// Sets the orphan flag.
    #[must_use]
    pub const fn with_orphan(mut self, is_orphan: bool) -> Self {
        self.is_orphan = is_orphan;
        self
    }
}

/// A single field value handed to a component serializer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldValue {
    Bool(bool),
    /// Unsigned integer written in `bits` bits.
    #[cfg_attr(feature = "serde", serde(rename = "uint"))]
    UInt { value: u64, bits: u8 },
    /// Two's-complement integer written in `bits` bits.
    Int { value: i64, bits: u8 },
    F32(f32),
    F64(f64),
}

/// Field data of one component, with a mask of the fields that changed.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ComponentData {
    /// Bit `i` set means `fields[i]` changed.
    pub fields_mask: u64,
    pub fields: Vec<FieldValue>,
    /// Smallest simulation frame among the changed fields, if any field carries one.
    pub min_simulation_frame: Option<SimulationFrame>,
}

impl ComponentData {
    /// Data with every field marked as changed.
    #[must_use]
    pub fn all_changed(fields: Vec<FieldValue>) -> Self {
        let fields_mask = match fields.len() {
            0 => 0,
            n if n >= 64 => u64::MAX,
            n => (1u64 << n) - 1,
        };
        Self {
            fields_mask,
            fields,
            min_simulation_frame: None,
        }
    }

    /// Attaches a minimum simulation frame.
    #[must_use]
    pub fn with_simulation_frame(mut self, frame: SimulationFrame) -> Self {
        self.min_simulation_frame = Some(frame);
        self
    }
}

/// An updated component.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentUpdate {
    /// Base component type.
    pub component_type: ComponentTypeId,
    /// Type actually written after level-of-detail resolution.
    pub serialize_type: ComponentTypeId,
    pub data: ComponentData,
}

impl ComponentUpdate {
    /// An update whose serialize type equals its base type.
    #[must_use]
    pub const fn new(component_type: ComponentTypeId, data: ComponentData) -> Self {
        Self {
            component_type,
            serialize_type: component_type,
            data,
        }
    }
}

/// Component diff of an updated entity.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ComponentChanges {
    /// Updated components, written in this order.
    pub updates: Vec<ComponentUpdate>,
    /// Components removed from the entity.
    pub destroys: Vec<ComponentTypeId>,
}

impl ComponentChanges {
    /// Number of component records written for this diff.
    #[must_use]
    pub fn count(&self) -> usize {
        self.updates.len() + self.destroys.len()
    }

    /// Returns `true` if the diff carries no component records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Payload of an entity change.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityUpdate {
    Destroy { reason: DestroyReason },
    Update(ComponentChanges),
}

/// One entity's change for this packet.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityChange {
    pub id: Entity,
    pub meta: EntityMeta,
    pub update: EntityUpdate,
}

impl EntityChange {
    /// Creates an update (or create) change.
    #[must_use]
    pub const fn update(id: Entity, meta: EntityMeta, components: ComponentChanges) -> Self {
        Self {
            id,
            meta,
            update: EntityUpdate::Update(components),
        }
    }

    /// Creates a destroy change.
    #[must_use]
    pub const fn destroy(id: Entity, meta: EntityMeta, reason: DestroyReason) -> Self {
        Self {
            id,
            meta,
            update: EntityUpdate::Destroy { reason },
        }
    }

    /// Returns the operation carried by the meta.
    #[must_use]
    pub const fn operation(&self) -> EntityOperation {
        self.meta.operation
    }

    /// Returns `true` for destroy changes.
    #[must_use]
    pub const fn is_destroy(&self) -> bool {
        matches!(self.update, EntityUpdate::Destroy { .. })
    }
}
