//! Entity vocabulary: identity constants, operations, destroy reasons and
//! component states.

use crate::error::{WireError, WireResult};

/// Bits used for the entity version on the wire.
pub const NUM_VERSION_BITS: u8 = 8;

/// Number of distinct versions before the counter wraps.
pub const MAX_VERSIONS: u32 = 1 << NUM_VERSION_BITS;

/// Entity index reserved as the end-of-entities marker.
pub const END_OF_ENTITIES: u16 = u16::MAX;

/// Largest index a live entity may use.
pub const MAX_ENTITY_INDEX: u16 = END_OF_ENTITIES - 1;

/// Bits of a message entity id (index followed by version).
pub const NUM_BITS_FOR_MESSAGE_ENTITY: usize = 16 + NUM_VERSION_BITS as usize;

/// Version as written to the wire: always `version % MAX_VERSIONS`.
#[must_use]
pub const fn wire_version(version: u32) -> u8 {
    (version % MAX_VERSIONS) as u8
}

/// What happened to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum EntityOperation {
    /// Never valid on the wire; serializers log and skip it.
    #[default]
    Unknown = 0,
    Create = 1,
    Update = 2,
    Destroy = 3,
}

impl EntityOperation {
    /// Parses an operation from its raw 2-bit value.
    pub const fn parse(raw: u8) -> WireResult<Self> {
        match raw {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Create),
            2 => Ok(Self::Update),
            3 => Ok(Self::Destroy),
            _ => Err(WireError::UnknownEntityOperation { raw }),
        }
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Returns `true` for [`EntityOperation::Unknown`].
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// Why an entity was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DestroyReason {
    #[default]
    Unknown = 0,
    BadUpdate = 1,
    UnauthorizedCreate = 2,
    MaxEntitiesReached = 3,
    ClientDestroy = 4,
    OrphanCleanup = 5,
    OutOfQuery = 6,
}

impl DestroyReason {
    /// Parses a reason from its raw 3-bit value.
    pub const fn parse(raw: u8) -> WireResult<Self> {
        match raw {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::BadUpdate),
            2 => Ok(Self::UnauthorizedCreate),
            3 => Ok(Self::MaxEntitiesReached),
            4 => Ok(Self::ClientDestroy),
            5 => Ok(Self::OrphanCleanup),
            6 => Ok(Self::OutOfQuery),
            _ => Err(WireError::UnknownDestroyReason { raw }),
        }
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// State prefix of each component record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ComponentState {
    Update = 1,
    Destruct = 2,
}

impl ComponentState {
    /// Parses a state from its raw 2-bit value.
    pub const fn parse(raw: u8) -> WireResult<Self> {
        match raw {
            1 => Ok(Self::Update),
            2 => Ok(Self::Destruct),
            _ => Err(WireError::UnknownComponentState { raw }),
        }
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Validates that `lod` fits its wire field.
pub const fn check_lod(lod: u8) -> WireResult<u8> {
    if lod > crate::MAX_LOD {
        Err(WireError::LodOutOfRange { lod })
    } else {
        Ok(lod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_wraps_modulo_max_versions() {
        assert_eq!(wire_version(0), 0);
        assert_eq!(wire_version(255), 255);
        assert_eq!(wire_version(256), 0);
        assert_eq!(wire_version(300), 44);
    }

    #[test]
    fn operation_parse_roundtrip() {
        for op in [
            EntityOperation::Unknown,
            EntityOperation::Create,
            EntityOperation::Update,
            EntityOperation::Destroy,
        ] {
            assert_eq!(EntityOperation::parse(op.raw()), Ok(op));
        }
        assert_eq!(
            EntityOperation::parse(4),
            Err(WireError::UnknownEntityOperation { raw: 4 })
        );
    }

    #[test]
    fn destroy_reason_fits_three_bits() {
        for raw in 0..7 {
            let reason = DestroyReason::parse(raw).unwrap();
            assert!(reason.raw() < 1 << crate::NUM_BITS_FOR_DESTROY_REASON);
        }
        assert!(DestroyReason::parse(7).is_err());
    }

    #[test]
    fn component_state_rejects_zero() {
        assert_eq!(
            ComponentState::parse(0),
            Err(WireError::UnknownComponentState { raw: 0 })
        );
        assert_eq!(ComponentState::parse(2), Ok(ComponentState::Destruct));
    }

    #[test]
    fn lod_check() {
        assert_eq!(check_lod(15), Ok(15));
        assert_eq!(check_lod(16), Err(WireError::LodOutOfRange { lod: 16 }));
    }

    #[test]
    fn end_of_entities_is_not_a_live_index() {
        assert!(MAX_ENTITY_INDEX < END_OF_ENTITIES);
        assert_eq!(NUM_BITS_FOR_MESSAGE_ENTITY, 24);
    }
}
