//! Core identifiers and values shared by the serializers.

use std::fmt;

/// A networked entity: a relative index plus a version counter.
///
/// The version detects reuse of an index slot; only its low
/// [`NUM_VERSION_BITS`](wire::NUM_VERSION_BITS) bits travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entity {
    index: u16,
    version: u32,
}

impl Entity {
    /// Creates a new entity reference.
    #[must_use]
    pub const fn new(index: u16, version: u32) -> Self {
        Self { index, version }
    }

    /// Returns the relative index.
    #[must_use]
    pub const fn index(self) -> u16 {
        self.index
    }

    /// Returns the full version counter.
    #[must_use]
    pub const fn version(self) -> u32 {
        self.version
    }

    /// Returns the version as written to the wire.
    #[must_use]
    pub const fn wire_version(self) -> u8 {
        wire::wire_version(self.version)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.version)
    }
}

/// An absolute simulation frame.
///
/// Frame `0` doubles as "not initialized" in some producers; see
/// [`min_simulation_frame`](crate::min_simulation_frame).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationFrame(i64);

impl SimulationFrame {
    /// Creates a new simulation frame.
    #[must_use]
    pub const fn new(frame: i64) -> Self {
        Self(frame)
    }

    /// Returns the raw frame number.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Returns `true` for frame zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Signed distance from `reference` to `self`, saturating at the `i64` bounds.
    #[must_use]
    pub const fn delta_from(self, reference: Self) -> i64 {
        self.0.saturating_sub(reference.0)
    }
}

impl From<i64> for SimulationFrame {
    fn from(frame: i64) -> Self {
        Self(frame)
    }
}

/// Identifier of an ordered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageId(u16);

impl MessageId {
    /// Creates a new message id.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Identifier of a connected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientId(u32);

impl ClientId {
    /// Creates a new client id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Serialize type id of a component.
///
/// With level of detail, the base type and the type actually written can
/// differ; both are represented by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentTypeId(u16);

impl ComponentTypeId {
    /// Creates a new component type id.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A double-precision position, used for the floating origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3d {
    /// Creates a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
