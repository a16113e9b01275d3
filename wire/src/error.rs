//! Error types for wire vocabulary parsing.

use std::fmt;

/// Result type for wire vocabulary operations.
pub type WireResult<T> = Result<T, WireError>;

/// Raw values that do not map onto the wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireError {
    /// Unknown message type tag.
    UnknownMessageType { raw: u8 },

    /// Unknown entity operation.
    UnknownEntityOperation { raw: u8 },

    /// Unknown destroy reason.
    UnknownDestroyReason { raw: u8 },

    /// Unknown component state.
    UnknownComponentState { raw: u8 },

    /// Unknown message target.
    UnknownMessageTarget { raw: u8 },

    /// Channel id outside the routable range.
    InvalidChannelId { raw: u8 },

    /// Level of detail does not fit its field.
    LodOutOfRange { lod: u8 },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMessageType { raw } => write!(f, "unknown message type: {raw}"),
            Self::UnknownEntityOperation { raw } => {
                write!(f, "unknown entity operation: {raw}")
            }
            Self::UnknownDestroyReason { raw } => write!(f, "unknown destroy reason: {raw}"),
            Self::UnknownComponentState { raw } => write!(f, "unknown component state: {raw}"),
            Self::UnknownMessageTarget { raw } => write!(f, "unknown message target: {raw}"),
            Self::InvalidChannelId { raw } => {
                write!(
                    f,
                    "invalid channel id {raw}, only channels {}-{} are supported",
                    crate::ChannelId::MIN.raw(),
                    crate::ChannelId::MAX.raw()
                )
            }
            Self::LodOutOfRange { lod } => {
                write!(f, "lod {lod} exceeds {} bits", crate::NUM_BITS_FOR_LOD)
            }
        }
    }
}

impl std::error::Error for WireError {}
