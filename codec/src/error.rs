//! Error types for codec operations.

use std::fmt;

use wire::{ChannelId, MessageType};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that stop serialization of the current packet or message.
///
/// Running out of room mid-batch is not an error: the orchestrators roll the
/// partial write back and report what was committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Wire vocabulary error.
    Wire(wire::WireError),

    /// Bitstream error.
    Bitstream(bitstream::BitError),

    /// Channel id outside the routable range.
    InvalidChannelId { channel: ChannelId },

    /// A trailing marker did not fit although room had been reserved for it.
    InsufficientSpace { marker: Marker },

    /// A single command or input exceeds the message size limit.
    MessageTooLarge { kind: MessageType, max_bytes: usize },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Trailing markers whose space is guaranteed by a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    EndOfEntities,
    EndOfMessages,
    EndOfChannels,
    ChannelId,
}

/// Specific limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    ComponentsPerEntity,
    FieldsPerComponent,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::Bitstream(e) => write!(f, "bitstream error: {e}"),
            Self::InvalidChannelId { channel } => {
                write!(
                    f,
                    "invalid channel id {}, only channels {}-{} are supported",
                    channel.raw(),
                    ChannelId::MIN.raw(),
                    ChannelId::MAX.raw()
                )
            }
            Self::InsufficientSpace { marker } => {
                write!(f, "failed to write {marker}, not enough space left")
            }
            Self::MessageTooLarge { kind, max_bytes } => {
                write!(
                    f,
                    "{} is too large and will not be sent (limit {max_bytes} bytes)",
                    kind.name()
                )
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::EndOfEntities => "EndOfEntities",
            Self::EndOfMessages => "EndOfMessages",
            Self::EndOfChannels => "EndOfChannels",
            Self::ChannelId => "ChannelID",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ComponentsPerEntity => "components per entity",
            Self::FieldsPerComponent => "fields per component",
        };
        write!(f, "{name}")
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(e) => Some(e),
            Self::Bitstream(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wire::WireError> for CodecError {
    fn from(err: wire::WireError) -> Self {
        Self::Wire(err)
    }
}

impl From<bitstream::BitError> for CodecError {
    fn from(err: bitstream::BitError) -> Self {
        Self::Bitstream(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_insufficient_space() {
        let err = CodecError::InsufficientSpace {
            marker: Marker::EndOfMessages,
        };
        let msg = err.to_string();
        assert!(msg.contains("EndOfMessages"));
        assert!(msg.contains("not enough space"));
    }

    #[test]
    fn error_display_invalid_channel() {
        let err = CodecError::InvalidChannelId {
            channel: ChannelId::from_raw(15),
        };
        assert!(err.to_string().contains("0-14"));
    }

    #[test]
    fn error_display_message_too_large() {
        let err = CodecError::MessageTooLarge {
            kind: MessageType::Command,
            max_bytes: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("Command"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn error_display_limits() {
        let err = CodecError::LimitsExceeded {
            kind: LimitKind::ComponentsPerEntity,
            limit: 31,
            actual: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("components per entity"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn from_bit_error() {
        let bit_err = bitstream::BitError::InvalidBitCount {
            bits: 65,
            max_bits: 64,
        };
        let err: CodecError = bit_err.clone().into();
        assert_eq!(err, CodecError::Bitstream(bit_err));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn from_wire_error() {
        let err: CodecError = wire::WireError::LodOutOfRange { lod: 20 }.into();
        assert!(matches!(err, CodecError::Wire(_)));
    }
}
