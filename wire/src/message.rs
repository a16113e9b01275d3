//! Message vocabulary: type tags, targets, channels and protocol versions.

use crate::error::{WireError, WireResult};

/// Tag written in front of every top-level packet section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageType {
    /// Terminates a run of messages.
    EndOfMessages = 0,
    EcsWorldUpdate = 1,
    Command = 2,
    Input = 3,
}

impl MessageType {
    /// Parses a message type from its raw tag.
    pub const fn parse(raw: u8) -> WireResult<Self> {
        match raw {
            0 => Ok(Self::EndOfMessages),
            1 => Ok(Self::EcsWorldUpdate),
            2 => Ok(Self::Command),
            3 => Ok(Self::Input),
            _ => Err(WireError::UnknownMessageType { raw }),
        }
    }

    /// Returns the raw tag.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Human-readable name, used to label sections in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::EndOfMessages => "EndOfMessages",
            Self::EcsWorldUpdate => "EcsWorldUpdate",
            Self::Command => "Command",
            Self::Input => "Input",
        }
    }
}

/// Who a command or input is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum MessageTarget {
    #[default]
    All = 0,
    AuthorityOnly = 1,
    Other = 2,
}

impl MessageTarget {
    /// Parses a target from its raw 2-bit value.
    pub const fn parse(raw: u8) -> WireResult<Self> {
        match raw {
            0 => Ok(Self::All),
            1 => Ok(Self::AuthorityOnly),
            2 => Ok(Self::Other),
            _ => Err(WireError::UnknownMessageTarget { raw }),
        }
    }

    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Routing channel of a packet segment.
///
/// Any raw value can be held so that callers can carry what they were given;
/// [`is_valid`](Self::is_valid) decides whether it may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelId(u8);

impl ChannelId {
    /// Lowest routable channel.
    pub const MIN: Self = Self(0);

    /// Highest routable channel.
    pub const MAX: Self = Self(14);

    /// Marker terminating the list of channels.
    pub const END_OF_CHANNELS: Self = Self(15);

    /// Default channel.
    pub const DEFAULT: Self = Self::MIN;

    /// Wraps a raw value without validation.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// Creates a routable channel id.
    pub const fn new(raw: u8) -> WireResult<Self> {
        let id = Self(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(WireError::InvalidChannelId { raw })
        }
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns `true` if the id is within `MIN..=MAX`.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= Self::MIN.0 && self.0 <= Self::MAX.0
    }
}

/// Negotiated protocol version of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolVersion(u32);

impl ProtocolVersion {
    /// First released version.
    pub const INITIAL: Self = Self(1);

    /// First version that writes channel ids.
    pub const INCLUDES_CHANNEL_ID: Self = Self(2);

    /// Version spoken by this crate.
    pub const CURRENT: Self = Self(2);

    /// Creates a version from its raw number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw number.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if channel ids are written at this version.
    #[must_use]
    pub const fn includes_channel_id(self) -> bool {
        self.0 >= Self::INCLUDES_CHANNEL_ID.0
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}
