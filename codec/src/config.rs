//! Serializer configuration.

use wire::ProtocolVersion;

/// Settings shared by every packet a connection builds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SerializerConfig {
    /// Negotiated protocol version; gates channel ids.
    pub protocol_version: ProtocolVersion,

    /// Packet budget in bytes.
    pub max_packet_bytes: usize,

    /// Wrap streams in the debug decorator.
    pub use_debug_streams: bool,

    /// Write the sender's client id into command meta.
    pub include_sender_client_id: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            // Stays under a typical 1280-byte path MTU once transport headers are added
            max_packet_bytes: 1200,
            use_debug_streams: false,
            include_sender_client_id: false,
        }
    }
}

impl SerializerConfig {
    /// Creates a configuration suitable for testing with a small packet budget.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            protocol_version: ProtocolVersion::CURRENT,
            max_packet_bytes: 128,
            use_debug_streams: false,
            include_sender_client_id: false,
        }
    }

    /// Packet budget in bits.
    #[must_use]
    pub const fn packet_capacity_bits(&self) -> usize {
        self.max_packet_bytes.saturating_mul(8)
    }
}
