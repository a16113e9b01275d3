//! Scenario encoding and bit-usage reports for the netpack serializer.
//!
//! A [`Scenario`] is a JSON description of one packet's worth of pending
//! work: entity changes, commands, inputs and ordered commands.
//! [`encode_scenario`] runs it through the codec the way a connection would and
//! returns a [`PacketReport`] with what was committed, what stayed queued and
//! where the bits went.
//!
//! Packet layout produced here:
//!
//! ```text
//! channel | [floating origin] | world update | commands | inputs | end of messages
//!         | [ordered channel | ordered commands | end of messages]
//! end of channels
//! ```
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what the serializer did with the budget.

use std::collections::VecDeque;
use std::fmt::Write as _;

use bitstream::{BitWriter, DebugBitWriter, DebugStreamType, DebugUsage, OutBitStream};
use codec::{
    new_end_of_channels_reservation_scope, new_end_of_messages_reservation_scope,
    serialize_command, serialize_input, write_channel_id, write_end_of_channels,
    write_end_of_messages, write_entity_updates, write_floating_origin, write_messages,
    write_ordered_commands, CodecError, CodecResult, Entity, EntityChange, EntityCommand,
    EntityInput, MessageId, RawFieldSerializer, SerializedEntityMessage, SerializerConfig,
    SerializerContext, SimulationFrame, Vector3d,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wire::{ChannelId, MessageType};

/// One packet's worth of pending work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: SerializerConfig,
    /// Channel carrying entity updates, commands and inputs.
    pub channel: ChannelId,
    /// Channel carrying ordered commands.
    pub ordered_channel: ChannelId,
    pub reference_frame: SimulationFrame,
    pub floating_origin: Option<Vector3d>,
    pub entities: Vec<EntityChange>,
    pub commands: Vec<EntityCommand>,
    pub inputs: Vec<EntityInput>,
    pub ordered_commands: Vec<OrderedCommand>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            config: SerializerConfig::default(),
            channel: ChannelId::DEFAULT,
            ordered_channel: ChannelId::from_raw(1),
            reference_frame: SimulationFrame::default(),
            floating_origin: None,
            entities: Vec::new(),
            commands: Vec::new(),
            inputs: Vec::new(),
            ordered_commands: Vec::new(),
        }
    }
}

/// A command that must be delivered in id order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedCommand {
    pub id: MessageId,
    #[serde(flatten)]
    pub command: EntityCommand,
}

/// Size of one packet section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub name: &'static str,
    pub bits: usize,
}

/// Debug stream bookkeeping for one value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugUsageReport {
    pub kind: String,
    pub writes: usize,
    pub value_bits: usize,
    pub bookkeeping_bits: usize,
}

impl DebugUsageReport {
    fn new(ty: DebugStreamType, usage: DebugUsage) -> Self {
        Self {
            kind: format!("{ty:?}"),
            writes: usage.writes,
            value_bits: usage.value_bits,
            bookkeeping_bits: usage.bookkeeping_bits,
        }
    }
}

/// What one encoded scenario produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PacketReport {
    pub capacity_bits: usize,
    pub bits: usize,
    pub bytes: usize,
    /// Packet bytes as lowercase hex.
    pub hex: String,
    #[serde(skip)]
    pub packet: Vec<u8>,
    pub entities_written: Vec<Entity>,
    pub entities_pending: usize,
    pub commands_written: usize,
    pub commands_pending: usize,
    pub inputs_written: usize,
    pub inputs_pending: usize,
    pub ordered_committed: Vec<MessageId>,
    pub ordered_pending: usize,
    /// Commands and inputs dropped because they exceed the message size limit.
    pub rejected_messages: usize,
    pub sections: Vec<SectionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_usage: Option<Vec<DebugUsageReport>>,
}

#[derive(Debug, Default)]
struct Queues {
    commands: VecDeque<SerializedEntityMessage>,
    inputs: VecDeque<SerializedEntityMessage>,
    ordered: Vec<(MessageId, SerializedEntityMessage)>,
    rejected: usize,
}

#[derive(Debug, Default)]
struct Committed {
    entities: Vec<Entity>,
    commands: Vec<SerializedEntityMessage>,
    inputs: Vec<SerializedEntityMessage>,
    ordered: Vec<MessageId>,
}

/// Encodes `scenario` into a single packet.
///
/// # Errors
///
/// Returns the codec error that aborted the packet. Commands and inputs that
/// exceed the message size limit are dropped and counted instead.
pub fn encode_scenario(scenario: &Scenario) -> CodecResult<PacketReport> {
    let config = &scenario.config;
    let mut queues = serialize_messages(scenario)?;
    let mut committed = Committed::default();

    let mut buf = vec![0u8; config.max_packet_bytes];
    let (sections, debug_usage, bits, bytes) = if config.use_debug_streams {
        let stream = DebugBitWriter::new(BitWriter::new(&mut buf));
        let ctx = write_packet(stream, scenario, &mut queues, &mut committed)?;
        let sections = section_reports(&ctx);
        let stream = ctx.into_stream();
        let usage: Vec<_> = DebugStreamType::ALL
            .iter()
            .map(|&ty| DebugUsageReport::new(ty, stream.usage(ty)))
            .collect();
        let bits = stream.position();
        (sections, Some(usage), bits, stream.into_inner().finish())
    } else {
        let ctx = write_packet(BitWriter::new(&mut buf), scenario, &mut queues, &mut committed)?;
        let sections = section_reports(&ctx);
        let stream = ctx.into_stream();
        let bits = stream.position();
        (sections, None, bits, stream.finish())
    };

    Ok(PacketReport {
        capacity_bits: config.packet_capacity_bits(),
        bits,
        bytes,
        hex: to_hex(&buf[..bytes]),
        packet: buf[..bytes].to_vec(),
        entities_pending: scenario.entities.len() - committed.entities.len(),
        entities_written: committed.entities,
        commands_written: committed.commands.len(),
        commands_pending: queues.commands.len(),
        inputs_written: committed.inputs.len(),
        inputs_pending: queues.inputs.len(),
        ordered_pending: queues.ordered.len() - committed.ordered.len(),
        ordered_committed: committed.ordered,
        rejected_messages: queues.rejected,
        sections,
        debug_usage,
    })
}

fn serialize_messages(scenario: &Scenario) -> CodecResult<Queues> {
    let config = &scenario.config;
    let mut queues = Queues::default();

    for command in &scenario.commands {
        if let Some(message) = accept(
            serialize_command(command, &RawFieldSerializer, config),
            &mut queues.rejected,
        )? {
            queues.commands.push_back(message);
        }
    }
    for input in &scenario.inputs {
        if let Some(message) = accept(
            serialize_input(input, &RawFieldSerializer, config),
            &mut queues.rejected,
        )? {
            queues.inputs.push_back(message);
        }
    }
    for ordered in &scenario.ordered_commands {
        if let Some(message) = accept(
            serialize_command(&ordered.command, &RawFieldSerializer, config),
            &mut queues.rejected,
        )? {
            queues.ordered.push((ordered.id, message));
        }
    }
    Ok(queues)
}

fn accept(
    result: CodecResult<SerializedEntityMessage>,
    rejected: &mut usize,
) -> CodecResult<Option<SerializedEntityMessage>> {
    match result {
        Ok(message) => Ok(Some(message)),
        Err(err @ CodecError::MessageTooLarge { .. }) => {
            warn!(error = %err, "dropping message");
            *rejected += 1;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn write_packet<S: OutBitStream>(
    stream: S,
    scenario: &Scenario,
    queues: &mut Queues,
    committed: &mut Committed,
) -> CodecResult<SerializerContext<S>> {
    let mut ctx = SerializerContext::new(stream, scenario.config.protocol_version);
    {
        let mut channels = new_end_of_channels_reservation_scope(&mut ctx);
        write_channel_id(scenario.channel, &mut *channels)?;
        if let Some(origin) = scenario.floating_origin {
            write_floating_origin(origin, &mut *channels)?;
        }
        {
            let mut messages = new_end_of_messages_reservation_scope(&mut *channels);
            write_entity_updates(
                &mut committed.entities,
                &scenario.entities,
                scenario.reference_frame,
                &RawFieldSerializer,
                &mut *messages,
            )?;
            write_messages(
                &mut committed.commands,
                MessageType::Command,
                &mut queues.commands,
                &mut *messages,
            )?;
            write_messages(
                &mut committed.inputs,
                MessageType::Input,
                &mut queues.inputs,
                &mut *messages,
            )?;
        }
        write_end_of_messages(&mut *channels)?;

        if !queues.ordered.is_empty() {
            if channels.protocol_version().includes_channel_id() {
                let mark = channels.stream().position();
                write_channel_id(scenario.ordered_channel, &mut *channels)?;
                committed.ordered = write_ordered_commands(&queues.ordered, &mut *channels)?;
                if committed.ordered.is_empty() {
                    channels.stream_mut().seek(mark);
                }
            } else {
                debug!(
                    pending = queues.ordered.len(),
                    "ordered commands need a protocol version with channel ids"
                );
            }
        }
    }
    write_end_of_channels(&mut ctx)?;
    Ok(ctx)
}

fn section_reports<S: OutBitStream>(ctx: &SerializerContext<S>) -> Vec<SectionReport> {
    ctx.sections()
        .iter()
        .map(|s| SectionReport {
            name: s.name,
            bits: s.bits,
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Renders a report for terminal output.
#[must_use]
pub fn format_report_pretty(report: &PacketReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "packet: {} bits / {} bytes (capacity {} bits)",
        report.bits, report.bytes, report.capacity_bits
    );
    let entities: Vec<String> = report
        .entities_written
        .iter()
        .map(ToString::to_string)
        .collect();
    let _ = writeln!(
        out,
        "entities: {} written [{}], {} pending",
        entities.len(),
        entities.join(", "),
        report.entities_pending
    );
    let _ = writeln!(
        out,
        "commands: {} written, {} pending",
        report.commands_written, report.commands_pending
    );
    let _ = writeln!(
        out,
        "inputs: {} written, {} pending",
        report.inputs_written, report.inputs_pending
    );
    let ordered: Vec<String> = report
        .ordered_committed
        .iter()
        .map(|id| id.raw().to_string())
        .collect();
    let _ = writeln!(
        out,
        "ordered commands: [{}] committed, {} pending",
        ordered.join(", "),
        report.ordered_pending
    );
    if report.rejected_messages > 0 {
        let _ = writeln!(out, "rejected messages: {}", report.rejected_messages);
    }
    let _ = writeln!(out, "sections:");
    for section in &report.sections {
        let _ = writeln!(out, "  {}: {} bits", section.name, section.bits);
    }
    if let Some(usage) = &report.debug_usage {
        let _ = writeln!(out, "debug usage:");
        for entry in usage.iter().filter(|u| u.writes > 0) {
            let _ = writeln!(
                out,
                "  {}: {} writes, {} value bits, {} bookkeeping bits",
                entry.kind, entry.writes, entry.value_bits, entry.bookkeeping_bits
            );
        }
    }
    let _ = write!(out, "hex: {}", report.hex);
    out
}
