//! Commands and inputs serialized into buffers and spliced into packets.

mod common;

use std::collections::VecDeque;

use bitstream::{BitReader, BitWriter, OutBitStream};
use codec::{
    new_end_of_channels_reservation_scope, new_end_of_messages_reservation_scope,
    serialize_command, serialize_input, write_channel_id, write_end_of_channels,
    write_end_of_messages, write_entity_updates, write_messages, write_ordered_commands,
    ClientId, CodecError, ComponentTypeId, Entity, EntityCommand, EntityInput, FieldValue,
    MessageId, RawFieldSerializer, SerializedEntityMessage, SerializerConfig, SerializerContext,
    SimulationFrame,
};
use common::{component, decode_world_update, update, Layouts};
use test_log::test;
use wire::{ChannelId, EntityOperation, MessageTarget, MessageType, ProtocolVersion};

fn command(index: u16, flag: bool) -> EntityCommand {
    EntityCommand {
        entity: Entity::new(index, 2),
        target: MessageTarget::AuthorityOnly,
        component_type: ComponentTypeId::new(40),
        uses_meta: false,
        sender_client_id: ClientId::new(0),
        frame: SimulationFrame::new(0),
        fields: vec![FieldValue::Bool(flag)],
    }
}

fn input(index: u16, frame: i64) -> EntityInput {
    EntityInput {
        entity: Entity::new(index, 2),
        target: MessageTarget::All,
        component_type: ComponentTypeId::new(41),
        frame: SimulationFrame::new(frame),
        fields: Vec::new(),
    }
}

fn serialized_command(index: u16) -> SerializedEntityMessage {
    serialize_command(
        &command(index, true),
        &RawFieldSerializer,
        &SerializerConfig::default(),
    )
    .unwrap()
}

fn serialized_input(index: u16, frame: i64) -> SerializedEntityMessage {
    serialize_input(
        &input(index, frame),
        &RawFieldSerializer,
        &SerializerConfig::default(),
    )
    .unwrap()
}

/// Builds one packet with every section and returns its bytes and bit length.
fn build_packet(
    buf: &mut [u8],
    version: ProtocolVersion,
    commands: &mut VecDeque<SerializedEntityMessage>,
    inputs: &mut VecDeque<SerializedEntityMessage>,
) -> (usize, usize, Vec<Entity>, Vec<SerializedEntityMessage>) {
    let mut ctx = SerializerContext::new(BitWriter::new(buf), version);
    let mut entities = Vec::new();
    let mut messages = Vec::new();
    {
        let mut channels = new_end_of_channels_reservation_scope(&mut ctx);
        write_channel_id(ChannelId::DEFAULT, &mut *channels).unwrap();
        {
            let mut scope = new_end_of_messages_reservation_scope(&mut *channels);
            write_entity_updates(
                &mut entities,
                &[update(
                    1,
                    EntityOperation::Update,
                    vec![component(10, &[(7, 16), (300, 16)])],
                )],
                SimulationFrame::new(0),
                &RawFieldSerializer,
                &mut *scope,
            )
            .unwrap();
            write_messages(&mut messages, MessageType::Command, commands, &mut *scope).unwrap();
            write_messages(&mut messages, MessageType::Input, inputs, &mut *scope).unwrap();
        }
        write_end_of_messages(&mut *channels).unwrap();
    }
    write_end_of_channels(&mut ctx).unwrap();

    let bits = ctx.stream().position();
    assert_eq!(ctx.stream().overflow_bit_count(), 0);
    let used = ctx.into_stream().finish();
    (used, bits, entities, messages)
}

#[test]
fn command_and_input_sizes() {
    let command = serialized_command(3);
    // 42 header bits + meta flag + one bool, padded
    assert_eq!(command.bit_count, 48);
    assert_eq!(command.octets.len(), 6);
    assert_eq!(command.target_entity, Entity::new(3, 2));

    let input = serialized_input(3, 77);
    // 42 header bits + 64-bit frame, padded
    assert_eq!(input.bit_count, 112);
}

#[test]
fn full_packet_splices_messages_until_budget() {
    let mut commands: VecDeque<_> = (1..=3).map(serialized_command).collect();
    let mut inputs: VecDeque<_> = [serialized_input(1, 10), serialized_input(2, 11)].into();

    let mut buf = [0u8; 64];
    let (used, bits, entities, messages) =
        build_packet(&mut buf, ProtocolVersion::CURRENT, &mut commands, &mut inputs);

    assert_eq!(entities, vec![Entity::new(1, 1)]);
    // three commands fit, the second input does not
    assert_eq!(messages.len(), 4);
    assert!(commands.is_empty());
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].target_entity, Entity::new(2, 2));
    assert!(bits <= 512);

    let mut reader = BitReader::with_bit_len(&buf[..used], bits);
    assert_eq!(reader.read_bits(4).unwrap(), u64::from(ChannelId::DEFAULT.raw()));
    let layouts = Layouts::from([(10, vec![16, 16])]);
    assert_eq!(decode_world_update(&mut reader, &layouts).unwrap().len(), 1);

    for message in &messages[..3] {
        assert_eq!(reader.read_u8().unwrap(), MessageType::Command.raw());
        let octets = reader.read_bytes_unaligned(message.bit_count).unwrap();
        assert_eq!(octets, message.octets);
    }
    assert_eq!(reader.read_u8().unwrap(), MessageType::Input.raw());
    let octets = reader.read_bytes_unaligned(messages[3].bit_count).unwrap();
    assert_eq!(octets, messages[3].octets);

    assert_eq!(reader.read_u8().unwrap(), MessageType::EndOfMessages.raw());
    assert_eq!(
        reader.read_bits(4).unwrap(),
        u64::from(ChannelId::END_OF_CHANNELS.raw())
    );
    assert!(reader.is_empty());
}

#[test]
fn initial_protocol_version_omits_channel_ids() {
    let mut buf = [0u8; 64];
    let (_, current_bits, _, _) = build_packet(
        &mut buf,
        ProtocolVersion::CURRENT,
        &mut VecDeque::new(),
        &mut VecDeque::new(),
    );

    let mut buf = [0u8; 64];
    let (used, initial_bits, _, _) = build_packet(
        &mut buf,
        ProtocolVersion::INITIAL,
        &mut VecDeque::new(),
        &mut VecDeque::new(),
    );
    assert_eq!(current_bits - initial_bits, 8);

    let mut reader = BitReader::with_bit_len(&buf[..used], initial_bits);
    let layouts = Layouts::from([(10, vec![16, 16])]);
    assert_eq!(decode_world_update(&mut reader, &layouts).unwrap().len(), 1);
    assert_eq!(reader.read_u8().unwrap(), MessageType::EndOfMessages.raw());
    assert!(reader.is_empty());
}

#[test]
fn ordered_commands_commit_a_prefix() {
    let messages: Vec<_> = [10u16, 11, 13]
        .into_iter()
        .zip(1u16..)
        .map(|(id, index)| (MessageId::new(id), serialized_command(index)))
        .collect();

    // tag (8) + delta (6) + command (48) per record, plus the end marker
    let record_bits = 8 + 6 + 48;
    let capacity = 2 * record_bits + 8;

    let mut buf = [0u8; 64];
    let mut ctx = SerializerContext::new(
        BitWriter::with_capacity_bits(&mut buf, capacity),
        ProtocolVersion::CURRENT,
    );
    let committed = write_ordered_commands(&messages, &mut ctx).unwrap();
    assert_eq!(committed, vec![MessageId::new(10), MessageId::new(11)]);
    assert_eq!(ctx.stream().position(), capacity);
    assert_eq!(ctx.sections()[0].bits, capacity);

    let used = ctx.into_stream().finish();
    let mut reader = BitReader::with_bit_len(&buf[..used], capacity);
    for (delta, (_, message)) in [10, 1].into_iter().zip(&messages) {
        assert_eq!(reader.read_u8().unwrap(), MessageType::Command.raw());
        assert_eq!(reader.read_short_varint_signed().unwrap(), delta);
        let octets = reader.read_bytes_unaligned(message.bit_count).unwrap();
        assert_eq!(octets, message.octets);
    }
    assert_eq!(reader.read_u8().unwrap(), MessageType::EndOfMessages.raw());
}

#[test]
fn oversized_messages_are_rejected() {
    let config = SerializerConfig::default();

    // 42 + 64 + 126 * 64 + 21 = 8191 bits still fits
    let mut fields = vec![FieldValue::F64(1.5); 126];
    fields.push(FieldValue::UInt { value: 0, bits: 21 });
    let mut fits = input(1, 1);
    fits.fields = fields.clone();
    let message = serialize_input(&fits, &RawFieldSerializer, &config).unwrap();
    assert_eq!(message.bit_count, 8192);
    assert_eq!(message.octets.len(), 1024);

    // one more bit fills the buffer exactly, which is rejected
    fields.pop();
    fields.push(FieldValue::UInt { value: 0, bits: 22 });
    let mut exact = input(1, 1);
    exact.fields = fields;
    assert_eq!(
        serialize_input(&exact, &RawFieldSerializer, &config),
        Err(CodecError::MessageTooLarge {
            kind: MessageType::Input,
            max_bytes: 1024,
        })
    );

    let mut huge = command(1, false);
    huge.fields = vec![FieldValue::F64(0.0); 130];
    assert_eq!(
        serialize_command(&huge, &RawFieldSerializer, &config),
        Err(CodecError::MessageTooLarge {
            kind: MessageType::Command,
            max_bytes: 1024,
        })
    );
}

#[test]
fn debug_messages_carry_headers() {
    let config = SerializerConfig {
        use_debug_streams: true,
        ..SerializerConfig::default()
    };
    let message = serialize_command(&command(1, true), &RawFieldSerializer, &config).unwrap();
    // six value writes of 20 bookkeeping bits each, then padding
    assert_eq!(message.bit_count, (44 + 6 * 20usize).div_ceil(8) * 8);
}
