use bitstream::{
    write_short_varint, write_short_varint_signed, BitReader, BitWriter, DebugBitWriter,
    OutBitStream, DEBUG_BITS_PER_WRITE, SHORT_VARINT_SENTINEL,
};

#[test]
fn bounded_writer_roundtrip_bits() {
    let mut buf = [0u8; 8];
    let mut writer = BitWriter::new(&mut buf);
    writer.write_bits(0b1010, 4).unwrap();
    writer.write_bits(0xAB, 8).unwrap();
    let bytes_used = writer.finish();

    let mut reader = BitReader::new(&buf[..bytes_used]);
    assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
    assert_eq!(reader.read_bits(8).unwrap(), 0xAB);
}

#[test]
fn spliced_message_roundtrip() {
    // A self-contained message, as produced for a command.
    let mut msg_buf = [0u8; 4];
    let mut msg = BitWriter::new(&mut msg_buf);
    msg.write_bits(0b1_0110, 5).unwrap();
    msg.write_u16(0x1234).unwrap();
    let msg_bits = msg.position();
    let msg_len = msg.finish();

    // Spliced into a packet at an odd offset.
    let mut packet_buf = [0u8; 8];
    let mut packet = BitWriter::new(&mut packet_buf);
    packet.write_bits(0b101, 3).unwrap();
    packet
        .write_bytes_unaligned(&msg_buf[..msg_len], msg_bits)
        .unwrap();
    write_short_varint(&mut packet, SHORT_VARINT_SENTINEL).unwrap();
    let used = packet.finish();

    let mut reader = BitReader::new(&packet_buf[..used]);
    assert_eq!(reader.read_bits(3).unwrap(), 0b101);
    assert_eq!(reader.read_bits(5).unwrap(), 0b1_0110);
    assert_eq!(reader.read_u16().unwrap(), 0x1234);
    assert_eq!(reader.read_short_varint().unwrap(), SHORT_VARINT_SENTINEL);
}

#[test]
fn debug_stream_roundtrip_skipping_headers() {
    let mut buf = [0u8; 32];
    let mut writer = DebugBitWriter::new(BitWriter::new(&mut buf));
    writer.write_u8(7).unwrap();
    write_short_varint_signed(&mut writer, -12).unwrap();
    let used = writer.into_inner().finish();

    let mut reader = BitReader::new(&buf[..used]);
    reader.skip_bits(DEBUG_BITS_PER_WRITE).unwrap();
    assert_eq!(reader.read_u8().unwrap(), 7);
    // -12 is written as prefix, payload and sign bit
    reader.skip_bits(DEBUG_BITS_PER_WRITE).unwrap();
    assert!(!reader.read_bit().unwrap());
    reader.skip_bits(DEBUG_BITS_PER_WRITE).unwrap();
    assert_eq!(reader.read_bits(4).unwrap(), 12);
    reader.skip_bits(DEBUG_BITS_PER_WRITE).unwrap();
    assert!(!reader.read_bit().unwrap());
}

#[test]
fn rewound_bytes_are_overwritten() {
    let mut buf = [0u8; 2];
    let mut writer = BitWriter::new(&mut buf);
    writer.write_u8(0xFF).unwrap();
    writer.write_u16(0xFFFF).unwrap();
    assert!(writer.overflow_bit_count() > 0);
    writer.seek(8);
    writer.write_u8(0x01).unwrap();
    assert_eq!(writer.overflow_bit_count(), 0);
    assert_eq!(writer.finish(), 2);
    assert_eq!(buf, [0xFF, 0x01]);
}
