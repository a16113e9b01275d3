#![no_main]

use bitstream::{BitWriter, DebugBitWriter, OutBitStream};
use codec::{
    write_entity_updates, ComponentChanges, ComponentData, ComponentTypeId, ComponentUpdate,
    Entity, EntityChange, EntityMeta, FieldValue, RawFieldSerializer, SerializerContext,
    SimulationFrame,
};
use libfuzzer_sys::fuzz_target;
use wire::{DestroyReason, EntityOperation, ProtocolVersion};

fn changes_from(data: &[u8]) -> Vec<EntityChange> {
    data.chunks_exact(4)
        .take(64)
        .map(|chunk| {
            let index = u16::from_be_bytes([chunk[0], chunk[1]]) % 4096;
            let id = Entity::new(index, u32::from(chunk[2]));
            let operation = EntityOperation::parse(chunk[2] & 0b11).unwrap_or_default();
            let meta = EntityMeta::new(u32::from(chunk[2]), operation).with_lod(chunk[3] % 16);
            if operation == EntityOperation::Destroy {
                let reason = DestroyReason::parse(chunk[3] % 7).unwrap_or(DestroyReason::Unknown);
                return EntityChange::destroy(id, meta, reason);
            }
            let fields = (0..chunk[3] % 5)
                .map(|i| FieldValue::UInt {
                    value: u64::from(chunk[3] >> i),
                    bits: 8,
                })
                .collect();
            let data = ComponentData::all_changed(fields)
                .with_simulation_frame(SimulationFrame::new(i64::from(chunk[1]) * 3));
            EntityChange::update(
                id,
                meta,
                ComponentChanges {
                    updates: vec![ComponentUpdate::new(ComponentTypeId::new(1), data)],
                    destroys: Vec::new(),
                },
            )
        })
        .collect()
}

fn check<S: OutBitStream>(stream: S, changes: &[EntityChange]) {
    let capacity = stream.capacity_bits();
    let mut ctx = SerializerContext::new(stream, ProtocolVersion::CURRENT);
    let mut written = Vec::new();
    let result = write_entity_updates(
        &mut written,
        changes,
        SimulationFrame::new(300),
        &RawFieldSerializer,
        &mut ctx,
    );

    assert_eq!(ctx.reserved_bits(), 0);
    if result.is_err() {
        assert!(written.is_empty());
        assert_eq!(ctx.stream().position(), 0);
        assert!(ctx.sections().is_empty());
        return;
    }
    assert_eq!(ctx.stream().overflow_bit_count(), 0);
    assert!(ctx.stream().position() <= capacity);

    let mut expected = changes
        .iter()
        .filter(|change| !change.operation().is_unknown())
        .map(|change| change.id);
    for id in &written {
        assert_eq!(Some(*id), expected.next());
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&head, rest)) = data.split_first() else {
        return;
    };
    let changes = changes_from(rest);
    let capacity = 11 + usize::from(head) * 8;
    let debug_capacity = 91 + usize::from(head) * 16;

    let mut buf = vec![0u8; 4096];
    check(BitWriter::with_capacity_bits(&mut buf, capacity), &changes);

    let mut buf = vec![0u8; 4096];
    check(
        DebugBitWriter::new(BitWriter::with_capacity_bits(&mut buf, debug_capacity)),
        &changes,
    );
});
