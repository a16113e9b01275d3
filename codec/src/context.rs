//! Serializer context: the stream plus the bookkeeping one packet needs.
//!
//! The context owns the output stream for the duration of a packet build and
//! tracks reserved trailing bits, section statistics and the entity and
//! component currently being written. Nothing in it outlives the packet.

use std::ops::{Deref, DerefMut};

use bitstream::OutBitStream;
use wire::ProtocolVersion;

use crate::types::{ComponentTypeId, Entity};

/// Bits spent by one closed section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionStats {
    pub name: &'static str,
    pub bits: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenSection {
    name: &'static str,
    start: usize,
}

/// Per-packet serialization state.
#[derive(Debug)]
pub struct SerializerContext<S> {
    stream: S,
    protocol_version: ProtocolVersion,
    /// Outstanding reservations, innermost last.
    reservations: Vec<usize>,
    reserved_bits: usize,
    section: Option<OpenSection>,
    sections: Vec<SectionStats>,
    free_bits_in_empty_packet: usize,
    entity: Option<Entity>,
    component: Option<ComponentTypeId>,
}

impl<S: OutBitStream> SerializerContext<S> {
    /// Creates a context writing to `stream`.
    pub fn new(stream: S, protocol_version: ProtocolVersion) -> Self {
        let free_bits_in_empty_packet = stream.capacity_bits();
        Self {
            stream,
            protocol_version,
            reservations: Vec::new(),
            reserved_bits: 0,
            section: None,
            sections: Vec::new(),
            free_bits_in_empty_packet,
            entity: None,
            component: None,
        }
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Returns the stream, ending the packet build.
    pub fn into_stream(self) -> S {
        debug_assert!(self.reservations.is_empty(), "reservation outlived its scope");
        self.stream
    }

    pub const fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }

    /// Whether the stream interleaves debug bookkeeping with values.
    pub fn use_debug_streams(&self) -> bool {
        self.stream.is_debug()
    }

    /// Total bits currently held back for trailing markers.
    pub const fn reserved_bits(&self) -> usize {
        self.reserved_bits
    }

    /// Remaining capacity once every reservation is honoured.
    pub fn remaining_unreserved_bit_count(&self) -> usize {
        self.stream
            .remaining_bit_count()
            .saturating_sub(self.reserved_bits)
    }

    /// Returns `true` if the stream overflowed or eats into reserved bits.
    pub fn is_stream_full(&self) -> bool {
        self.stream.overflow_bit_count() > 0
            || self.stream.remaining_bit_count() < self.reserved_bits
    }

    /// Holds back `bits` until the returned scope is dropped.
    ///
    /// Scopes nest: an inner scope is opened through the outer one and must be
    /// dropped first.
    pub fn new_reservation_scope(&mut self, bits: usize) -> ReservationScope<'_, S> {
        self.reservations.push(bits);
        self.reserved_bits += bits;
        let depth = self.reservations.len();
        ReservationScope {
            ctx: self,
            bits,
            depth,
        }
    }

    /// Starts measuring a named section at the current position.
    pub fn start_section(&mut self, name: &'static str) {
        debug_assert!(self.section.is_none(), "section already open");
        self.section = Some(OpenSection {
            name,
            start: self.stream.position(),
        });
    }

    /// Closes the open section and records its size.
    pub fn end_section(&mut self) {
        if let Some(section) = self.section.take() {
            self.sections.push(SectionStats {
                name: section.name,
                bits: self.stream.position().saturating_sub(section.start),
            });
        }
        self.entity = None;
        self.component = None;
    }

    /// Drops the open section without recording it.
    pub fn abort_section(&mut self) {
        self.section = None;
        self.entity = None;
        self.component = None;
    }

    /// Sizes of every closed section, in order.
    pub fn sections(&self) -> &[SectionStats] {
        &self.sections
    }

    /// Records how many bits the open section could use in a packet that
    /// carried nothing else, net of current reservations.
    pub fn set_bits_remaining_in_empty_packet(&mut self) {
        let used_by_section = self
            .section
            .map_or(0, |s| self.stream.position().saturating_sub(s.start));
        self.free_bits_in_empty_packet = self
            .stream
            .capacity_bits()
            .saturating_sub(used_by_section)
            .saturating_sub(self.reserved_bits);
    }

    /// Baseline recorded by [`set_bits_remaining_in_empty_packet`](Self::set_bits_remaining_in_empty_packet).
    pub const fn free_bits_in_empty_packet(&self) -> usize {
        self.free_bits_in_empty_packet
    }

    pub fn set_entity(&mut self, entity: Entity) {
        self.entity = Some(entity);
        self.component = None;
    }

    pub fn set_component(&mut self, component: ComponentTypeId) {
        self.component = Some(component);
    }

    /// Entity currently being written, for diagnostics.
    pub const fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// Component currently being written, for diagnostics.
    pub const fn component(&self) -> Option<ComponentTypeId> {
        self.component
    }
}

impl<S> SerializerContext<S> {
    fn release(&mut self, bits: usize, depth: usize) {
        debug_assert_eq!(self.reservations.len(), depth, "reservations released out of order");
        let released = self.reservations.pop();
        debug_assert_eq!(released, Some(bits));
        self.reserved_bits = self.reserved_bits.saturating_sub(bits);
    }
}

/// A reservation of trailing bits, released on drop.
///
/// The scope dereferences to the context, so the write loop keeps using the
/// context through it while the reservation is active.
#[derive(Debug)]
pub struct ReservationScope<'a, S> {
    ctx: &'a mut SerializerContext<S>,
    bits: usize,
    depth: usize,
}

impl<S> ReservationScope<'_, S> {
    /// Bits held by this scope.
    pub const fn bits(&self) -> usize {
        self.bits
    }
}

impl<S> Deref for ReservationScope<'_, S> {
    type Target = SerializerContext<S>;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl<S> DerefMut for ReservationScope<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl<S> Drop for ReservationScope<'_, S> {
    fn drop(&mut self) {
        self.ctx.release(self.bits, self.depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream::{BitWriter, DebugBitWriter};
    use test_log::test;

    fn context(buf: &mut [u8]) -> SerializerContext<BitWriter<'_>> {
        SerializerContext::new(BitWriter::new(buf), ProtocolVersion::CURRENT)
    }

    #[test]
    fn reservation_reduces_unreserved_room() {
        let mut buf = [0u8; 4];
        let mut ctx = context(&mut buf);
        assert_eq!(ctx.remaining_unreserved_bit_count(), 32);
        {
            let scope = ctx.new_reservation_scope(10);
            assert_eq!(scope.bits(), 10);
            assert_eq!(scope.reserved_bits(), 10);
            assert_eq!(scope.remaining_unreserved_bit_count(), 22);
        }
        assert_eq!(ctx.reserved_bits(), 0);
        assert_eq!(ctx.remaining_unreserved_bit_count(), 32);
    }

    #[test]
    fn nested_reservations_release_in_order() {
        let mut buf = [0u8; 4];
        let mut ctx = context(&mut buf);
        let mut outer = ctx.new_reservation_scope(3);
        {
            let inner = outer.new_reservation_scope(8);
            assert_eq!(inner.reserved_bits(), 11);
        }
        assert_eq!(outer.reserved_bits(), 3);
        drop(outer);
        assert_eq!(ctx.reserved_bits(), 0);
    }

    #[test]
    fn stream_full_when_reserved_bits_are_touched() {
        let mut buf = [0u8; 2];
        let mut ctx = context(&mut buf);
        let mut scope = ctx.new_reservation_scope(4);
        scope.stream_mut().write_bits(0, 12).unwrap();
        assert!(!scope.is_stream_full());
        scope.stream_mut().write_bool(true).unwrap();
        assert!(scope.is_stream_full());
        assert_eq!(scope.stream().overflow_bit_count(), 0);
    }

    #[test]
    fn stream_full_on_overflow_without_reservation() {
        let mut buf = [0u8; 1];
        let mut ctx = context(&mut buf);
        ctx.stream_mut().write_u8(0xFF).unwrap();
        assert!(!ctx.is_stream_full());
        ctx.stream_mut().write_bool(true).unwrap();
        assert!(ctx.is_stream_full());
    }

    #[test]
    fn sections_record_bits() {
        let mut buf = [0u8; 8];
        let mut ctx = context(&mut buf);
        ctx.start_section("first");
        ctx.stream_mut().write_bits(0, 5).unwrap();
        ctx.end_section();
        ctx.start_section("dropped");
        ctx.stream_mut().write_bits(0, 3).unwrap();
        ctx.abort_section();
        assert_eq!(
            ctx.sections(),
            &[SectionStats {
                name: "first",
                bits: 5
            }]
        );
    }

    #[test]
    fn empty_packet_baseline_excludes_section_and_reservations() {
        let mut buf = [0u8; 8];
        let mut ctx = context(&mut buf);
        ctx.stream_mut().write_bits(0, 20).unwrap();
        ctx.start_section("world");
        ctx.stream_mut().write_u8(1).unwrap();
        let mut scope = ctx.new_reservation_scope(3);
        scope.set_bits_remaining_in_empty_packet();
        assert_eq!(scope.free_bits_in_empty_packet(), 64 - 8 - 3);
    }

    #[test]
    fn entity_and_component_tracking() {
        let mut buf = [0u8; 1];
        let mut ctx = context(&mut buf);
        ctx.start_section("world");
        ctx.set_entity(Entity::new(4, 1));
        ctx.set_component(ComponentTypeId::new(2));
        assert_eq!(ctx.entity(), Some(Entity::new(4, 1)));
        assert_eq!(ctx.component(), Some(ComponentTypeId::new(2)));
        ctx.set_entity(Entity::new(5, 1));
        assert_eq!(ctx.component(), None);
        ctx.end_section();
        assert_eq!(ctx.entity(), None);
    }

    #[test]
    fn debug_flag_follows_stream() {
        let mut plain_buf = [0u8; 1];
        let plain = context(&mut plain_buf);
        assert!(!plain.use_debug_streams());

        let mut debug_buf = [0u8; 1];
        let debug = SerializerContext::new(
            DebugBitWriter::new(BitWriter::new(&mut debug_buf)),
            ProtocolVersion::CURRENT,
        );
        assert!(debug.use_debug_streams());
        assert_eq!(debug.protocol_version(), ProtocolVersion::CURRENT);
    }
}
