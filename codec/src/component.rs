//! The component-serializer capability and the field writer it writes through.
//!
//! Field layouts are schema-specific and live outside this crate. The
//! serializers call into a [`ComponentSerializer`] for every component,
//! command and input payload. [`RawFieldSerializer`] is a schema-less
//! implementation that writes [`FieldValue`]s as they come.

use bitstream::{BitError, OutBitStream};

use crate::change::{ComponentData, FieldValue};
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::message::{EntityCommand, EntityInput};
use crate::types::{ComponentTypeId, SimulationFrame, Vector3d};

/// Largest number of fields a component can describe in its mask.
pub const MAX_FIELDS_PER_COMPONENT: usize = 64;

/// Typed writes on top of a bit stream.
pub struct FieldWriter<'a> {
    stream: &'a mut dyn OutBitStream,
}

impl<'a> FieldWriter<'a> {
    /// Wraps `stream`.
    pub fn new(stream: &'a mut dyn OutBitStream) -> Self {
        Self { stream }
    }

    /// Returns the current stream position in bits.
    pub fn position(&self) -> usize {
        self.stream.position()
    }

    pub fn write_bool(&mut self, value: bool) -> CodecResult<()> {
        Ok(self.stream.write_bool(value)?)
    }

    pub fn write_bits(&mut self, value: u64, bits: u8) -> CodecResult<()> {
        Ok(self.stream.write_bits(value, bits)?)
    }

    /// Writes a 64-bit two's-complement integer.
    pub fn write_long(&mut self, value: i64) -> CodecResult<()> {
        Ok(self.stream.write_u64(value as u64)?)
    }

    pub fn write_f32(&mut self, value: f32) -> CodecResult<()> {
        Ok(self.stream.write_bits(u64::from(value.to_bits()), 32)?)
    }

    pub fn write_f64(&mut self, value: f64) -> CodecResult<()> {
        Ok(self.stream.write_u64(value.to_bits())?)
    }

    pub fn write_vector3d(&mut self, value: Vector3d) -> CodecResult<()> {
        self.write_f64(value.x)?;
        self.write_f64(value.y)?;
        self.write_f64(value.z)
    }

    /// Writes one field value in its declared width.
    pub fn write_field(&mut self, field: &FieldValue) -> CodecResult<()> {
        match *field {
            FieldValue::Bool(value) => self.write_bool(value),
            FieldValue::UInt { value, bits } => self.write_bits(value, bits),
            FieldValue::Int { value, bits } => self.write_signed(value, bits),
            FieldValue::F32(value) => self.write_f32(value),
            FieldValue::F64(value) => self.write_f64(value),
        }
    }

    fn write_signed(&mut self, value: i64, bits: u8) -> CodecResult<()> {
        if bits == 0 || bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: usize::from(bits),
                max_bits: 64,
            }
            .into());
        }
        if bits == 64 {
            return self.write_long(value);
        }
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if value < min || value > max {
            return Err(BitError::ValueOutOfRange {
                value: value as u64,
                bits: usize::from(bits),
            }
            .into());
        }
        let raw = (value as u64) & ((1u64 << bits) - 1);
        self.write_bits(raw, bits)
    }
}

/// Schema-specific encoder for component, command and input payloads.
pub trait ComponentSerializer {
    /// Writes the changed fields of one component.
    ///
    /// Returns the part of `data.fields_mask` that was not consumed. A
    /// non-zero leftover is logged by the caller but is not an error.
    fn write_component_update(
        &self,
        data: &ComponentData,
        serialize_type: ComponentTypeId,
        is_reference_frame_valid: bool,
        reference_frame: SimulationFrame,
        out: &mut FieldWriter<'_>,
    ) -> CodecResult<u64>;

    /// Writes the payload of a command.
    fn write_command(&self, command: &EntityCommand, out: &mut FieldWriter<'_>)
        -> CodecResult<()>;

    /// Writes the payload of an input.
    fn write_input(&self, input: &EntityInput, out: &mut FieldWriter<'_>) -> CodecResult<()>;
}

/// Writes a component's field mask (one bit per field) followed by each
/// changed field. Commands and inputs are written field by field.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawFieldSerializer;

impl ComponentSerializer for RawFieldSerializer {
    fn write_component_update(
        &self,
        data: &ComponentData,
        _serialize_type: ComponentTypeId,
        _is_reference_frame_valid: bool,
        _reference_frame: SimulationFrame,
        out: &mut FieldWriter<'_>,
    ) -> CodecResult<u64> {
        let count = data.fields.len();
        if count > MAX_FIELDS_PER_COMPONENT {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::FieldsPerComponent,
                limit: MAX_FIELDS_PER_COMPONENT,
                actual: count,
            });
        }
        let known = if count == MAX_FIELDS_PER_COMPONENT {
            u64::MAX
        } else {
            (1u64 << count) - 1
        };
        let mask = data.fields_mask & known;
        out.write_bits(mask, count as u8)?;
        for (i, field) in data.fields.iter().enumerate() {
            if (mask >> i) & 1 == 1 {
                out.write_field(field)?;
            }
        }
        Ok(data.fields_mask & !known)
    }

    fn write_command(
        &self,
        command: &EntityCommand,
        out: &mut FieldWriter<'_>,
    ) -> CodecResult<()> {
        for field in &command.fields {
            out.write_field(field)?;
        }
        Ok(())
    }

    fn write_input(&self, input: &EntityInput, out: &mut FieldWriter<'_>) -> CodecResult<()> {
        for field in &input.fields {
            out.write_field(field)?;
        }
        Ok(())
    }
}
