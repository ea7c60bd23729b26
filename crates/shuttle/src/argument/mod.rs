//! Per-parameter decode strategies.
//!
//! The strategy for each parameter is fixed when a reader is built, so the
//! per-message path is a direct leaf read into the parameter's slot with no
//! kind dispatch beyond one match.

use once_cell::unsync::OnceCell;
use shuttle_wire::{IntConverter, LongConverter, ObjectType, ValueIn, WireError, WireType};

use crate::contract::{IntConverterFactory, LongConverterFactory, ParamKind, Parameter};
use crate::value::Value;

/// How one parameter is read from the value source.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Decode {
    Bool,
    Int8,
    Char,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    /// Text parsed by a 32-bit converter.
    ConvertedInt(IntConverterFactory),
    /// Text parsed by a 64-bit converter.
    ConvertedLong(LongConverterFactory),
    Object(ObjectType),
}

impl Decode {
    /// Picks the strategy for `parameter` on `wire_type`.
    ///
    /// Conversion tags apply only on textual formats and only when the tag
    /// offers a converter for the parameter's width.
    pub(crate) fn for_parameter(parameter: &Parameter, wire_type: WireType) -> Self {
        let conversion = parameter
            .conversion()
            .filter(|_| wire_type.is_textual());
        match parameter.kind() {
            ParamKind::Bool => Self::Bool,
            ParamKind::Int8 => Self::Int8,
            ParamKind::Char => Self::Char,
            ParamKind::Int16 => Self::Int16,
            ParamKind::Int32 => conversion
                .and_then(|tag| tag.int_factory())
                .map_or(Self::Int32, Self::ConvertedInt),
            ParamKind::Int64 => conversion
                .and_then(|tag| tag.long_factory())
                .map_or(Self::Int64, Self::ConvertedLong),
            ParamKind::Float32 => Self::Float32,
            ParamKind::Float64 => Self::Float64,
            ParamKind::Text => Self::Text,
            ParamKind::Object(object_type) => Self::Object(object_type),
        }
    }

    pub(crate) const fn is_converted(self) -> bool {
        matches!(self, Self::ConvertedInt(_) | Self::ConvertedLong(_))
    }
}

/// Lazily built converter owned by one parameter site.
#[derive(Debug, Default)]
pub(crate) struct ConverterCell {
    int: OnceCell<Box<dyn IntConverter>>,
    long: OnceCell<Box<dyn LongConverter>>,
}

/// Decode strategies of one operation, in parameter order.
#[derive(Debug, Clone)]
pub(crate) struct ArgumentPlan {
    decodes: Vec<Decode>,
}

impl ArgumentPlan {
    pub(crate) fn new(params: &[Parameter], wire_type: WireType) -> Self {
        Self {
            decodes: params
                .iter()
                .map(|parameter| Decode::for_parameter(parameter, wire_type))
                .collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.decodes.len()
    }

    pub(crate) fn decodes(&self) -> &[Decode] {
        &self.decodes
    }

    /// Creates the persistent slots for one operation.
    pub(crate) fn new_slots(&self) -> Vec<Value> {
        self.decodes.iter().map(|_| Value::Unset).collect()
    }

    /// Creates the converter cells for one operation.
    pub(crate) fn new_converters(&self) -> Vec<ConverterCell> {
        self.decodes.iter().map(|_| ConverterCell::default()).collect()
    }

    /// Decodes argument `index` from `input` into `slot`.
    pub(crate) fn decode(
        &self,
        index: usize,
        input: &mut dyn ValueIn,
        slot: &mut Value,
        converter: &ConverterCell,
        scratch: &mut String,
    ) -> Result<(), WireError> {
        let Some(decode) = self.decodes.get(index) else {
            return Err(WireError::malformed(format!("no decode plan for argument {index}")));
        };
        match *decode {
            Decode::Bool => *slot = Value::Bool(input.bool()?),
            Decode::Int8 => *slot = Value::Int8(input.int8()?),
            Decode::Char => *slot = Value::Char(input.character()?),
            Decode::Int16 => *slot = Value::Int16(input.int16()?),
            Decode::Int32 => *slot = Value::Int32(input.int32()?),
            Decode::Int64 => *slot = Value::Int64(input.int64()?),
            Decode::Float32 => *slot = Value::Float32(input.float32()?),
            Decode::Float64 => *slot = Value::Float64(input.float64()?),
            Decode::Text => decode_text(input, slot)?,
            Decode::ConvertedInt(factory) => {
                input.text_into(scratch)?;
                let parsed = converter
                    .int
                    .get_or_init(factory)
                    .parse(scratch)?;
                *slot = Value::Int32(parsed);
            }
            Decode::ConvertedLong(factory) => {
                input.text_into(scratch)?;
                let parsed = converter
                    .long
                    .get_or_init(factory)
                    .parse(scratch)?;
                *slot = Value::Int64(parsed);
            }
            Decode::Object(object_type) => decode_object(input, slot, &object_type)?,
        }
        Ok(())
    }
}

fn decode_text(input: &mut dyn ValueIn, slot: &mut Value) -> Result<(), WireError> {
    if let Value::Text(buffer) = slot {
        input.text_into(buffer)
    } else {
        *slot = Value::Text(input.text()?);
        Ok(())
    }
}

fn decode_object(
    input: &mut dyn ValueIn,
    slot: &mut Value,
    object_type: &ObjectType,
) -> Result<(), WireError> {
    let reuse = match std::mem::take(slot) {
        Value::Object(previous) if object_type.is_recyclable() => previous,
        _ => None,
    };
    *slot = Value::Object(Some(input.object(reuse, object_type)?));
    Ok(())
}

#[cfg(test)]
mod tests;
