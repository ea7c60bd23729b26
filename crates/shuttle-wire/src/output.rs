//! Write side of the wire boundary, used to produce messages for a reader.

use crate::object::WireObject;

/// Writer invoked to produce the values of a message or nested sequence.
pub type ValueWriter<'w> = dyn FnMut(&mut dyn ValueOut) + 'w;

/// Sink for the values of one message.
pub trait ValueOut {
    /// Writes the empty payload of a zero-argument call.
    fn empty(&mut self);

    /// Writes a boolean.
    fn bool(&mut self, value: bool);

    /// Writes an 8-bit integer.
    fn int8(&mut self, value: i8);

    /// Writes a single character.
    fn character(&mut self, value: char);

    /// Writes a 16-bit integer.
    fn int16(&mut self, value: i16);

    /// Writes a 32-bit integer.
    fn int32(&mut self, value: i32);

    /// Writes a 64-bit integer.
    fn int64(&mut self, value: i64);

    /// Writes a 32-bit float.
    fn float32(&mut self, value: f32);

    /// Writes a 64-bit float.
    fn float64(&mut self, value: f64);

    /// Writes text.
    fn text(&mut self, value: &str);

    /// Writes a nested sequence produced by `write`.
    fn sequence(&mut self, write: &mut ValueWriter<'_>);

    /// Writes a typed object as the sequence of its fields.
    fn object(&mut self, object: &dyn WireObject) {
        self.sequence(&mut |fields| object.write_fields(fields));
    }
}

/// Sink for whole messages.
pub trait WireOut {
    /// Writes a message with a symbolic header.
    fn write_named(&mut self, name: &str, write: &mut ValueWriter<'_>);

    /// Writes a message with a numeric method id header.
    fn write_numbered(&mut self, id: u32, write: &mut ValueWriter<'_>);
}
