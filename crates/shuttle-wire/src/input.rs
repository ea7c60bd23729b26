//! Read side of the wire boundary.
//!
//! A [`WireIn`] yields one message header at a time and then exposes the
//! message payload through a [`ValueIn`]. Both traits are object safe so the
//! dispatcher can drive any codec through `&mut dyn` references.

use crate::error::WireError;
use crate::object::{ObjectType, WireObject};

/// Header of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Compact numeric method id.
    Id(u32),
    /// Symbolic name, written into the caller's name buffer.
    Named,
}

/// Visitor invoked over the values of a nested sequence.
pub type SequenceVisitor<'v> = dyn FnMut(&mut dyn ValueIn) -> Result<(), WireError> + 'v;

/// Source of values for the payload of one message.
pub trait ValueIn {
    /// Reads a boolean.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or not a boolean.
    fn bool(&mut self) -> Result<bool, WireError>;

    /// Reads an 8-bit integer.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or out of range.
    fn int8(&mut self) -> Result<i8, WireError>;

    /// Reads a single character.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or not a
    /// character.
    fn character(&mut self) -> Result<char, WireError>;

    /// Reads a 16-bit integer.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or out of range.
    fn int16(&mut self) -> Result<i16, WireError>;

    /// Reads a 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or out of range.
    fn int32(&mut self) -> Result<i32, WireError>;

    /// Reads a 64-bit integer.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or not an
    /// integer.
    fn int64(&mut self) -> Result<i64, WireError>;

    /// Reads a 32-bit float.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or not a number.
    fn float32(&mut self) -> Result<f32, WireError>;

    /// Reads a 64-bit float.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or not a number.
    fn float64(&mut self) -> Result<f64, WireError>;

    /// Reads text into `buffer`, replacing its contents.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or not text.
    fn text_into(&mut self, buffer: &mut String) -> Result<(), WireError>;

    /// Reads text into a fresh string.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is missing or not text.
    fn text(&mut self) -> Result<String, WireError> {
        let mut buffer = String::new();
        self.text_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Consumes the next value without decoding it.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if there is no value to skip.
    fn skip_value(&mut self) -> Result<(), WireError>;

    /// Returns `true` while unread values remain at this nesting level.
    fn has_remaining(&self) -> bool;

    /// Visits the values of the next nested sequence.
    ///
    /// The source is positioned after the whole sequence when this returns
    /// `Ok`, even if the visitor left values unread.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is not a sequence or the
    /// visitor fails.
    fn sequence(&mut self, visitor: &mut SequenceVisitor<'_>) -> Result<(), WireError>;

    /// Reads a typed object, populating `reuse` when one is supplied.
    ///
    /// Objects travel as a nested sequence of their fields.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the next value is not a sequence or the
    /// object rejects its fields.
    fn object(
        &mut self,
        reuse: Option<Box<dyn WireObject>>,
        object_type: &ObjectType,
    ) -> Result<Box<dyn WireObject>, WireError> {
        let mut object = reuse.unwrap_or_else(|| object_type.new_instance());
        self.sequence(&mut |fields| object.read_fields(fields))?;
        Ok(object)
    }
}

/// Source of whole messages.
pub trait WireIn {
    /// Reads the next message header.
    ///
    /// Returns `Ok(None)` at the end of input. For [`Event::Named`] headers
    /// the name replaces the contents of `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the header is malformed.
    fn read_event(&mut self, name: &mut String) -> Result<Option<Event>, WireError>;

    /// Returns the payload source of the message whose header was read last.
    fn value_in(&mut self) -> &mut dyn ValueIn;

    /// Returns an opaque position that [`WireIn::rewind`] accepts.
    fn position(&self) -> usize;

    /// Moves the read position back to one previously returned by
    /// [`WireIn::position`].
    fn rewind(&mut self, position: usize);

    /// Leaves the source at the next message header after a payload read
    /// stopped part way.
    ///
    /// `payload_start` is the [`WireIn::position`] taken right after the
    /// header was read. The default rewinds there and skips the whole
    /// payload.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if the payload itself cannot be skipped.
    fn finish_payload(&mut self, payload_start: usize) -> Result<(), WireError> {
        self.rewind(payload_start);
        self.value_in().skip_value()
    }
}
