//! Tagged stop-bit binary codec.
//!
//! Every value starts with a one byte type code. Integers, characters and
//! float bit patterns follow as stop-bit varints (seven bits per byte, high
//! bit set on all but the last byte); signed integers are zigzag encoded.
//! Text and nested sequences carry a varint byte length so a reader can
//! skip them without decoding.
//!
//! A message is a header followed by exactly one payload value. The header
//! is either [`FIELD_NAME`] and the name as text bytes, or
//! [`FIELD_NUMBER`] and the method id as a varint.

use crate::error::WireError;
use crate::input::{Event, SequenceVisitor, ValueIn, WireIn};
use crate::output::{ValueOut, ValueWriter, WireOut};

/// Header marker for a message addressed by name.
pub const FIELD_NAME: u8 = 0xB9;
/// Header marker for a message addressed by numeric method id.
pub const FIELD_NUMBER: u8 = 0xBA;

const EMPTY: u8 = 0xBB;
const FALSE: u8 = 0xB0;
const TRUE: u8 = 0xB1;
const CHAR: u8 = 0xA0;
const INT8: u8 = 0xA4;
const INT16: u8 = 0xA5;
const INT32: u8 = 0xA6;
const INT64: u8 = 0xA7;
const FLOAT32: u8 = 0x90;
const FLOAT64: u8 = 0x91;
const TEXT: u8 = 0xB8;
const SEQUENCE: u8 = 0x82;

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// In-memory binary message writer.
///
/// # Example
///
/// ```
/// use shuttle_wire::{BinaryWire, Event, ValueIn, WireIn, WireOut};
///
/// let mut wire = BinaryWire::new();
/// wire.write_named("greet", &mut |out| out.text("hello"));
///
/// let mut reader = wire.reader();
/// let mut name = String::new();
/// assert_eq!(reader.read_event(&mut name).ok(), Some(Some(Event::Named)));
/// assert_eq!(name, "greet");
/// assert_eq!(reader.value_in().text().ok().as_deref(), Some("hello"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryWire {
    bytes: Vec<u8>,
}

impl BinaryWire {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the writer and returns the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns a reader over everything written so far.
    #[must_use]
    pub fn reader(&self) -> BinaryReader<'_> {
        BinaryReader::new(&self.bytes)
    }

    /// Removes all written messages.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    fn write_varint(&mut self, value: u64) {
        let mut remaining = value;
        while remaining >= 0x80 {
            self.bytes.push(low_seven(remaining) | 0x80);
            remaining >>= 7;
        }
        self.bytes.push(low_seven(remaining));
    }

    fn write_signed(&mut self, code: u8, value: i64) {
        self.bytes.push(code);
        self.write_varint(zigzag(value));
    }

    fn write_len(&mut self, len: usize) {
        self.write_varint(u64::try_from(len).unwrap_or(u64::MAX));
    }

    fn write_payload(&mut self, write: &mut ValueWriter<'_>) {
        let start = self.bytes.len();
        write(self);
        if self.bytes.len() == start {
            self.bytes.push(EMPTY);
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is masked to seven bits"
)]
const fn low_seven(value: u64) -> u8 {
    (value & 0x7F) as u8
}

const fn zigzag(value: i64) -> u64 {
    (value << 1 ^ (value >> 63)).cast_unsigned()
}

const fn unzigzag(value: u64) -> i64 {
    (value >> 1).cast_signed() ^ (value & 1).cast_signed().wrapping_neg()
}

impl ValueOut for BinaryWire {
    fn empty(&mut self) {
        self.bytes.push(EMPTY);
    }

    fn bool(&mut self, value: bool) {
        self.bytes.push(if value { TRUE } else { FALSE });
    }

    fn int8(&mut self, value: i8) {
        self.write_signed(INT8, i64::from(value));
    }

    fn character(&mut self, value: char) {
        self.bytes.push(CHAR);
        self.write_varint(u64::from(u32::from(value)));
    }

    fn int16(&mut self, value: i16) {
        self.write_signed(INT16, i64::from(value));
    }

    fn int32(&mut self, value: i32) {
        self.write_signed(INT32, i64::from(value));
    }

    fn int64(&mut self, value: i64) {
        self.write_signed(INT64, value);
    }

    fn float32(&mut self, value: f32) {
        self.bytes.push(FLOAT32);
        self.write_varint(u64::from(value.to_bits()));
    }

    fn float64(&mut self, value: f64) {
        self.bytes.push(FLOAT64);
        self.write_varint(value.to_bits());
    }

    fn text(&mut self, value: &str) {
        self.bytes.push(TEXT);
        self.write_len(value.len());
        self.bytes.extend_from_slice(value.as_bytes());
    }

    fn sequence(&mut self, write: &mut ValueWriter<'_>) {
        let mut nested = Self::new();
        write(&mut nested);
        self.bytes.push(SEQUENCE);
        self.write_len(nested.bytes.len());
        self.bytes.extend_from_slice(&nested.bytes);
    }
}

impl WireOut for BinaryWire {
    fn write_named(&mut self, name: &str, write: &mut ValueWriter<'_>) {
        self.bytes.push(FIELD_NAME);
        self.write_len(name.len());
        self.bytes.extend_from_slice(name.as_bytes());
        self.write_payload(write);
    }

    fn write_numbered(&mut self, id: u32, write: &mut ValueWriter<'_>) {
        self.bytes.push(FIELD_NUMBER);
        self.write_varint(u64::from(id));
        self.write_payload(write);
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Reader over binary messages produced by [`BinaryWire`].
///
/// The same type serves as the top-level message source and as the value
/// source of nested sequences, in which case it is bounded to the
/// sequence's bytes.
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> BinaryReader<'a> {
    /// Creates a reader over `bytes`.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            end: bytes.len(),
        }
    }

    fn next_byte(&mut self, wanted: &'static str) -> Result<u8, WireError> {
        if self.pos >= self.end {
            return Err(WireError::end(wanted));
        }
        let byte = self
            .bytes
            .get(self.pos)
            .copied()
            .ok_or(WireError::end(wanted))?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_varint(&mut self, wanted: &'static str) -> Result<u64, WireError> {
        let mut value: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.next_byte(wanted)?;
            let bits = u64::from(byte & 0x7F);
            value |= bits.checked_shl(shift).unwrap_or(0);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 70 {
                return Err(WireError::malformed("stop-bit value exceeds 64 bits"));
            }
        }
    }

    fn read_len(&mut self, wanted: &'static str) -> Result<usize, WireError> {
        let raw = self.read_varint(wanted)?;
        let len = usize::try_from(raw).map_err(|_| WireError::out_of_range("length", raw))?;
        if len > self.end.saturating_sub(self.pos) {
            return Err(WireError::end(wanted));
        }
        Ok(len)
    }

    fn take(&mut self, len: usize, wanted: &'static str) -> Result<&'a [u8], WireError> {
        let stop = self.pos.checked_add(len).ok_or(WireError::end(wanted))?;
        if stop > self.end {
            return Err(WireError::end(wanted));
        }
        let bytes: &'a [u8] = self.bytes;
        let slice = bytes.get(self.pos..stop).ok_or(WireError::end(wanted))?;
        self.pos = stop;
        Ok(slice)
    }

    fn expect_code(&mut self, expected: &'static str, code: u8) -> Result<(), WireError> {
        let found = self.next_byte(expected)?;
        if found == code {
            Ok(())
        } else {
            Err(WireError::UnexpectedCode { expected, found })
        }
    }

    fn read_integer(&mut self, wanted: &'static str) -> Result<i64, WireError> {
        let found = self.next_byte(wanted)?;
        match found {
            INT8 | INT16 | INT32 | INT64 => Ok(unzigzag(self.read_varint(wanted)?)),
            _ => Err(WireError::UnexpectedCode {
                expected: wanted,
                found,
            }),
        }
    }

    fn read_str(&mut self, wanted: &'static str) -> Result<&'a str, WireError> {
        let len = self.read_len(wanted)?;
        let raw = self.take(len, wanted)?;
        Ok(std::str::from_utf8(raw)?)
    }
}

impl ValueIn for BinaryReader<'_> {
    fn bool(&mut self) -> Result<bool, WireError> {
        match self.next_byte("bool")? {
            TRUE => Ok(true),
            FALSE => Ok(false),
            found => Err(WireError::UnexpectedCode {
                expected: "bool",
                found,
            }),
        }
    }

    fn int8(&mut self) -> Result<i8, WireError> {
        let value = self.read_integer("int8")?;
        i8::try_from(value).map_err(|_| WireError::out_of_range("int8", value))
    }

    fn character(&mut self) -> Result<char, WireError> {
        self.expect_code("char", CHAR)?;
        let raw = self.read_varint("char")?;
        u32::try_from(raw)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| WireError::out_of_range("char", raw))
    }

    fn int16(&mut self) -> Result<i16, WireError> {
        let value = self.read_integer("int16")?;
        i16::try_from(value).map_err(|_| WireError::out_of_range("int16", value))
    }

    fn int32(&mut self) -> Result<i32, WireError> {
        let value = self.read_integer("int32")?;
        i32::try_from(value).map_err(|_| WireError::out_of_range("int32", value))
    }

    fn int64(&mut self) -> Result<i64, WireError> {
        self.read_integer("int64")
    }

    fn float32(&mut self) -> Result<f32, WireError> {
        self.expect_code("float32", FLOAT32)?;
        let raw = self.read_varint("float32")?;
        u32::try_from(raw)
            .map(f32::from_bits)
            .map_err(|_| WireError::out_of_range("float32", raw))
    }

    fn float64(&mut self) -> Result<f64, WireError> {
        self.expect_code("float64", FLOAT64)?;
        Ok(f64::from_bits(self.read_varint("float64")?))
    }

    fn text_into(&mut self, buffer: &mut String) -> Result<(), WireError> {
        self.expect_code("text", TEXT)?;
        let text = self.read_str("text")?;
        buffer.clear();
        buffer.push_str(text);
        Ok(())
    }

    fn skip_value(&mut self) -> Result<(), WireError> {
        match self.next_byte("value")? {
            EMPTY | TRUE | FALSE => Ok(()),
            CHAR | INT8 | INT16 | INT32 | INT64 | FLOAT32 | FLOAT64 => {
                self.read_varint("value").map(|_| ())
            }
            TEXT | SEQUENCE => {
                let len = self.read_len("value")?;
                self.take(len, "value").map(|_| ())
            }
            found => Err(WireError::UnexpectedCode {
                expected: "value",
                found,
            }),
        }
    }

    fn has_remaining(&self) -> bool {
        self.pos < self.end
    }

    fn sequence(&mut self, visitor: &mut SequenceVisitor<'_>) -> Result<(), WireError> {
        let found = self.next_byte("sequence")?;
        let len = match found {
            SEQUENCE => self.read_len("sequence")?,
            EMPTY => 0,
            _ => {
                return Err(WireError::UnexpectedCode {
                    expected: "sequence",
                    found,
                });
            }
        };
        let start = self.pos;
        let mut nested = BinaryReader {
            bytes: self.bytes,
            pos: start,
            end: start + len,
        };
        let visited = visitor(&mut nested);
        self.pos = start + len;
        visited
    }
}

impl WireIn for BinaryReader<'_> {
    fn read_event(&mut self, name: &mut String) -> Result<Option<Event>, WireError> {
        if self.pos >= self.end {
            return Ok(None);
        }
        match self.next_byte("message header")? {
            FIELD_NAME => {
                let text = self.read_str("message name")?;
                name.clear();
                name.push_str(text);
                Ok(Some(Event::Named))
            }
            FIELD_NUMBER => {
                let raw = self.read_varint("method id")?;
                let id = u32::try_from(raw).map_err(|_| WireError::out_of_range("method id", raw))?;
                Ok(Some(Event::Id(id)))
            }
            found => Err(WireError::UnexpectedCode {
                expected: "message header",
                found,
            }),
        }
    }

    fn value_in(&mut self) -> &mut dyn ValueIn {
        self
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn rewind(&mut self, position: usize) {
        self.pos = position.min(self.end);
    }
}
