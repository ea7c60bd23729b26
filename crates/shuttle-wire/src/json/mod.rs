//! Line-oriented JSON codec.
//!
//! Each message is one JSON object with a single key on its own line. The
//! key is the message name, or the decimal method id when it consists only
//! of ASCII digits. The value is the payload: `null` for an empty payload,
//! an array for a nested sequence and a scalar otherwise.
//!
//! Integers are accepted either as JSON numbers or as strings holding a
//! decimal number, which is how textual converters carry their values.

use std::collections::VecDeque;

use serde_json::{Map, Number, Value};

use crate::error::WireError;
use crate::input::{Event, SequenceVisitor, ValueIn, WireIn};
use crate::output::{ValueOut, ValueWriter, WireOut};

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// In-memory JSON message writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonWire {
    messages: Vec<(String, Value)>,
}

impl JsonWire {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Renders every message as one JSON line.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (key, payload) in &self.messages {
            let mut object = Map::new();
            object.insert(key.clone(), payload.clone());
            text.push_str(&Value::Object(object).to_string());
            text.push('\n');
        }
        text
    }

    /// Returns a reader over everything written so far.
    #[must_use]
    pub fn reader(&self) -> JsonReader {
        JsonReader::from_messages(self.messages.clone())
    }

    /// Removes all written messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn push(&mut self, key: String, write: &mut ValueWriter<'_>) {
        let mut values = JsonValues::default();
        write(&mut values);
        let payload = values.values.into_iter().next().unwrap_or(Value::Null);
        self.messages.push((key, payload));
    }
}

impl WireOut for JsonWire {
    fn write_named(&mut self, name: &str, write: &mut ValueWriter<'_>) {
        self.push(name.to_owned(), write);
    }

    fn write_numbered(&mut self, id: u32, write: &mut ValueWriter<'_>) {
        self.push(id.to_string(), write);
    }
}

/// Collects the values written at one nesting level.
#[derive(Debug, Default)]
struct JsonValues {
    values: Vec<Value>,
}

impl ValueOut for JsonValues {
    fn empty(&mut self) {
        self.values.push(Value::Null);
    }

    fn bool(&mut self, value: bool) {
        self.values.push(Value::Bool(value));
    }

    fn int8(&mut self, value: i8) {
        self.values.push(Value::from(value));
    }

    fn character(&mut self, value: char) {
        self.values.push(Value::String(value.to_string()));
    }

    fn int16(&mut self, value: i16) {
        self.values.push(Value::from(value));
    }

    fn int32(&mut self, value: i32) {
        self.values.push(Value::from(value));
    }

    fn int64(&mut self, value: i64) {
        self.values.push(Value::from(value));
    }

    fn float32(&mut self, value: f32) {
        self.float64(f64::from(value));
    }

    fn float64(&mut self, value: f64) {
        self.values
            .push(Number::from_f64(value).map_or(Value::Null, Value::Number));
    }

    fn text(&mut self, value: &str) {
        self.values.push(Value::String(value.to_owned()));
    }

    fn sequence(&mut self, write: &mut ValueWriter<'_>) {
        let mut nested = Self::default();
        write(&mut nested);
        self.values.push(Value::Array(nested.values));
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Reader over JSON messages.
///
/// # Example
///
/// ```
/// use shuttle_wire::{Event, JsonReader, ValueIn, WireIn};
///
/// let mut reader = JsonReader::parse("{\"7\":[1,\"two\"]}\n").expect("valid json");
/// let mut name = String::new();
/// assert_eq!(reader.read_event(&mut name).ok(), Some(Some(Event::Id(7))));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonReader {
    messages: Vec<(String, Value)>,
    next: usize,
    cursor: JsonCursor,
}

impl JsonReader {
    /// Parses newline separated JSON messages. Blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Malformed`] if a line is not a JSON object with
    /// exactly one key.
    pub fn parse(text: &str) -> Result<Self, WireError> {
        let mut messages = Vec::new();
        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let value: Value = serde_json::from_str(line).map_err(WireError::from_json_error)?;
            let Value::Object(object) = value else {
                return Err(WireError::malformed(format!(
                    "message must be a JSON object: {line}"
                )));
            };
            if object.len() != 1 {
                return Err(WireError::malformed(format!(
                    "message must have exactly one key, found {}",
                    object.len()
                )));
            }
            messages.extend(object);
        }
        Ok(Self::from_messages(messages))
    }

    fn from_messages(messages: Vec<(String, Value)>) -> Self {
        Self {
            messages,
            next: 0,
            cursor: JsonCursor::default(),
        }
    }

    /// Returns the number of messages in the input.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the input holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl WireIn for JsonReader {
    fn read_event(&mut self, name: &mut String) -> Result<Option<Event>, WireError> {
        let Some((key, payload)) = self.messages.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        self.cursor = JsonCursor::from(vec![payload.clone()]);
        if !key.is_empty() && key.bytes().all(|byte| byte.is_ascii_digit()) {
            let id = key
                .parse::<u32>()
                .map_err(|_| WireError::out_of_range("method id", key))?;
            return Ok(Some(Event::Id(id)));
        }
        name.clear();
        name.push_str(key);
        Ok(Some(Event::Named))
    }

    fn value_in(&mut self) -> &mut dyn ValueIn {
        &mut self.cursor
    }

    fn position(&self) -> usize {
        self.next
    }

    fn rewind(&mut self, position: usize) {
        self.next = position.min(self.messages.len());
        self.cursor = JsonCursor::default();
    }

    fn finish_payload(&mut self, _payload_start: usize) -> Result<(), WireError> {
        self.cursor = JsonCursor::default();
        Ok(())
    }
}

/// Value source over the values pending at one nesting level.
#[derive(Debug, Clone, Default)]
struct JsonCursor {
    values: VecDeque<Value>,
}

impl From<Vec<Value>> for JsonCursor {
    fn from(values: Vec<Value>) -> Self {
        Self {
            values: values.into(),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl JsonCursor {
    fn pop(&mut self, wanted: &'static str) -> Result<Value, WireError> {
        self.values.pop_front().ok_or(WireError::end(wanted))
    }

    fn integer(&mut self, wanted: &'static str) -> Result<i64, WireError> {
        match self.pop(wanted)? {
            Value::Number(number) => number
                .as_i64()
                .ok_or_else(|| WireError::out_of_range(wanted, number)),
            Value::String(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|_| WireError::mismatch(wanted, format!("string {text:?}"))),
            other => Err(WireError::mismatch(wanted, describe(&other))),
        }
    }
}

impl ValueIn for JsonCursor {
    fn bool(&mut self) -> Result<bool, WireError> {
        match self.pop("bool")? {
            Value::Bool(value) => Ok(value),
            Value::String(text) if text == "true" => Ok(true),
            Value::String(text) if text == "false" => Ok(false),
            other => Err(WireError::mismatch("bool", describe(&other))),
        }
    }

    fn int8(&mut self) -> Result<i8, WireError> {
        let value = self.integer("int8")?;
        i8::try_from(value).map_err(|_| WireError::out_of_range("int8", value))
    }

    fn character(&mut self) -> Result<char, WireError> {
        match self.pop("char")? {
            Value::String(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(character), None) => Ok(character),
                    _ => Err(WireError::mismatch("char", format!("string {text:?}"))),
                }
            }
            other => Err(WireError::mismatch("char", describe(&other))),
        }
    }

    fn int16(&mut self) -> Result<i16, WireError> {
        let value = self.integer("int16")?;
        i16::try_from(value).map_err(|_| WireError::out_of_range("int16", value))
    }

    fn int32(&mut self) -> Result<i32, WireError> {
        let value = self.integer("int32")?;
        i32::try_from(value).map_err(|_| WireError::out_of_range("int32", value))
    }

    fn int64(&mut self) -> Result<i64, WireError> {
        self.integer("int64")
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "JSON numbers are doubles; narrowing to f32 is the requested decode"
    )]
    fn float32(&mut self) -> Result<f32, WireError> {
        self.float64().map(|value| value as f32)
    }

    fn float64(&mut self) -> Result<f64, WireError> {
        match self.pop("float64")? {
            Value::Number(number) => number
                .as_f64()
                .ok_or_else(|| WireError::out_of_range("float64", number)),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| WireError::mismatch("float64", format!("string {text:?}"))),
            other => Err(WireError::mismatch("float64", describe(&other))),
        }
    }

    fn text_into(&mut self, buffer: &mut String) -> Result<(), WireError> {
        buffer.clear();
        match self.pop("text")? {
            Value::String(text) => buffer.push_str(&text),
            Value::Number(number) => buffer.push_str(&number.to_string()),
            Value::Bool(value) => buffer.push_str(if value { "true" } else { "false" }),
            Value::Null => {}
            other => return Err(WireError::mismatch("text", describe(&other))),
        }
        Ok(())
    }

    fn skip_value(&mut self) -> Result<(), WireError> {
        self.pop("value").map(|_| ())
    }

    fn has_remaining(&self) -> bool {
        !self.values.is_empty()
    }

    fn sequence(&mut self, visitor: &mut SequenceVisitor<'_>) -> Result<(), WireError> {
        let mut nested = match self.pop("sequence")? {
            Value::Array(values) => Self::from(values),
            Value::Null => Self::default(),
            other => return Err(WireError::mismatch("sequence", describe(&other))),
        };
        visitor(&mut nested)
    }
}
