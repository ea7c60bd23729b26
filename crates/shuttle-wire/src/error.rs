//! Errors raised while reading wire values.
//!
//! Writers append to in-memory buffers and cannot fail, so only the read
//! side carries an error type. Conversion failures from the numeric
//! converters are folded in so decode paths have a single error to
//! propagate.

use std::str::Utf8Error;

use thiserror::Error;

use crate::convert::ConversionError;

/// Errors surfaced by a value source.
#[derive(Debug, Error)]
pub enum WireError {
    /// The input ended before the requested value.
    #[error("unexpected end of input while reading {wanted}")]
    UnexpectedEnd {
        /// Kind of value the reader was asked for.
        wanted: &'static str,
    },

    /// The binary type code did not match the requested value.
    #[error("expected {expected} but found type code 0x{found:02x}")]
    UnexpectedCode {
        /// Kind of value the reader was asked for.
        expected: &'static str,
        /// Code found in the input.
        found: u8,
    },

    /// A textual value did not have the requested shape.
    #[error("expected {expected} but found {found}")]
    TypeMismatch {
        /// Kind of value the reader was asked for.
        expected: &'static str,
        /// Short description of what was found instead.
        found: String,
    },

    /// A decoded number does not fit the requested width.
    #[error("value {value} is out of range for {kind}")]
    OutOfRange {
        /// Requested numeric kind.
        kind: &'static str,
        /// Offending value rendered as text.
        value: String,
    },

    /// Text was not valid UTF-8.
    #[error("invalid UTF-8 text: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    /// A textual document could not be parsed.
    #[error("malformed document: {message}")]
    Malformed {
        /// Description of the parse failure.
        message: String,
        /// Underlying JSON error, when one exists.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// A numeric converter rejected its text.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A typed object rejected the fields it was given.
    #[error("cannot read {type_name}: {message}")]
    Object {
        /// Name of the object type being populated.
        type_name: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl WireError {
    /// Creates an unexpected end error.
    #[must_use]
    pub const fn end(wanted: &'static str) -> Self {
        Self::UnexpectedEnd { wanted }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.into(),
        }
    }

    /// Creates an out of range error.
    #[must_use]
    pub fn out_of_range(kind: &'static str, value: impl ToString) -> Self {
        Self::OutOfRange {
            kind,
            value: value.to_string(),
        }
    }

    /// Creates a malformed document error from a JSON error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Malformed {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed document error with a custom message.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an object population error.
    #[must_use]
    pub fn object(type_name: &'static str, message: impl Into<String>) -> Self {
        Self::Object {
            type_name,
            message: message.into(),
        }
    }
}
