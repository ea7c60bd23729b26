//! Textual numeric converters.
//!
//! Textual formats may carry integers in a compact custom alphabet instead
//! of decimal digits. A converter parses such text into a fixed-width
//! integer and renders the integer back. Binary formats never use them.

mod base95;
mod hex;

use std::fmt;

use thiserror::Error;

pub use base95::Base95LongConverter;
pub use hex::HexConverter;

/// Errors raised when converter text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// A character lies outside the converter's alphabet.
    #[error("{converter} cannot parse character {character:?}")]
    InvalidCharacter {
        /// Name of the converter.
        converter: &'static str,
        /// Offending character.
        character: char,
    },

    /// The text has more digits than the converter's width allows.
    #[error("{converter} accepts at most {max} characters, got {length}")]
    TooLong {
        /// Name of the converter.
        converter: &'static str,
        /// Length of the rejected text.
        length: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

/// Converts between text and 32-bit integers.
pub trait IntConverter: fmt::Debug + Send + Sync {
    /// Parses `text` into an integer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `text` is not in the converter's
    /// alphabet or is too long.
    fn parse(&self, text: &str) -> Result<i32, ConversionError>;

    /// Appends the textual form of `value` to `out`.
    fn append(&self, out: &mut String, value: i32);

    /// Returns the textual form of `value`.
    fn render(&self, value: i32) -> String {
        let mut out = String::new();
        self.append(&mut out, value);
        out
    }
}

/// Converts between text and 64-bit integers.
pub trait LongConverter: fmt::Debug + Send + Sync {
    /// Parses `text` into an integer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `text` is not in the converter's
    /// alphabet or is too long.
    fn parse(&self, text: &str) -> Result<i64, ConversionError>;

    /// Appends the textual form of `value` to `out`.
    fn append(&self, out: &mut String, value: i64);

    /// Returns the textual form of `value`.
    fn render(&self, value: i64) -> String {
        let mut out = String::new();
        self.append(&mut out, value);
        out
    }
}
