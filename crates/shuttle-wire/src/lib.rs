//! Wire value boundary for the shuttle dispatcher.
//!
//! This crate defines the value source ([`WireIn`], [`ValueIn`]) and value
//! sink ([`WireOut`], [`ValueOut`]) traits that the dispatcher decodes
//! messages through, together with two codecs implementing them:
//!
//! - [`BinaryWire`] / [`BinaryReader`]: compact tagged stop-bit encoding.
//! - [`JsonWire`] / [`JsonReader`]: one JSON object per line.
//!
//! Textual formats may carry integers through a [`LongConverter`] or
//! [`IntConverter`] such as [`Base95LongConverter`].

mod binary;
mod convert;
mod error;
mod input;
mod json;
mod object;
mod output;
mod wire_type;

pub use binary::{BinaryReader, BinaryWire, FIELD_NAME, FIELD_NUMBER};
pub use convert::{
    Base95LongConverter, ConversionError, HexConverter, IntConverter, LongConverter,
};
pub use error::WireError;
pub use input::{Event, SequenceVisitor, ValueIn, WireIn};
pub use json::{JsonReader, JsonWire};
pub use object::{ObjectType, WireObject, short_type_name};
pub use output::{ValueOut, ValueWriter, WireOut};
pub use wire_type::WireType;
