//! Wire format variants.

use std::fmt;

/// Encoding used by a value source.
///
/// The dispatcher only cares whether a format is textual: numeric
/// conversion tags on parameters are honoured for textual formats and
/// ignored for binary ones.
///
/// # Example
///
/// ```
/// use shuttle_wire::WireType;
///
/// assert!(WireType::Json.is_textual());
/// assert!(!WireType::Binary.is_textual());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireType {
    /// Tagged stop-bit binary encoding.
    Binary,
    /// One JSON document per message.
    Json,
}

impl WireType {
    /// Returns `true` when values are carried as text.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Returns the canonical name of the format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
