//! Decoded argument values.

use shuttle_wire::WireObject;

/// One decoded argument.
///
/// Every parameter site owns a `Value` slot that is overwritten by each
/// message for that operation. A slot is [`Value::Unset`] until the first
/// message arrives.
#[derive(Debug, Default)]
pub enum Value {
    /// Nothing decoded yet.
    #[default]
    Unset,
    /// Boolean.
    Bool(bool),
    /// 8-bit integer.
    Int8(i8),
    /// Character.
    Char(char),
    /// 16-bit integer.
    Int16(i16),
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
    /// 32-bit float.
    Float32(f32),
    /// 64-bit float.
    Float64(f64),
    /// Text.
    Text(String),
    /// Typed object, `None` once taken by an invoker.
    Object(Option<Box<dyn WireObject>>),
}

impl Value {
    /// Returns the kind name used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Bool(_) => "bool",
            Self::Int8(_) => "int8",
            Self::Char(_) => "char",
            Self::Int16(_) => "int16",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::Text(_) => "text",
            Self::Object(_) => "object",
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the 8-bit integer, if this is one.
    #[must_use]
    pub const fn as_int8(&self) -> Option<i8> {
        match self {
            Self::Int8(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the character, if this is one.
    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the 16-bit integer, if this is one.
    #[must_use]
    pub const fn as_int16(&self) -> Option<i16> {
        match self {
            Self::Int16(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the 32-bit integer, if this is one.
    #[must_use]
    pub const fn as_int32(&self) -> Option<i32> {
        match self {
            Self::Int32(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the 64-bit integer, if this is one.
    #[must_use]
    pub const fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the 32-bit float, if this is one.
    #[must_use]
    pub const fn as_float32(&self) -> Option<f32> {
        match self {
            Self::Float32(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the 64-bit float, if this is one.
    #[must_use]
    pub const fn as_float64(&self) -> Option<f64> {
        match self {
            Self::Float64(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the object downcast to `T`, if this holds one.
    #[must_use]
    pub fn as_object<T: WireObject>(&self) -> Option<&T> {
        match self {
            Self::Object(Some(object)) => object.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the object mutably downcast to `T`, if this holds one.
    #[must_use]
    pub fn as_object_mut<T: WireObject>(&mut self) -> Option<&mut T> {
        match self {
            Self::Object(Some(object)) => object.as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }
}
