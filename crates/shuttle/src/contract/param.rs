//! Parameter descriptors.

use std::fmt;

use shuttle_wire::{Base95LongConverter, HexConverter, IntConverter, LongConverter, ObjectType};

/// Semantic kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Boolean.
    Bool,
    /// 8-bit integer.
    Int8,
    /// Character.
    Char,
    /// 16-bit integer.
    Int16,
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Text.
    Text,
    /// Typed object with the implementation type used to decode it.
    Object(ObjectType),
}

impl ParamKind {
    /// Returns the kind name used in logs and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Char => "char",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Object(_) => "object",
        }
    }
}

/// Factory for a 32-bit converter.
pub type IntConverterFactory = fn() -> Box<dyn IntConverter>;

/// Factory for a 64-bit converter.
pub type LongConverterFactory = fn() -> Box<dyn LongConverter>;

/// Named converter tag on an integer parameter.
///
/// The tag is only honoured on textual wire formats, and only when it
/// offers a converter for the parameter's width.
#[derive(Clone, Copy)]
pub struct NumericConversion {
    name: &'static str,
    int: Option<IntConverterFactory>,
    long: Option<LongConverterFactory>,
}

impl NumericConversion {
    /// Creates a tag that converts 32-bit parameters.
    #[must_use]
    pub const fn int(name: &'static str, factory: IntConverterFactory) -> Self {
        Self {
            name,
            int: Some(factory),
            long: None,
        }
    }

    /// Creates a tag that converts 64-bit parameters.
    #[must_use]
    pub const fn long(name: &'static str, factory: LongConverterFactory) -> Self {
        Self {
            name,
            int: None,
            long: Some(factory),
        }
    }

    /// Creates a tag that converts both integer widths.
    #[must_use]
    pub const fn both(
        name: &'static str,
        int: IntConverterFactory,
        long: LongConverterFactory,
    ) -> Self {
        Self {
            name,
            int: Some(int),
            long: Some(long),
        }
    }

    /// Tag for [`Base95LongConverter`].
    #[must_use]
    pub fn base95() -> Self {
        Self::long("base95", || Box::new(Base95LongConverter))
    }

    /// Tag for [`HexConverter`] at both widths.
    #[must_use]
    pub fn hex() -> Self {
        Self::both("hex", || Box::new(HexConverter), || Box::new(HexConverter))
    }

    /// Returns the tag name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) const fn int_factory(&self) -> Option<IntConverterFactory> {
        self.int
    }

    pub(crate) const fn long_factory(&self) -> Option<LongConverterFactory> {
        self.long
    }
}

impl fmt::Debug for NumericConversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericConversion")
            .field("name", &self.name)
            .field("int", &self.int.is_some())
            .field("long", &self.long.is_some())
            .finish()
    }
}

/// One parameter of an operation.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: &'static str,
    kind: ParamKind,
    conversion: Option<NumericConversion>,
}

impl Parameter {
    /// Creates a parameter of the given kind.
    #[must_use]
    pub const fn new(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            conversion: None,
        }
    }

    /// Creates a boolean parameter.
    #[must_use]
    pub const fn bool(name: &'static str) -> Self {
        Self::new(name, ParamKind::Bool)
    }

    /// Creates an 8-bit integer parameter.
    #[must_use]
    pub const fn int8(name: &'static str) -> Self {
        Self::new(name, ParamKind::Int8)
    }

    /// Creates a character parameter.
    #[must_use]
    pub const fn char(name: &'static str) -> Self {
        Self::new(name, ParamKind::Char)
    }

    /// Creates a 16-bit integer parameter.
    #[must_use]
    pub const fn int16(name: &'static str) -> Self {
        Self::new(name, ParamKind::Int16)
    }

    /// Creates a 32-bit integer parameter.
    #[must_use]
    pub const fn int32(name: &'static str) -> Self {
        Self::new(name, ParamKind::Int32)
    }

    /// Creates a 64-bit integer parameter.
    #[must_use]
    pub const fn int64(name: &'static str) -> Self {
        Self::new(name, ParamKind::Int64)
    }

    /// Creates a 32-bit float parameter.
    #[must_use]
    pub const fn float32(name: &'static str) -> Self {
        Self::new(name, ParamKind::Float32)
    }

    /// Creates a 64-bit float parameter.
    #[must_use]
    pub const fn float64(name: &'static str) -> Self {
        Self::new(name, ParamKind::Float64)
    }

    /// Creates a text parameter.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ParamKind::Text)
    }

    /// Creates an object parameter decoded as `object_type`.
    #[must_use]
    pub const fn object(name: &'static str, object_type: ObjectType) -> Self {
        Self::new(name, ParamKind::Object(object_type))
    }

    /// Tags this parameter with a numeric conversion.
    #[must_use]
    pub const fn converted(mut self, conversion: NumericConversion) -> Self {
        self.conversion = Some(conversion);
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parameter kind.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    /// Returns the numeric conversion tag, if any.
    #[must_use]
    pub const fn conversion(&self) -> Option<&NumericConversion> {
        self.conversion.as_ref()
    }
}
