//! Arguments handed to an invoker and the value it returns.

use std::any::Any;
use std::fmt;

use shuttle_wire::WireObject;

use crate::error::DispatchError;
use crate::value::Value;

/// Result of invoking an operation.
#[derive(Default)]
pub enum Returned {
    /// Nothing to chain on.
    #[default]
    Unit,
    /// A receiver for the contract the operation chains to.
    Chained(Box<dyn Any>),
}

impl Returned {
    /// Wraps the result of an operation that chains to contract `C`.
    ///
    /// # Example
    ///
    /// ```
    /// use shuttle::Returned;
    ///
    /// trait Leg {}
    /// struct Left;
    /// impl Leg for Left {}
    ///
    /// let next: Box<dyn Leg> = Box::new(Left);
    /// assert!(Returned::chained(next).is_chained());
    /// ```
    #[must_use]
    pub fn chained<C: ?Sized + 'static>(receiver: Box<C>) -> Self {
        Self::Chained(Box::new(receiver))
    }

    /// Returns `true` if this carries a chained receiver.
    #[must_use]
    pub const fn is_chained(&self) -> bool {
        matches!(self, Self::Chained(_))
    }

    /// Returns the chained receiver as `C`, if it is one.
    #[must_use]
    pub fn chained_ref<C: ?Sized + 'static>(&self) -> Option<&C> {
        match self {
            Self::Chained(any) => any.downcast_ref::<Box<C>>().map(|boxed| &**boxed),
            Self::Unit => None,
        }
    }
}

impl From<()> for Returned {
    fn from((): ()) -> Self {
        Self::Unit
    }
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("Unit"),
            Self::Chained(_) => f.write_str("Chained(..)"),
        }
    }
}

/// Decoded arguments of one call, in parameter order.
///
/// Accessors check the slot kind and report a [`DispatchError`] naming the
/// operation when the invoker asks for the wrong kind or position.
pub struct CallArgs<'a> {
    operation: &'a str,
    values: &'a mut [Value],
}

macro_rules! copy_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns a [`DispatchError`] if there is no argument at `index` or
        /// it has another kind.
        pub fn $name(&self, index: usize) -> Result<$ty, DispatchError> {
            match self.value(index)? {
                Value::$variant(value) => Ok(*value),
                _ => Err(DispatchError::argument_type(
                    self.operation,
                    index,
                    stringify!($name),
                )),
            }
        }
    };
}

impl<'a> CallArgs<'a> {
    /// Wraps the decoded slots of `operation`.
    #[must_use]
    pub const fn new(operation: &'a str, values: &'a mut [Value]) -> Self {
        Self { operation, values }
    }

    /// Returns the name of the operation being invoked.
    #[must_use]
    pub const fn operation(&self) -> &str {
        self.operation
    }

    /// Returns the number of arguments.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` for a zero-argument call.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns every decoded argument.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &*self.values
    }

    /// Returns the argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MissingArgument`] past the last argument.
    pub fn value(&self, index: usize) -> Result<&Value, DispatchError> {
        self.values
            .get(index)
            .ok_or_else(|| DispatchError::missing_argument(self.operation, index))
    }

    copy_accessor!(
        /// Returns a boolean argument.
        bool, Bool, bool
    );
    copy_accessor!(
        /// Returns an 8-bit integer argument.
        int8, Int8, i8
    );
    copy_accessor!(
        /// Returns a character argument.
        char, Char, char
    );
    copy_accessor!(
        /// Returns a 16-bit integer argument.
        int16, Int16, i16
    );
    copy_accessor!(
        /// Returns a 32-bit integer argument.
        int32, Int32, i32
    );
    copy_accessor!(
        /// Returns a 64-bit integer argument.
        int64, Int64, i64
    );
    copy_accessor!(
        /// Returns a 32-bit float argument.
        float32, Float32, f32
    );
    copy_accessor!(
        /// Returns a 64-bit float argument.
        float64, Float64, f64
    );

    /// Returns a text argument.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if there is no argument at `index` or it
    /// is not text.
    pub fn text(&self, index: usize) -> Result<&str, DispatchError> {
        self.value(index)?
            .as_text()
            .ok_or_else(|| DispatchError::argument_type(self.operation, index, "text"))
    }

    /// Borrows an object argument as `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if there is no argument at `index` or it
    /// is not a `T`.
    pub fn object<T: WireObject>(&self, index: usize) -> Result<&T, DispatchError> {
        self.value(index)?
            .as_object::<T>()
            .ok_or_else(|| DispatchError::argument_type(self.operation, index, "object"))
    }

    /// Takes ownership of an object argument as `T`.
    ///
    /// The slot no longer holds an instance afterwards, so the next message
    /// decodes into a fresh one.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] if there is no argument at `index` or it
    /// is not a `T`.
    pub fn take_object<T: WireObject>(&mut self, index: usize) -> Result<Box<T>, DispatchError> {
        let operation = self.operation;
        let slot = self
            .values
            .get_mut(index)
            .ok_or_else(|| DispatchError::missing_argument(operation, index))?;
        let Value::Object(held) = slot else {
            return Err(DispatchError::argument_type(operation, index, "object"));
        };
        if !held.as_ref().is_some_and(|object| object.as_any().is::<T>()) {
            return Err(DispatchError::argument_type(operation, index, "object"));
        }
        let object = held
            .take()
            .ok_or_else(|| DispatchError::argument_type(operation, index, "object"))?;
        let any: Box<dyn Any> = object;
        any.downcast::<T>()
            .map_err(|_| DispatchError::argument_type(operation, index, "object"))
    }
}

impl fmt::Debug for CallArgs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallArgs")
            .field("operation", &self.operation)
            .field("values", &self.values)
            .finish()
    }
}
