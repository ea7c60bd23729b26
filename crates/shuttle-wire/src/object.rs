//! Typed objects carried as nested field sequences.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::WireError;
use crate::input::ValueIn;
use crate::output::ValueOut;

/// A value that can populate itself from, and write itself to, the wire.
///
/// # Example
///
/// ```
/// use std::any::Any;
///
/// use shuttle_wire::{ValueIn, ValueOut, WireError, WireObject};
///
/// #[derive(Debug, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl WireObject for Point {
///     fn read_fields(&mut self, input: &mut dyn ValueIn) -> Result<(), WireError> {
///         self.x = input.int32()?;
///         self.y = input.int32()?;
///         Ok(())
///     }
///
///     fn write_fields(&self, out: &mut dyn ValueOut) {
///         out.int32(self.x);
///         out.int32(self.y);
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///
///     fn as_any_mut(&mut self) -> &mut dyn Any {
///         self
///     }
/// }
/// ```
pub trait WireObject: Any + fmt::Debug {
    /// Overwrites this object's fields from `input`.
    ///
    /// # Errors
    ///
    /// Returns a [`WireError`] if a field is missing or has the wrong shape.
    fn read_fields(&mut self, input: &mut dyn ValueIn) -> Result<(), WireError>;

    /// Writes this object's fields to `out` in the order `read_fields`
    /// expects them.
    fn write_fields(&self, out: &mut dyn ValueOut);

    /// Upcasts to [`Any`] for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to [`Any`] for mutable downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implementation type used when decoding an object parameter.
///
/// Two object types are equal when they describe the same Rust type and
/// agree on recycling; the display name plays no part.
#[derive(Clone, Copy)]
pub struct ObjectType {
    type_id: TypeId,
    name: &'static str,
    factory: fn() -> Box<dyn WireObject>,
    recyclable: bool,
}

impl ObjectType {
    /// Describes `T`, constructing fresh instances with `T::default()`.
    ///
    /// Instances are recyclable: a previously decoded value is populated in
    /// place instead of allocating a new one.
    #[must_use]
    pub fn of<T: WireObject + Default>() -> Self {
        Self::new::<T>(new_boxed::<T>)
    }

    /// Describes `T`, constructing fresh instances with `factory`.
    #[must_use]
    pub fn new<T: WireObject>(factory: fn() -> Box<dyn WireObject>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
            factory,
            recyclable: true,
        }
    }

    /// Marks instances as single use, so every decode allocates.
    #[must_use]
    pub const fn single_use(mut self) -> Self {
        self.recyclable = false;
        self
    }

    /// Returns the type name without its module path.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` when decoded instances may be populated in place.
    #[must_use]
    pub const fn is_recyclable(&self) -> bool {
        self.recyclable
    }

    /// Creates a fresh instance.
    #[must_use]
    pub fn new_instance(&self) -> Box<dyn WireObject> {
        (self.factory)()
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("recyclable", &self.recyclable)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ObjectType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.recyclable == other.recyclable
    }
}

impl Eq for ObjectType {}

fn new_boxed<T: WireObject + Default>() -> Box<dyn WireObject> {
    Box::new(T::default())
}

/// Strips the module path from a type name, leaving generic arguments
/// untouched.
///
/// # Example
///
/// ```
/// use shuttle_wire::short_type_name;
///
/// assert_eq!(short_type_name("desk::orders::Order"), "Order");
/// assert_eq!(short_type_name("desk::Wrapper<left::Order>"), "Wrapper<left::Order>");
/// ```
#[must_use]
pub fn short_type_name(full: &'static str) -> &'static str {
    let head_end = full.find('<').unwrap_or(full.len());
    full.get(..head_end)
        .and_then(|head| head.rfind("::"))
        .and_then(|at| full.get(at.saturating_add(2)..))
        .unwrap_or(full)
}
