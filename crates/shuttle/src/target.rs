//! Target instances and the contracts their types implement.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

use shuttle_wire::short_type_name;

use crate::contract::{ContractSpec, ErasedContract, Receiver};
use crate::filter::{FilterGate, MethodFilterOnFirstArg};

/// A type whose values can receive dispatched calls.
///
/// `describe` runs once per reader build and lists every contract the type
/// implements together with how to view a value as that contract.
///
/// # Example
///
/// ```
/// use shuttle::{ContractSpec, OperationSpec, Target, TargetSpec};
///
/// trait Ping {
///     fn ping(&mut self);
/// }
///
/// fn ping_contract() -> ContractSpec<dyn Ping> {
///     ContractSpec::new("Ping").operation(OperationSpec::<dyn Ping>::new("ping", |p, _| {
///         p.ping();
///         Ok(())
///     }))
/// }
///
/// #[derive(Default)]
/// struct Pinger {
///     pings: u32,
/// }
///
/// impl Ping for Pinger {
///     fn ping(&mut self) {
///         self.pings += 1;
///     }
/// }
///
/// impl Target for Pinger {
///     fn describe(spec: &mut TargetSpec<Self>) {
///         spec.implements(ping_contract(), |pinger| pinger);
///     }
/// }
/// ```
pub trait Target: Any {
    /// Lists the contracts implemented by this type.
    fn describe(spec: &mut TargetSpec<Self>)
    where
        Self: Sized;
}

/// Collects the contracts of target type `T`.
pub struct TargetSpec<T> {
    contracts: Vec<ErasedContract>,
    filter: Option<FilterGate>,
    _target: PhantomData<fn(&mut T)>,
}

impl<T: Target> TargetSpec<T> {
    fn new() -> Self {
        Self {
            contracts: Vec::new(),
            filter: None,
            _target: PhantomData,
        }
    }

    /// Declares that `T` implements `contract`, viewed through `projection`.
    pub fn implements<R, F>(&mut self, contract: ContractSpec<R>, projection: F) -> &mut Self
    where
        R: ?Sized + 'static,
        F: Fn(&mut T) -> &mut R + Send + Sync + 'static,
    {
        let receiver =
            Receiver::new(move |any| any.downcast_mut::<T>().map(|target| projection(target)));
        self.contracts.push(contract.erase(&receiver));
        self
    }

    /// Routes multi-argument calls on this target's contracts through its
    /// [`MethodFilterOnFirstArg`] predicate.
    pub fn filter_on_first_arg(&mut self) -> &mut Self
    where
        T: MethodFilterOnFirstArg,
    {
        self.filter = Some(FilterGate::new::<T>());
        self
    }
}

/// Contracts and filter of one target type, erased.
pub(crate) struct TargetDescription {
    pub(crate) contracts: Vec<ErasedContract>,
    pub(crate) filter: Option<FilterGate>,
}

fn describe_target<T: Target>() -> TargetDescription {
    let mut spec = TargetSpec::<T>::new();
    T::describe(&mut spec);
    TargetDescription {
        contracts: spec.contracts,
        filter: spec.filter,
    }
}

/// A target value with its type identity erased.
pub struct TargetInstance {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any>,
    describe: fn() -> TargetDescription,
}

impl TargetInstance {
    /// Wraps `value`.
    #[must_use]
    pub fn new<T: Target>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: short_type_name(std::any::type_name::<T>()),
            value: Box::new(value),
            describe: describe_target::<T>,
        }
    }

    /// Returns the identity of the wrapped type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the unqualified name of the wrapped type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Target>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Mutably borrows the value as `T`.
    #[must_use]
    pub fn downcast_mut<T: Target>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    /// Unwraps the value as `T`, handing the instance back on mismatch.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged if the value is not a `T`.
    pub fn into_inner<T: Target>(self) -> Result<T, Self> {
        let Self {
            type_id,
            type_name,
            value,
            describe,
        } = self;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|original| Self {
                type_id,
                type_name,
                value: original,
                describe,
            })
    }

    pub(crate) fn receiver(&mut self) -> &mut dyn Any {
        self.value.as_mut()
    }

    pub(crate) fn description(&self) -> TargetDescription {
        (self.describe)()
    }
}

impl<T: Target> From<T> for TargetInstance {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for TargetInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetInstance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
