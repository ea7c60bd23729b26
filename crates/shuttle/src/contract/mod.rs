//! Contract descriptors.
//!
//! A contract is a named set of operations invoked on a receiver of type
//! `R`, normally a trait object such as `dyn Account`. Contracts are
//! described once through [`ContractSpec`] and [`OperationSpec`] and then
//! erased into receiver-agnostic form so one reader can dispatch across
//! many contracts and target types.
//!
//! # Example
//!
//! ```
//! use shuttle::{ContractSpec, OperationSpec, Parameter};
//!
//! trait Counter {
//!     fn add(&mut self, amount: i64);
//! }
//!
//! fn counter_contract() -> ContractSpec<dyn Counter> {
//!     ContractSpec::new("Counter").operation(
//!         OperationSpec::<dyn Counter>::new("add", |counter, args| {
//!             counter.add(args.int64(0)?);
//!             Ok(())
//!         })
//!         .param(Parameter::int64("amount"))
//!         .method_id(1),
//!     )
//! }
//!
//! assert_eq!(counter_contract().name(), "Counter");
//! ```

mod args;
mod param;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

pub use args::{CallArgs, Returned};
pub use param::{IntConverterFactory, LongConverterFactory, NumericConversion, ParamKind, Parameter};

use crate::error::DispatchError;

/// Name of the filter predicate, which is never dispatched as an operation.
pub const FILTER_MARKER: &str = "ignore_method_based_on_first_arg";

/// Where an operation is declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    /// Declared by the contract itself or one of its parents.
    #[default]
    Declared,
    /// Inherited from the universal base every value has, such as equality
    /// or formatting. Never dispatched.
    Universal,
}

type Invoker<R> =
    Arc<dyn Fn(&mut R, &mut CallArgs<'_>) -> Result<Returned, DispatchError> + Send + Sync>;

/// Invoker over a type-erased receiver.
pub(crate) type ErasedInvoker =
    Arc<dyn Fn(&mut dyn Any, &mut CallArgs<'_>) -> Result<Returned, DispatchError> + Send + Sync>;

fn invoker<R, F>(invoke: F) -> Invoker<R>
where
    R: ?Sized,
    F: Fn(&mut R, &mut CallArgs<'_>) -> Result<Returned, DispatchError> + Send + Sync + 'static,
{
    Arc::new(invoke)
}

fn erased_invoker<F>(invoke: F) -> ErasedInvoker
where
    F: Fn(&mut dyn Any, &mut CallArgs<'_>) -> Result<Returned, DispatchError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(invoke)
}

/// Resolves a type-erased receiver into the contract's receiver type.
pub(crate) struct Receiver<R: ?Sized>(
    Arc<dyn Fn(&mut dyn Any) -> Option<&mut R> + Send + Sync>,
);

impl<R: ?Sized + 'static> Receiver<R> {
    pub(crate) fn new<F>(resolve: F) -> Self
    where
        F: Fn(&mut dyn Any) -> Option<&mut R> + Send + Sync + 'static,
    {
        Self(Arc::new(resolve))
    }

    /// Receiver of a chained contract: the slot holds a `Box<R>`.
    pub(crate) fn chained() -> Self {
        Self::new(|any| any.downcast_mut::<Box<R>>().map(|boxed| &mut **boxed))
    }

    fn resolve<'a>(&self, any: &'a mut dyn Any) -> Option<&'a mut R> {
        (self.0)(any)
    }
}

impl<R: ?Sized> Clone for Receiver<R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// Link from an operation to the contract its result implements.
#[derive(Clone)]
pub(crate) struct ChainLink {
    id: TypeId,
    contract: Arc<dyn Fn() -> ErasedContract + Send + Sync>,
}

impl ChainLink {
    fn new<C: ?Sized + 'static>(contract: fn() -> ContractSpec<C>) -> Self {
        Self {
            id: TypeId::of::<C>(),
            contract: Arc::new(move || contract().erase(&Receiver::<C>::chained())),
        }
    }

    pub(crate) const fn id(&self) -> TypeId {
        self.id
    }

    pub(crate) fn contract(&self) -> ErasedContract {
        (self.contract)()
    }
}

impl fmt::Debug for ChainLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainLink")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Describes one operation of a contract over receiver `R`.
pub struct OperationSpec<R: ?Sized> {
    name: &'static str,
    method_id: Option<u32>,
    params: Vec<Parameter>,
    chain: Option<ChainLink>,
    is_static: bool,
    origin: Origin,
    invoke: Invoker<R>,
}

impl<R: ?Sized + 'static> OperationSpec<R> {
    /// Creates an operation that calls `invoke` with the decoded arguments.
    ///
    /// `invoke` returns `()` for plain operations or a [`Returned`] when
    /// the operation chains into another contract.
    pub fn new<F, O>(name: &'static str, invoke: F) -> Self
    where
        F: Fn(&mut R, &mut CallArgs<'_>) -> Result<O, DispatchError> + Send + Sync + 'static,
        O: Into<Returned>,
    {
        Self {
            name,
            method_id: None,
            params: Vec::new(),
            chain: None,
            is_static: false,
            origin: Origin::Declared,
            invoke: invoker(move |receiver, args| invoke(receiver, args).map(Into::into)),
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, parameter: Parameter) -> Self {
        self.params.push(parameter);
        self
    }

    /// Assigns the compact numeric alias of the name.
    #[must_use]
    pub const fn method_id(mut self, id: u32) -> Self {
        self.method_id = Some(id);
        self
    }

    /// Declares that the result implements contract `C`, so following
    /// messages may address the result's operations.
    #[must_use]
    pub fn chains_to<C: ?Sized + 'static>(mut self, contract: fn() -> ContractSpec<C>) -> Self {
        self.chain = Some(ChainLink::new(contract));
        self
    }

    /// Marks the operation as not bound to an instance.
    #[must_use]
    pub const fn static_operation(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Marks the operation as inherited from the universal base.
    #[must_use]
    pub const fn universal(mut self) -> Self {
        self.origin = Origin::Universal;
        self
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn erase(self, receiver: &Receiver<R>) -> ErasedOperation {
        let resolve = receiver.clone();
        let invoke = self.invoke;
        ErasedOperation {
            name: self.name,
            method_id: self.method_id,
            params: self.params,
            chain: self.chain,
            is_static: self.is_static,
            origin: self.origin,
            invoke: erased_invoker(move |any, args| {
                let target = resolve
                    .resolve(any)
                    .ok_or_else(|| DispatchError::receiver_mismatch(args.operation()))?;
                invoke(target, args)
            }),
        }
    }
}

impl<R: ?Sized> fmt::Debug for OperationSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationSpec")
            .field("name", &self.name)
            .field("method_id", &self.method_id)
            .field("params", &self.params)
            .field("chain", &self.chain)
            .field("is_static", &self.is_static)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

type ParentEraser<R> = Box<dyn FnOnce(&Receiver<R>) -> ErasedContract>;

/// Describes a contract over receiver `R`.
pub struct ContractSpec<R: ?Sized> {
    id: TypeId,
    name: &'static str,
    chainable: bool,
    parents: Vec<ParentEraser<R>>,
    operations: Vec<OperationSpec<R>>,
}

impl<R: ?Sized + 'static> ContractSpec<R> {
    /// Creates an empty contract identified by the receiver type `R`.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<R>(),
            name,
            chainable: true,
            parents: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Adds an operation.
    #[must_use]
    pub fn operation(mut self, operation: OperationSpec<R>) -> Self {
        self.operations.push(operation);
        self
    }

    /// Folds in the operations of a parent contract.
    ///
    /// `upcast` converts this contract's receiver into the parent's, which
    /// for trait objects is the supertrait coercion `|child| child`.
    #[must_use]
    pub fn extends<P: ?Sized + 'static>(
        mut self,
        parent: ContractSpec<P>,
        upcast: fn(&mut R) -> &mut P,
    ) -> Self {
        self.parents.push(Box::new(move |receiver: &Receiver<R>| {
            let child = receiver.clone();
            let up = Receiver::new(move |any| child.resolve(any).map(upcast));
            parent.erase(&up)
        }));
        self
    }

    /// Marks the contract as never usable as a chained receiver.
    ///
    /// Operations returning this contract are still dispatched, but their
    /// results are discarded.
    #[must_use]
    pub const fn not_chainable(mut self) -> Self {
        self.chainable = false;
        self
    }

    /// Returns the contract name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the operations declared directly on this contract.
    #[must_use]
    pub fn operations(&self) -> &[OperationSpec<R>] {
        &self.operations
    }

    pub(crate) fn erase(self, receiver: &Receiver<R>) -> ErasedContract {
        ErasedContract {
            id: self.id,
            name: self.name,
            chainable: self.chainable,
            operations: self
                .operations
                .into_iter()
                .map(|operation| operation.erase(receiver))
                .collect(),
            parents: self
                .parents
                .into_iter()
                .map(|parent| parent(receiver))
                .collect(),
        }
    }
}

impl<R: ?Sized> fmt::Debug for ContractSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractSpec")
            .field("name", &self.name)
            .field("chainable", &self.chainable)
            .field("parents", &self.parents.len())
            .field("operations", &self.operations)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Erased form
// ---------------------------------------------------------------------------

/// A contract whose operations accept any receiver.
pub(crate) struct ErasedContract {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
    pub(crate) chainable: bool,
    pub(crate) operations: Vec<ErasedOperation>,
    pub(crate) parents: Vec<ErasedContract>,
}

/// An operation whose invoker accepts any receiver.
pub(crate) struct ErasedOperation {
    pub(crate) name: &'static str,
    pub(crate) method_id: Option<u32>,
    pub(crate) params: Vec<Parameter>,
    pub(crate) chain: Option<ChainLink>,
    pub(crate) is_static: bool,
    pub(crate) origin: Origin,
    pub(crate) invoke: ErasedInvoker,
}

#[cfg(test)]
mod tests;
