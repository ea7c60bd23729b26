//! Cross-cutting wrappers around every decoded call.
//!
//! An interceptor receives the decoded arguments, the receiver and a
//! continuation performing the real call. It decides whether and how often
//! to proceed, and its result stands in for the operation's result, which
//! matters when the operation chains.
//!
//! Call hooks are the lighter alternative: they observe each call before
//! and after it runs but cannot change it. Readers built with hooks are
//! cached per generator id rather than shared with intercepting readers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::contract::{CallArgs, ErasedInvoker, Returned};
use crate::error::DispatchError;
use crate::table::OperationMeta;
use crate::value::Value;

/// Performs the intercepted call.
pub struct Continuation<'a> {
    operation: &'a str,
    invoke: &'a ErasedInvoker,
}

impl<'a> Continuation<'a> {
    pub(crate) const fn new(operation: &'a str, invoke: &'a ErasedInvoker) -> Self {
        Self { operation, invoke }
    }

    /// Invokes the operation on `target` with `args`.
    ///
    /// # Errors
    ///
    /// Returns whatever the operation returns, including argument errors
    /// when `args` no longer match its parameters.
    pub fn proceed(&self, target: &mut dyn Any, args: &mut [Value]) -> Result<Returned, DispatchError> {
        (self.invoke)(target, &mut CallArgs::new(self.operation, args))
    }
}

impl fmt::Debug for Continuation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

/// Wraps every dispatched call.
///
/// # Example
///
/// ```
/// use std::any::Any;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use shuttle::{Continuation, DispatchError, MethodInterceptor, OperationMeta, Returned, Value};
///
/// #[derive(Default)]
/// struct Counting {
///     calls: AtomicUsize,
/// }
///
/// impl MethodInterceptor for Counting {
///     fn intercept(
///         &self,
///         operation: &OperationMeta,
///         target: &mut dyn Any,
///         args: &mut [Value],
///         proceed: &Continuation<'_>,
///     ) -> Result<Returned, DispatchError> {
///         self.calls.fetch_add(1, Ordering::Relaxed);
///         proceed.proceed(target, args)
///     }
/// }
/// ```
pub trait MethodInterceptor: Send + Sync {
    /// Handles one call of `operation` on `target`.
    ///
    /// # Errors
    ///
    /// An error makes the message unhandled.
    fn intercept(
        &self,
        operation: &OperationMeta,
        target: &mut dyn Any,
        args: &mut [Value],
        proceed: &Continuation<'_>,
    ) -> Result<Returned, DispatchError>;
}

/// Observes calls without wrapping them.
pub trait CallHooks: Send + Sync {
    /// Identifies the hooks in reader cache keys and reader names.
    fn generator_id(&self) -> &str;

    /// Runs after decoding and before the call.
    fn before_call(&self, operation: &OperationMeta, args: &[Value]);

    /// Runs after a successful call.
    fn after_call(&self, operation: &OperationMeta, returned: &Returned);
}

/// How calls are wrapped by a reader.
#[derive(Clone, Default)]
pub enum Interception {
    /// Calls go straight to the target.
    #[default]
    None,
    /// Every call passes through the interceptor.
    Intercept(Arc<dyn MethodInterceptor>),
    /// Every call is observed by the hooks.
    Hooks(Arc<dyn CallHooks>),
}

impl Interception {
    /// Wraps calls with `interceptor`.
    #[must_use]
    pub fn intercept(interceptor: impl MethodInterceptor + 'static) -> Self {
        Self::Intercept(Arc::new(interceptor))
    }

    /// Observes calls with `hooks`.
    #[must_use]
    pub fn hooks(hooks: impl CallHooks + 'static) -> Self {
        Self::Hooks(Arc::new(hooks))
    }

    /// Runs `invoke` for `operation` under this interception.
    pub(crate) fn call(
        &self,
        operation: &OperationMeta,
        invoke: &ErasedInvoker,
        target: &mut dyn Any,
        args: &mut [Value],
    ) -> Result<Returned, DispatchError> {
        match self {
            Self::None => invoke(target, &mut CallArgs::new(operation.name(), args)),
            Self::Intercept(interceptor) => interceptor.intercept(
                operation,
                target,
                args,
                &Continuation::new(operation.name(), invoke),
            ),
            Self::Hooks(hooks) => {
                hooks.before_call(operation, args);
                let returned = invoke(target, &mut CallArgs::new(operation.name(), args))?;
                hooks.after_call(operation, &returned);
                Ok(returned)
            }
        }
    }
}

impl fmt::Debug for Interception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Intercept(_) => f.write_str("Intercept(..)"),
            Self::Hooks(hooks) => f
                .debug_tuple("Hooks")
                .field(&hooks.generator_id())
                .finish(),
        }
    }
}
