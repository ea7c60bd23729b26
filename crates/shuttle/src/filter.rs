//! Decode-time suppression of calls based on their first argument.
//!
//! A target opting into the gate is asked, after the first argument of a
//! multi-argument call is decoded, whether the call should be ignored. An
//! ignored call has its remaining arguments skipped on the wire without
//! being decoded, and the target is not invoked.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Predicate a target implements to suppress calls by first argument.
///
/// # Example
///
/// ```
/// use shuttle::{MethodFilterOnFirstArg, Value};
///
/// struct OnlyMine {
///     account: i64,
/// }
///
/// impl MethodFilterOnFirstArg for OnlyMine {
///     fn ignore_method_based_on_first_arg(&mut self, _operation: &str, first_arg: &Value) -> bool {
///         first_arg.as_int64() != Some(self.account)
///     }
/// }
/// ```
pub trait MethodFilterOnFirstArg {
    /// Returns `true` to skip the call named `operation` whose first
    /// argument decoded to `first_arg`.
    fn ignore_method_based_on_first_arg(&mut self, operation: &str, first_arg: &Value) -> bool;
}

/// Type-erased filter bound to one target type.
#[derive(Clone)]
pub(crate) struct FilterGate(Arc<dyn Fn(&mut dyn Any, &str, &Value) -> bool + Send + Sync>);

impl FilterGate {
    pub(crate) fn new<T: MethodFilterOnFirstArg + 'static>() -> Self {
        Self(Arc::new(|target: &mut dyn Any, operation: &str, first_arg: &Value| {
            target
                .downcast_mut::<T>()
                .is_some_and(|typed| typed.ignore_method_based_on_first_arg(operation, first_arg))
        }))
    }

    /// Asks the target whether to ignore the call.
    pub(crate) fn ignores(&self, target: &mut dyn Any, operation: &str, first_arg: &Value) -> bool {
        (self.0)(target, operation, first_arg)
    }
}

impl fmt::Debug for FilterGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilterGate")
    }
}
