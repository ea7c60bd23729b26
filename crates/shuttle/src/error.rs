//! Errors raised while building readers and dispatching messages.
//!
//! Build errors split into fatal ones, which mean the contract set itself
//! is invalid, and recoverable ones, after which a caller keeps going on a
//! fallback reader. Dispatch errors never escape `read_one`; they are logged
//! and turned into an unhandled message.

use shuttle_wire::WireError;
use thiserror::Error;

/// Errors arising while building a reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No target instances were supplied.
    #[error("a reader needs at least one target instance")]
    NoTargets,

    /// Two operations with different signatures share a name.
    #[error(
        "operation '{name}' declared by {attempted} clashes with the one declared by {existing}; \
         overloaded operations are not supported"
    )]
    DuplicateOperation {
        /// Clashing operation name.
        name: String,
        /// Contract that registered the name first.
        existing: String,
        /// Contract whose registration was rejected.
        attempted: String,
    },

    /// Two operations share a numeric method id.
    #[error("method id {id} is assigned to both '{existing}' and '{attempted}'")]
    DuplicateMethodId {
        /// Clashing method id.
        id: u32,
        /// Operation that holds the id.
        existing: String,
        /// Operation whose id was rejected.
        attempted: String,
    },

    /// Synthesis is turned off by configuration.
    #[error("reader synthesis is disabled by configuration")]
    SynthesisDisabled,

    /// The reader could not be assembled for an internal reason.
    #[error("reader synthesis failed: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl BuildError {
    /// Creates a duplicate operation error.
    #[must_use]
    pub fn duplicate_operation(
        name: impl Into<String>,
        existing: impl Into<String>,
        attempted: impl Into<String>,
    ) -> Self {
        Self::DuplicateOperation {
            name: name.into(),
            existing: existing.into(),
            attempted: attempted.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` when the contract set itself is invalid.
    ///
    /// A fatal error must reach the caller. Any other build error only
    /// means the synthesized reader is unavailable, and messages can still
    /// be read through a fallback reader.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NoTargets | Self::DuplicateOperation { .. })
    }
}

/// Errors arising while dispatching one message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The value source failed.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A decoded argument does not have the kind the invoker asked for.
    #[error("argument {index} of '{operation}' is not {expected}")]
    ArgumentType {
        /// Operation being invoked.
        operation: String,
        /// Zero-based argument position.
        index: usize,
        /// Kind the invoker asked for.
        expected: &'static str,
    },

    /// The invoker asked for an argument beyond the parameter list.
    #[error("'{operation}' has no argument {index}")]
    MissingArgument {
        /// Operation being invoked.
        operation: String,
        /// Zero-based argument position.
        index: usize,
    },

    /// A chained operation arrived before any call produced its receiver.
    #[error("'{operation}' needs a chained receiver but none is held")]
    MissingReceiver {
        /// Operation being invoked.
        operation: String,
    },

    /// The receiver has a different type than the contract expects.
    #[error("receiver of '{operation}' has an unexpected type")]
    ReceiverMismatch {
        /// Operation being invoked.
        operation: String,
    },

    /// The target rejected the call.
    #[error("'{operation}' failed: {message}")]
    Target {
        /// Operation being invoked.
        operation: String,
        /// Description of the failure.
        message: String,
    },
}

impl DispatchError {
    /// Creates an argument type error.
    #[must_use]
    pub fn argument_type(operation: &str, index: usize, expected: &'static str) -> Self {
        Self::ArgumentType {
            operation: operation.to_owned(),
            index,
            expected,
        }
    }

    /// Creates a missing argument error.
    #[must_use]
    pub fn missing_argument(operation: &str, index: usize) -> Self {
        Self::MissingArgument {
            operation: operation.to_owned(),
            index,
        }
    }

    /// Creates a missing receiver error.
    #[must_use]
    pub fn missing_receiver(operation: &str) -> Self {
        Self::MissingReceiver {
            operation: operation.to_owned(),
        }
    }

    /// Creates a receiver mismatch error.
    #[must_use]
    pub fn receiver_mismatch(operation: &str) -> Self {
        Self::ReceiverMismatch {
            operation: operation.to_owned(),
        }
    }

    /// Creates a target failure.
    #[must_use]
    pub fn target(operation: &str, message: impl Into<String>) -> Self {
        Self::Target {
            operation: operation.to_owned(),
            message: message.into(),
        }
    }
}
