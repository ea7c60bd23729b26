//! Shuttle: synthesized message dispatchers over declared contracts.
//!
//! A reader is built once from a set of target instances, a wire type and
//! an optional interceptor. Building walks every contract the targets
//! implement, fixes a decode strategy per parameter, expands chained
//! contracts and produces a dispatch table keyed by operation name and
//! numeric id. The compiled plan is cached per key, so later readers over
//! the same target types reuse it.
//!
//! Reading then costs one table lookup and one direct leaf decode per
//! argument before the call reaches the target.
//!
//! # Core types
//!
//! - [`ContractSpec`], [`OperationSpec`] and [`Parameter`]: the contract
//!   descriptor model
//! - [`Target`] and [`TargetInstance`]: values receiving calls
//! - [`ReaderBuilder`] and [`build`]: reader construction
//! - [`ReaderArtifact`]: the synthesized reader
//! - [`MethodReader`]: a synthesized reader with a fallback
//! - [`Interception`]: interceptors and call hooks
//! - [`ReaderCache`]: the compiled plan cache
//!
//! # Example
//!
//! ```
//! use shuttle::{ContractSpec, Interception, OperationSpec, Parameter, Target, TargetSpec};
//! use shuttle_wire::{BinaryWire, WireOut, WireType};
//!
//! trait Thermostat {
//!     fn set(&mut self, celsius: i32);
//! }
//!
//! fn thermostat_contract() -> ContractSpec<dyn Thermostat> {
//!     ContractSpec::new("Thermostat").operation(
//!         OperationSpec::<dyn Thermostat>::new("set", |thermostat, args| {
//!             thermostat.set(args.int32(0)?);
//!             Ok(())
//!         })
//!         .param(Parameter::int32("celsius"))
//!         .method_id(1),
//!     )
//! }
//!
//! #[derive(Default)]
//! struct Room {
//!     celsius: i32,
//! }
//!
//! impl Thermostat for Room {
//!     fn set(&mut self, celsius: i32) {
//!         self.celsius = celsius;
//!     }
//! }
//!
//! impl Target for Room {
//!     fn describe(spec: &mut TargetSpec<Self>) {
//!         spec.implements(thermostat_contract(), |room| room);
//!     }
//! }
//!
//! let mut wire = BinaryWire::new();
//! wire.write_numbered(1, &mut |out| out.int32(21));
//!
//! let mut reader = shuttle::build(
//!     vec![Room::default().into()],
//!     WireType::Binary,
//!     Interception::None,
//! )
//! .expect("reader builds");
//! assert!(reader.read_one(&mut wire.reader()));
//! assert_eq!(reader.target::<Room>().map(|room| room.celsius), Some(21));
//! ```

mod argument;
mod artifact;
mod cache;
mod chain;
mod collector;
mod config;
mod contract;
mod error;
mod filter;
mod history;
mod intercept;
mod plan;
mod reader;
mod table;
mod target;
pub mod telemetry;
mod value;

pub use artifact::ReaderArtifact;
pub use cache::{ReaderCache, ReaderKey};
pub use config::{
    DEFAULT_LOG_FILTER, ENV_DISABLE_SYNTHESIS, ENV_DUMP_PLAN, ENV_LOG_FILTER, ENV_LOG_FORMAT,
    LogFormat, SynthesisConfig,
};
pub use contract::{
    CallArgs, ContractSpec, FILTER_MARKER, IntConverterFactory, LongConverterFactory,
    NumericConversion, OperationSpec, Origin, ParamKind, Parameter, Returned,
};
pub use error::{BuildError, DispatchError};
pub use filter::MethodFilterOnFirstArg;
pub use history::{HISTORY, MessageHistory};
pub use intercept::{CallHooks, Continuation, Interception, MethodInterceptor};
pub use reader::{FallbackReader, MethodReader, ReaderBuilder, SkippingFallback, build};
pub use table::{OperationMeta, OperationMetadata};
pub use target::{Target, TargetInstance, TargetSpec};
pub use value::Value;

#[cfg(test)]
mod tests;
