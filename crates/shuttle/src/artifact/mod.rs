//! Executable readers.
//!
//! A [`ReaderArtifact`] pairs a shared dispatch plan with the state of one
//! reader: the target instances, one value slot and converter cell per
//! parameter site, one result slot per chained contract and the last
//! message history. The state is reused across messages and never shared
//! between readers.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use shuttle_wire::{Event, ValueIn, WireError, WireIn, WireObject, WireType};
use tracing::{debug, trace, warn};

use crate::argument::ConverterCell;
use crate::contract::Returned;
use crate::error::DispatchError;
use crate::history::{HISTORY, MessageHistory};
use crate::intercept::Interception;
use crate::plan::{CompiledOperation, DispatchPlan, ReceiverRef};
use crate::table::OperationMetadata;
use crate::target::{Target, TargetInstance};
use crate::value::Value;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

enum Route {
    History,
    Operation(usize),
    Unknown,
}

/// A synthesized reader bound to its targets.
///
/// Drive it with [`ReaderArtifact::read_one`], one message per call, from a
/// single thread.
pub struct ReaderArtifact {
    plan: Arc<DispatchPlan>,
    targets: Vec<TargetInstance>,
    interception: Interception,
    slots: Vec<Vec<Value>>,
    converters: Vec<Vec<ConverterCell>>,
    chain_results: Vec<Option<Box<dyn Any>>>,
    history: MessageHistory,
    header: String,
    scratch: String,
}

impl ReaderArtifact {
    pub(crate) fn new(
        plan: Arc<DispatchPlan>,
        targets: Vec<TargetInstance>,
        interception: Interception,
    ) -> Self {
        let slots = plan
            .operations()
            .iter()
            .map(|operation| operation.args.new_slots())
            .collect();
        let converters = plan
            .operations()
            .iter()
            .map(|operation| operation.args.new_converters())
            .collect();
        let chain_results = plan.chain_slots().iter().map(|_| None).collect();
        Self {
            plan,
            targets,
            interception,
            slots,
            converters,
            chain_results,
            history: MessageHistory::new(),
            header: String::new(),
            scratch: String::new(),
        }
    }

    /// Reads and dispatches the next message from `wire`.
    ///
    /// Returns `true` when the message was handled, including calls
    /// suppressed by a filter gate and history messages. Returns `false` at
    /// the end of input, for unknown names and ids, and when decoding or
    /// invoking fails. A failure is logged and the rest of the payload is
    /// skipped, so the next call starts at the following message; a caller
    /// may also rewind and hand the message to a fallback reader.
    pub fn read_one(&mut self, wire: &mut dyn WireIn) -> bool {
        let event = match wire.read_event(&mut self.header) {
            Ok(Some(event)) => event,
            Ok(None) => return false,
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    reader = self.plan.name(),
                    %error,
                    "failed to read message header"
                );
                return false;
            }
        };

        let payload = wire.position();
        match self.route(event) {
            Route::Unknown => {
                if let Err(error) = wire.value_in().skip_value() {
                    debug!(
                        target: DISPATCH_TARGET,
                        reader = self.plan.name(),
                        %error,
                        "failed to skip unknown message"
                    );
                }
                false
            }
            Route::History => {
                let read = self.read_history(wire.value_in());
                if !read {
                    self.finish_payload(wire, payload);
                }
                read
            }
            Route::Operation(index) => match self.dispatch(index, wire.value_in()) {
                Ok(()) => true,
                Err(error) => {
                    warn!(
                        target: DISPATCH_TARGET,
                        reader = self.plan.name(),
                        operation = self.operation_name(index),
                        %error,
                        "failure to dispatch message, falling back to the generic reader"
                    );
                    self.finish_payload(wire, payload);
                    false
                }
            },
        }
    }

    /// Moves `wire` past the payload of a message whose handling failed.
    fn finish_payload(&self, wire: &mut dyn WireIn, payload: usize) {
        if let Err(error) = wire.finish_payload(payload) {
            debug!(
                target: DISPATCH_TARGET,
                reader = self.plan.name(),
                %error,
                "failed to skip the rest of the message"
            );
        }
    }

    /// Returns the description of every dispatchable operation.
    #[must_use]
    pub fn operation_metadata(&self) -> &OperationMetadata {
        self.plan.metadata()
    }

    /// Returns the reader name derived from its cache key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.plan.name()
    }

    /// Returns the wire type the reader decodes.
    #[must_use]
    pub fn wire_type(&self) -> WireType {
        self.plan.wire_type()
    }

    /// Returns the history carried by the last `history` message.
    #[must_use]
    pub const fn history(&self) -> &MessageHistory {
        &self.history
    }

    /// Borrows the first target of type `T`.
    #[must_use]
    pub fn target<T: Target>(&self) -> Option<&T> {
        self.targets.iter().find_map(TargetInstance::downcast_ref::<T>)
    }

    /// Mutably borrows the first target of type `T`.
    #[must_use]
    pub fn target_mut<T: Target>(&mut self) -> Option<&mut T> {
        self.targets.iter_mut().find_map(TargetInstance::downcast_mut::<T>)
    }

    /// Returns every target in build order.
    #[must_use]
    pub fn targets(&self) -> &[TargetInstance] {
        &self.targets
    }

    pub(crate) fn targets_mut(&mut self) -> &mut [TargetInstance] {
        &mut self.targets
    }

    /// Releases the targets.
    #[must_use]
    pub fn into_targets(self) -> Vec<TargetInstance> {
        self.targets
    }

    /// Borrows the result held for chained contract `C`, if any call has
    /// produced one.
    #[must_use]
    pub fn chain_result<C: ?Sized + 'static>(&self) -> Option<&C> {
        self.chain_results
            .iter()
            .flatten()
            .find_map(|held| held.downcast_ref::<Box<C>>())
            .map(|boxed| &**boxed)
    }

    /// Returns the number of chained contracts with a result slot.
    #[must_use]
    pub const fn chain_slot_count(&self) -> usize {
        self.chain_results.len()
    }

    fn operation_name(&self, index: usize) -> &'static str {
        self.plan
            .operations()
            .get(index)
            .map_or("<unknown>", |operation| operation.meta.name())
    }

    fn route(&self, event: Event) -> Route {
        let name = match event {
            Event::Id(id) => {
                let Some(name) = self.plan.table().name_for_id(id) else {
                    debug!(
                        target: DISPATCH_TARGET,
                        reader = self.plan.name(),
                        method_id = id,
                        "unknown method id"
                    );
                    return Route::Unknown;
                };
                name
            }
            Event::Named => self.header.as_str(),
        };
        if name == HISTORY {
            return Route::History;
        }
        self.plan.table().index_of(name).map_or_else(
            || {
                debug!(
                    target: DISPATCH_TARGET,
                    reader = self.plan.name(),
                    operation = name,
                    "unknown operation"
                );
                Route::Unknown
            },
            Route::Operation,
        )
    }

    fn read_history(&mut self, input: &mut dyn ValueIn) -> bool {
        let history = &mut self.history;
        let read = input.sequence(&mut |fields| history.read_fields(fields));
        match read {
            Ok(()) => {
                trace!(
                    target: DISPATCH_TARGET,
                    reader = self.plan.name(),
                    sources = self.history.sources().len(),
                    timings = self.history.timings().len(),
                    "message history read"
                );
                true
            }
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    reader = self.plan.name(),
                    %error,
                    "failed to read message history"
                );
                false
            }
        }
    }

    fn dispatch(&mut self, index: usize, input: &mut dyn ValueIn) -> Result<(), DispatchError> {
        let Self {
            plan,
            targets,
            interception,
            slots,
            converters,
            chain_results,
            scratch,
            ..
        } = self;
        let (Some(operation), Some(values), Some(cells)) = (
            plan.operations().get(index),
            slots.get_mut(index),
            converters.get(index),
        ) else {
            return Err(DispatchError::target(
                "<unknown>",
                format!("operation {index} is not compiled"),
            ));
        };
        let name = operation.meta.name();

        if !decode_arguments(operation, input, values, cells, scratch, targets)? {
            debug!(
                target: DISPATCH_TARGET,
                operation = name,
                "call ignored by filter"
            );
            return Ok(());
        }

        let receiver = match operation.receiver {
            ReceiverRef::Target(at) => targets.get_mut(at).map(TargetInstance::receiver),
            ReceiverRef::Chain(at) => chain_results.get_mut(at).and_then(Option::as_deref_mut),
        }
        .ok_or_else(|| DispatchError::missing_receiver(name))?;

        let returned = interception.call(&operation.meta, &operation.invoke, receiver, values)?;
        if let Some(held) = operation
            .chain_slot
            .and_then(|slot| chain_results.get_mut(slot))
        {
            *held = match returned {
                Returned::Chained(result) => Some(result),
                Returned::Unit => None,
            };
        }
        Ok(())
    }
}

/// Decodes the arguments of `operation` into `values`.
///
/// Returns `false` when the filter gate suppressed the call; its remaining
/// arguments are skipped.
fn decode_arguments(
    operation: &CompiledOperation,
    input: &mut dyn ValueIn,
    values: &mut [Value],
    cells: &[ConverterCell],
    scratch: &mut String,
    targets: &mut [TargetInstance],
) -> Result<bool, WireError> {
    let args = &operation.args;
    match args.len() {
        0 => {
            input.skip_value()?;
            Ok(true)
        }
        1 => {
            if let (Some(value), Some(cell)) = (values.first_mut(), cells.first()) {
                args.decode(0, input, value, cell, scratch)?;
            }
            Ok(true)
        }
        _ => {
            let mut ignored = false;
            input.sequence(&mut |items| {
                for (index, (value, cell)) in values.iter_mut().zip(cells).enumerate() {
                    args.decode(index, items, value, cell, scratch)?;
                    if index == 0 && filter_ignores(operation, targets, value) {
                        ignored = true;
                        break;
                    }
                }
                if ignored {
                    while items.has_remaining() {
                        items.skip_value()?;
                    }
                }
                Ok(())
            })?;
            Ok(!ignored)
        }
    }
}

fn filter_ignores(
    operation: &CompiledOperation,
    targets: &mut [TargetInstance],
    first_arg: &Value,
) -> bool {
    match (&operation.filter, operation.receiver) {
        (Some(gate), ReceiverRef::Target(at)) => targets
            .get_mut(at)
            .is_some_and(|target| gate.ignores(target.receiver(), operation.meta.name(), first_arg)),
        _ => false,
    }
}

impl fmt::Debug for ReaderArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderArtifact")
            .field("name", &self.plan.name())
            .field("targets", &self.targets)
            .field("interception", &self.interception)
            .field("chain_slots", &self.chain_results.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
