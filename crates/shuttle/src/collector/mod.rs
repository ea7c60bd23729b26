//! Enumerates the dispatchable operations of a set of targets.
//!
//! Contracts are visited once each, by identity, whichever target or chain
//! reaches them first. Operation names share one namespace across every
//! contract of a reader: a name reached again with the same signature is
//! ignored, while a different signature under the same name rejects the
//! build.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use shuttle_wire::WireType;
use tracing::{debug, trace};

use crate::argument::ArgumentPlan;
use crate::chain::{ChainExpander, Expansion};
use crate::contract::{
    ChainLink, ErasedContract, ErasedOperation, FILTER_MARKER, Origin, ParamKind, Parameter,
};
use crate::error::BuildError;
use crate::filter::FilterGate;
use crate::plan::{BUILD_TARGET, CompiledOperation, ReceiverRef};
use crate::table::OperationMeta;
use crate::target::TargetDescription;

#[derive(Debug, PartialEq, Eq)]
struct Signature {
    params: Vec<ParamKind>,
    method_id: Option<u32>,
    chain: Option<TypeId>,
}

#[derive(Debug)]
struct Registered {
    contract: &'static str,
    signature: Signature,
}

/// Operations and chain slots gathered from every target.
#[derive(Debug)]
pub(crate) struct Collected {
    pub(crate) operations: Vec<CompiledOperation>,
    pub(crate) chain_slots: Vec<&'static str>,
}

/// Walks contracts and compiles their operations.
#[derive(Debug)]
pub(crate) struct ContractCollector {
    wire_type: WireType,
    visited: HashSet<TypeId>,
    registered: HashMap<&'static str, Registered>,
    operations: Vec<CompiledOperation>,
    chains: ChainExpander,
}

impl ContractCollector {
    pub(crate) fn new(wire_type: WireType) -> Self {
        Self {
            wire_type,
            visited: HashSet::new(),
            registered: HashMap::new(),
            operations: Vec::new(),
            chains: ChainExpander::default(),
        }
    }

    /// Collects every contract of the target at `index`.
    pub(crate) fn collect_target(
        &mut self,
        index: usize,
        description: TargetDescription,
    ) -> Result<(), BuildError> {
        let TargetDescription { contracts, filter } = description;
        for contract in contracts {
            self.collect(contract, ReceiverRef::Target(index), filter.as_ref())?;
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Collected {
        Collected {
            operations: self.operations,
            chain_slots: self.chains.into_slots(),
        }
    }

    fn collect(
        &mut self,
        contract: ErasedContract,
        receiver: ReceiverRef,
        filter: Option<&FilterGate>,
    ) -> Result<(), BuildError> {
        if !self.visited.insert(contract.id) {
            trace!(
                target: BUILD_TARGET,
                contract = contract.name,
                "contract already collected"
            );
            return Ok(());
        }

        let ErasedContract {
            name,
            operations,
            parents,
            ..
        } = contract;
        for operation in operations {
            self.register(name, operation, receiver, filter)?;
        }
        for parent in parents {
            self.collect(parent, receiver, filter)?;
        }
        Ok(())
    }

    fn register(
        &mut self,
        contract: &'static str,
        operation: ErasedOperation,
        receiver: ReceiverRef,
        filter: Option<&FilterGate>,
    ) -> Result<(), BuildError> {
        if operation.origin == Origin::Universal
            || operation.is_static
            || operation.name == FILTER_MARKER
        {
            trace!(
                target: BUILD_TARGET,
                contract,
                operation = operation.name,
                "operation is not dispatchable"
            );
            return Ok(());
        }

        let signature = Signature {
            params: operation.params.iter().map(Parameter::kind).collect(),
            method_id: operation.method_id,
            chain: operation.chain.as_ref().map(ChainLink::id),
        };
        if let Some(existing) = self.registered.get(operation.name) {
            if existing.signature == signature {
                debug!(
                    target: BUILD_TARGET,
                    contract,
                    operation = operation.name,
                    first = existing.contract,
                    "operation already registered"
                );
                return Ok(());
            }
            return Err(BuildError::duplicate_operation(
                operation.name,
                existing.contract,
                contract,
            ));
        }
        self.registered.insert(
            operation.name,
            Registered {
                contract,
                signature,
            },
        );

        let expansion = operation.chain.as_ref().map(|link| self.chains.resolve(link));
        let gate = match receiver {
            ReceiverRef::Target(_) if operation.params.len() > 1 => filter.cloned(),
            _ => None,
        };
        let meta = OperationMeta {
            name: operation.name,
            contract,
            method_id: operation.method_id,
            chains_to: expansion.as_ref().map(|chained| chained.contract),
            filtered: gate.is_some(),
            params: operation.params,
        };
        let (chain_slot, pending) =
            expansion.map_or((None, None), |Expansion { slot, pending, .. }| (slot, pending));

        self.operations.push(CompiledOperation {
            args: ArgumentPlan::new(&meta.params, self.wire_type),
            meta: Arc::new(meta),
            receiver,
            chain_slot,
            filter: gate,
            invoke: operation.invoke,
        });

        if let (Some(slot), Some(chained)) = (chain_slot, pending) {
            self.collect(chained, ReceiverRef::Chain(slot), None)?;
        }
        Ok(())
    }
}
