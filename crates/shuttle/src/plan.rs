//! Compiled dispatch plans.
//!
//! A plan is everything about a reader that depends only on the target
//! types and the wire type: the compiled operations, the lookup table and
//! the published metadata. Plans are immutable and shared through the
//! reader cache; per-instance state lives in the artifact.

use std::any::TypeId;
use std::sync::Arc;

use shuttle_wire::WireType;
use tracing::{debug, info};

use crate::argument::ArgumentPlan;
use crate::collector::{Collected, ContractCollector};
use crate::contract::ErasedInvoker;
use crate::error::BuildError;
use crate::filter::FilterGate;
use crate::table::{DispatchTable, DispatchTableBuilder, OperationMeta, OperationMetadata};
use crate::target::TargetInstance;

pub(crate) const BUILD_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::build");

/// Where an operation finds its receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReceiverRef {
    /// The target instance at this index.
    Target(usize),
    /// The chain result slot at this index.
    Chain(usize),
}

/// One operation ready for dispatch.
pub(crate) struct CompiledOperation {
    pub(crate) meta: Arc<OperationMeta>,
    pub(crate) receiver: ReceiverRef,
    pub(crate) args: ArgumentPlan,
    /// Slot receiving the result when the operation chains.
    pub(crate) chain_slot: Option<usize>,
    pub(crate) filter: Option<FilterGate>,
    pub(crate) invoke: ErasedInvoker,
}

impl std::fmt::Debug for CompiledOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledOperation")
            .field("name", &self.meta.name())
            .field("receiver", &self.receiver)
            .field("args", &self.args)
            .field("chain_slot", &self.chain_slot)
            .field("filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

/// Immutable dispatch plan for one target type set and wire type.
#[derive(Debug)]
pub(crate) struct DispatchPlan {
    name: String,
    wire_type: WireType,
    target_types: Vec<TypeId>,
    operations: Vec<CompiledOperation>,
    table: DispatchTable,
    metadata: OperationMetadata,
    chain_slots: Vec<&'static str>,
}

impl DispatchPlan {
    /// Compiles the contracts of `targets` for `wire_type`.
    pub(crate) fn compile(
        targets: &[TargetInstance],
        wire_type: WireType,
        name: String,
        dump_plan: bool,
    ) -> Result<Self, BuildError> {
        if targets.is_empty() {
            return Err(BuildError::NoTargets);
        }

        let mut collector = ContractCollector::new(wire_type);
        for (index, target) in targets.iter().enumerate() {
            debug!(
                target: BUILD_TARGET,
                reader = %name,
                target_type = target.type_name(),
                "collecting contracts"
            );
            collector.collect_target(index, target.description())?;
        }
        let Collected {
            operations,
            chain_slots,
        } = collector.finish();

        let mut builder = DispatchTableBuilder::default();
        for (index, operation) in operations.iter().enumerate() {
            builder.insert(index, &operation.meta)?;
        }
        let (table, metadata) = builder.finish();

        let plan = Self {
            name,
            wire_type,
            target_types: targets.iter().map(TargetInstance::type_id).collect(),
            operations,
            table,
            metadata,
            chain_slots,
        };
        debug!(
            target: BUILD_TARGET,
            reader = %plan.name,
            wire_type = %plan.wire_type,
            operations = plan.table.len(),
            chain_slots = plan.chain_slots.len(),
            "dispatch plan compiled"
        );
        if dump_plan {
            plan.dump();
        }
        Ok(plan)
    }

    fn dump(&self) {
        for operation in &self.operations {
            let meta = &operation.meta;
            info!(
                target: BUILD_TARGET,
                reader = %self.name,
                operation = meta.name(),
                contract = meta.contract(),
                method_id = ?meta.method_id(),
                params = operation.args.len(),
                receiver = ?operation.receiver,
                chains_to = ?meta.chains_to(),
                filtered = meta.is_filtered(),
                "compiled operation"
            );
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) const fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Returns `true` if the plan was compiled for these target types.
    pub(crate) fn fits(&self, targets: &[TargetInstance]) -> bool {
        self.target_types.len() == targets.len()
            && self
                .target_types
                .iter()
                .zip(targets)
                .all(|(expected, target)| *expected == target.type_id())
    }

    pub(crate) fn operations(&self) -> &[CompiledOperation] {
        &self.operations
    }

    pub(crate) const fn table(&self) -> &DispatchTable {
        &self.table
    }

    pub(crate) const fn metadata(&self) -> &OperationMetadata {
        &self.metadata
    }

    pub(crate) fn chain_slots(&self) -> &[&'static str] {
        &self.chain_slots
    }
}
