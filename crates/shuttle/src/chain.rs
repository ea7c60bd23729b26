//! Chained contract expansion.
//!
//! An operation whose result implements another contract makes that
//! contract's operations dispatchable too. Each chained contract gets one
//! result slot, shared by every operation chaining into it, which holds the
//! most recent result and serves as the receiver for the contract's
//! operations.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::debug;

use crate::contract::{ChainLink, ErasedContract};
use crate::plan::BUILD_TARGET;

#[derive(Debug, Clone, Copy)]
enum Resolution {
    Slot(usize, &'static str),
    NotChainable(&'static str),
}

/// Outcome of resolving one chain link.
pub(crate) struct Expansion {
    /// Result slot of the chained contract, `None` when results are
    /// discarded.
    pub(crate) slot: Option<usize>,
    /// Name of the chained contract.
    pub(crate) contract: &'static str,
    /// Contract to collect, present only the first time it is reached.
    pub(crate) pending: Option<ErasedContract>,
}

/// Assigns result slots to chained contracts.
#[derive(Debug, Default)]
pub(crate) struct ChainExpander {
    resolved: HashMap<TypeId, Resolution>,
    slots: Vec<&'static str>,
}

impl ChainExpander {
    /// Resolves `link`, building its contract the first time it is seen.
    pub(crate) fn resolve(&mut self, link: &ChainLink) -> Expansion {
        if let Some(resolution) = self.resolved.get(&link.id()) {
            return match *resolution {
                Resolution::Slot(slot, contract) => Expansion {
                    slot: Some(slot),
                    contract,
                    pending: None,
                },
                Resolution::NotChainable(contract) => Expansion {
                    slot: None,
                    contract,
                    pending: None,
                },
            };
        }

        let contract = link.contract();
        if !contract.chainable {
            debug!(
                target: BUILD_TARGET,
                contract = contract.name,
                "contract is not chainable; results will be discarded"
            );
            self.resolved
                .insert(link.id(), Resolution::NotChainable(contract.name));
            return Expansion {
                slot: None,
                contract: contract.name,
                pending: None,
            };
        }

        let slot = self.slots.len();
        self.slots.push(contract.name);
        self.resolved
            .insert(link.id(), Resolution::Slot(slot, contract.name));
        debug!(
            target: BUILD_TARGET,
            contract = contract.name,
            slot,
            "allocated chain result slot"
        );
        Expansion {
            slot: Some(slot),
            contract: contract.name,
            pending: Some(contract),
        }
    }

    /// Returns the contract name held by each slot, in slot order.
    pub(crate) fn into_slots(self) -> Vec<&'static str> {
        self.slots
    }
}
