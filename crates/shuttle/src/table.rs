//! Name and method id lookup for compiled operations.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use crate::contract::Parameter;
use crate::error::BuildError;

/// Static description of one dispatchable operation.
///
/// Handed to interceptors and call hooks and published through
/// [`OperationMetadata`].
#[derive(Debug, Clone)]
pub struct OperationMeta {
    pub(crate) name: &'static str,
    pub(crate) contract: &'static str,
    pub(crate) method_id: Option<u32>,
    pub(crate) params: Vec<Parameter>,
    pub(crate) chains_to: Option<&'static str>,
    pub(crate) filtered: bool,
}

impl OperationMeta {
    /// Returns the operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the name of the contract declaring the operation.
    #[must_use]
    pub const fn contract(&self) -> &'static str {
        self.contract
    }

    /// Returns the numeric alias of the name, if one is assigned.
    #[must_use]
    pub const fn method_id(&self) -> Option<u32> {
        self.method_id
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Returns the contract the result is dispatched on, if the operation
    /// chains.
    #[must_use]
    pub const fn chains_to(&self) -> Option<&'static str> {
        self.chains_to
    }

    /// Returns `true` if the first argument passes through a filter gate.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.filtered
    }
}

/// Read-only mapping from operation name to its description.
#[derive(Debug, Clone, Default)]
pub struct OperationMetadata {
    by_name: HashMap<&'static str, Arc<OperationMeta>>,
}

impl OperationMetadata {
    /// Returns the description of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OperationMeta> {
        self.by_name.get(name).map(AsRef::as_ref)
    }

    /// Returns `true` if `name` is dispatchable.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns the number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if nothing is dispatchable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterates over every description in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &OperationMeta> {
        self.by_name.values().map(AsRef::as_ref)
    }

    /// Returns the operation names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_name.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Lookup from message header to compiled operation index.
#[derive(Debug, Clone, Default)]
pub(crate) struct DispatchTable {
    by_name: HashMap<&'static str, usize>,
    by_id: HashMap<u32, &'static str>,
}

impl DispatchTable {
    /// Returns the index of the operation called `name`.
    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Translates a method id into its canonical name.
    pub(crate) fn name_for_id(&self, id: u32) -> Option<&'static str> {
        self.by_id.get(&id).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }
}

/// Assembles a [`DispatchTable`] and the metadata published with it.
#[derive(Debug, Default)]
pub(crate) struct DispatchTableBuilder {
    table: DispatchTable,
    metadata: OperationMetadata,
}

impl DispatchTableBuilder {
    /// Registers operation `index`.
    ///
    /// Names reaching the builder are already unique; a method id already
    /// held by another operation is rejected.
    pub(crate) fn insert(&mut self, index: usize, meta: &Arc<OperationMeta>) -> Result<(), BuildError> {
        if let Some(id) = meta.method_id {
            match self.table.by_id.entry(id) {
                Entry::Occupied(existing) => {
                    return Err(BuildError::DuplicateMethodId {
                        id,
                        existing: (*existing.get()).to_owned(),
                        attempted: meta.name.to_owned(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(meta.name);
                }
            }
        }

        match self.table.by_name.entry(meta.name) {
            Entry::Occupied(_) => {
                return Err(BuildError::internal(format!(
                    "operation '{}' reached the dispatch table twice",
                    meta.name
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
        }
        self.metadata.by_name.insert(meta.name, Arc::clone(meta));
        Ok(())
    }

    pub(crate) fn finish(self) -> (DispatchTable, OperationMetadata) {
        (self.table, self.metadata)
    }
}
