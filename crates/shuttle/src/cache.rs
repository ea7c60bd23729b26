//! Reader plan cache.
//!
//! Plans are keyed by the ordered target types, the wire type and the kind
//! of interception. Builds for one key are serialized: concurrent callers
//! block on the first build and then share its plan. A failed build leaves
//! the key empty so the next caller tries again.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::{Lazy, OnceCell};
use shuttle_wire::WireType;

use crate::error::BuildError;
use crate::intercept::Interception;
use crate::plan::DispatchPlan;
use crate::target::TargetInstance;

/// Interception as far as plan identity is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum InterceptorKey {
    None,
    Intercepting,
    Generating(String),
}

impl From<&Interception> for InterceptorKey {
    fn from(interception: &Interception) -> Self {
        match interception {
            Interception::None => Self::None,
            Interception::Intercept(_) => Self::Intercepting,
            Interception::Hooks(hooks) => Self::Generating(hooks.generator_id().to_owned()),
        }
    }
}

/// Identity of a reader plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReaderKey {
    targets: Vec<(TypeId, &'static str)>,
    wire_type: WireType,
    interceptor: InterceptorKey,
}

impl ReaderKey {
    /// Derives the key of a reader over `targets`.
    #[must_use]
    pub fn new(targets: &[TargetInstance], wire_type: WireType, interception: &Interception) -> Self {
        Self {
            targets: targets
                .iter()
                .map(|target| (target.type_id(), target.type_name()))
                .collect(),
            wire_type,
            interceptor: interception.into(),
        }
    }

    /// Returns the wire type.
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Names the reader, for example `DeskBinaryInterceptingMethodReader`.
    #[must_use]
    pub fn reader_name(&self) -> String {
        let mut name: String = self.targets.iter().map(|(_, type_name)| *type_name).collect();
        let wire = self.wire_type.as_str();
        let mut letters = wire.chars();
        if let Some(first) = letters.next() {
            name.extend(first.to_uppercase());
            name.push_str(letters.as_str());
        }
        match &self.interceptor {
            InterceptorKey::None => {}
            InterceptorKey::Intercepting => name.push_str("Intercepting"),
            InterceptorKey::Generating(id) => name.push_str(id),
        }
        name.push_str("MethodReader");
        name
    }
}

type Entry = Arc<OnceCell<Arc<DispatchPlan>>>;

/// Cache of compiled reader plans.
#[derive(Debug, Default)]
pub struct ReaderCache {
    entries: Mutex<HashMap<ReaderKey, Entry>>,
}

static GLOBAL: Lazy<Arc<ReaderCache>> = Lazy::new(|| Arc::new(ReaderCache::new()));

impl ReaderCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    pub(crate) fn shared() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Returns the plan for `key`, running `build` if none is cached.
    pub(crate) fn get_or_build<F>(&self, key: &ReaderKey, build: F) -> Result<Arc<DispatchPlan>, BuildError>
    where
        F: FnOnce() -> Result<DispatchPlan, BuildError>,
    {
        let entry = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| BuildError::internal("reader cache lock poisoned"))?;
            Arc::clone(entries.entry(key.clone()).or_default())
        };
        entry.get_or_try_init(|| build().map(Arc::new)).map(Arc::clone)
    }

    /// Returns `true` if a plan for `key` is cached.
    #[must_use]
    pub fn contains(&self, key: &ReaderKey) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|entry| entry.get().is_some())
    }

    /// Drops the plan for `key`, returning `true` if one was cached.
    ///
    /// Readers already built keep their plan.
    pub fn invalidate(&self, key: &ReaderKey) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some_and(|entry| entry.get().is_some())
    }

    /// Drops every cached plan.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Returns the number of cached plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|entry| entry.get().is_some())
            .count()
    }

    /// Returns `true` if no plan is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
