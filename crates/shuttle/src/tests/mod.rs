//! Test suites shared across the dispatcher modules.

pub(crate) mod support;
