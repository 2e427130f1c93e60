//! funcboot - bootstrap an Azure Functions app inside a uv project
//!
//! This crate provides the library behind the `funcboot` binary: the
//! text-level `pyproject.toml` patcher, the bootstrap and doctor
//! operations, and the process and output plumbing they share.

pub mod core;
pub mod ops;
pub mod util;

/// Test utilities for funcboot unit tests.
///
/// Only compiled for tests. Provides a fake `uv`/`func` runner and
/// on-disk project fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{
    dependency::DependencyEntry,
    errors::{BootstrapError, ManifestError},
    manifest::{EditOutcome, ManifestDocument, ManifestEdit},
    patcher::Patched,
};

pub use util::context::GlobalContext;
