//! Core data structures for funcboot.
//!
//! - Dependency entries as written into `[project].dependencies`
//! - The text-level manifest patcher
//! - Manifest documents that apply and verify edits
//! - Error types shared by the operations

pub mod dependency;
pub mod errors;
pub mod manifest;
pub mod patcher;

pub use dependency::DependencyEntry;
pub use errors::{BootstrapError, ManifestError};
pub use manifest::{EditOutcome, ManifestDocument, ManifestEdit, MANIFEST_NAME};
pub use patcher::Patched;
