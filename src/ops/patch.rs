//! Implementation of `funcboot patch`.
//!
//! Applies a single manifest edit to a file on disk. This is the same edit
//! the bootstrap performs, exposed for repairing or extending a project by
//! hand.

use std::path::Path;

use anyhow::Result;

use crate::core::errors::BootstrapError;
use crate::core::manifest::{EditOutcome, ManifestDocument, ManifestEdit};

/// Apply `edit` to the manifest at `path`, writing it only when it changed.
pub fn patch_manifest(path: &Path, edit: &ManifestEdit) -> Result<EditOutcome> {
    if !path.is_file() {
        return Err(BootstrapError::missing_manifest(path).into());
    }

    let mut doc = ManifestDocument::load(path)?;
    let outcome = doc
        .apply(edit)
        .map_err(|source| BootstrapError::ManifestStructure {
            path: path.to_path_buf(),
            source,
        })?;

    doc.save()?;
    Ok(outcome)
}
