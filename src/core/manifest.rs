//! A `pyproject.toml` held in memory while edits are applied.
//!
//! The document is read once, patched through [`ManifestDocument::apply`]
//! and written back at most once by [`ManifestDocument::save`]. Each edit is
//! a text splice from [`crate::core::patcher`]; the result is then parsed
//! with `toml_edit` to confirm the new value landed where it was meant to.
//! If it did not, the edit is rejected and the in-memory text stays as it
//! was.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Deserialize;
use toml_edit::{DocumentMut, Item};

use crate::core::dependency::DependencyEntry;
use crate::core::errors::ManifestError;
use crate::core::patcher::{self, Patched};
use crate::util::fs;

/// File name of the manifest in every project directory.
pub const MANIFEST_NAME: &str = "pyproject.toml";

/// One additive manifest edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEdit {
    /// Prepend an entry to `[project].dependencies`.
    AddDependency(DependencyEntry),

    /// Register a directory in `[tool.uv.workspace].members`.
    WorkspaceMember(String),

    /// Bind a package to the workspace in `[tool.uv.sources]`.
    SourceBinding(String),
}

impl fmt::Display for ManifestEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestEdit::AddDependency(entry) => write!(f, "dependency `{}`", entry),
            ManifestEdit::WorkspaceMember(member) => write!(f, "workspace member `{}`", member),
            ManifestEdit::SourceBinding(package) => {
                write!(f, "source `{} = {{ workspace = true }}`", package)
            }
        }
    }
}

/// What an applied edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The document text was changed.
    Applied,
    /// The target state already held; nothing changed.
    AlreadyPresent,
}

/// A manifest file loaded for editing.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    path: PathBuf,
    original: String,
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct PyProject {
    project: Option<ProjectTable>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectTable {
    name: Option<String>,
}

impl ManifestDocument {
    /// Read a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(ManifestDocument::from_text(path, text))
    }

    /// Wrap manifest text that will be saved to `path`.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        ManifestDocument {
            path: path.into(),
            original: text.clone(),
            text,
        }
    }

    /// Path the document is saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current text, including applied edits.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether any edit changed the text since it was loaded.
    pub fn is_modified(&self) -> bool {
        self.text != self.original
    }

    /// `[project].name`, if the manifest parses and declares one.
    pub fn project_name(&self) -> Option<String> {
        match toml::from_str::<PyProject>(&self.text) {
            Ok(pyproject) => pyproject.project.and_then(|p| p.name),
            Err(e) => {
                tracing::debug!("could not read project name from {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Apply one edit in memory.
    pub fn apply(&mut self, edit: &ManifestEdit) -> Result<EditOutcome, ManifestError> {
        let patched = match edit {
            ManifestEdit::AddDependency(entry) => {
                patcher::add_dependency(&self.text, &entry.to_string())?
            }
            ManifestEdit::WorkspaceMember(member) => {
                patcher::ensure_workspace_member(&self.text, member)?
            }
            ManifestEdit::SourceBinding(package) => {
                patcher::ensure_source_binding(&self.text, package)?
            }
        };

        match patched {
            Patched::Unchanged => {
                tracing::debug!("{} already present in {}", edit, self.path.display());
                Ok(EditOutcome::AlreadyPresent)
            }
            Patched::Changed(text) => {
                verify(&self.text, &text, edit)?;
                tracing::debug!("applied {} to {}", edit, self.path.display());
                self.text = text;
                Ok(EditOutcome::Applied)
            }
        }
    }

    /// Write the document back if it changed. Returns whether a write happened.
    ///
    /// Consumes the document, so a manifest is written at most once.
    pub fn save(self) -> Result<bool> {
        if !self.is_modified() {
            return Ok(false);
        }
        fs::write_string(&self.path, &self.text)?;
        tracing::debug!("wrote {}", self.path.display());
        Ok(true)
    }
}

/// Check that `edited` still parses and holds the value `edit` added.
fn verify(original: &str, edited: &str, edit: &ManifestEdit) -> Result<(), ManifestError> {
    let unverified = |reason: String| ManifestError::Unverified {
        edit: edit.to_string(),
        reason,
    };

    let doc: DocumentMut = match edited.parse() {
        Ok(doc) => doc,
        Err(e) => {
            if original.parse::<DocumentMut>().is_ok() {
                return Err(unverified(format!("result is not valid TOML: {}", e)));
            }
            // Already broken before we touched it; nothing more to check.
            tracing::warn!("manifest did not parse before editing: {}", e);
            return Ok(());
        }
    };

    let found = match edit {
        ManifestEdit::AddDependency(entry) => {
            let entry = entry.to_string();
            lookup(&doc, &["project", "dependencies"])
                .and_then(Item::as_array)
                .is_some_and(|deps| deps.iter().any(|v| v.as_str() == Some(entry.as_str())))
        }
        ManifestEdit::WorkspaceMember(member) => {
            lookup(&doc, &["tool", "uv", "workspace", "members"])
                .and_then(Item::as_array)
                .is_some_and(|members| members.iter().any(|v| v.as_str() == Some(member.as_str())))
        }
        ManifestEdit::SourceBinding(package) => {
            lookup(&doc, &["tool", "uv", "sources", package.as_str()]).is_some()
        }
    };

    if found {
        Ok(())
    } else {
        Err(unverified(
            "the new value is not at its expected TOML path".to_string(),
        ))
    }
}

fn lookup<'a>(doc: &'a DocumentMut, path: &[&str]) -> Option<&'a Item> {
    let (first, rest) = path.split_first()?;
    let mut item = doc.get(first)?;
    for key in rest {
        item = item.get(*key)?;
    }
    Some(item)
}
