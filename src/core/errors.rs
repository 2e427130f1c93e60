//! Error types for manifest patching and bootstrapping.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A manifest edit could not be applied without guessing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("dependency list anchor not found (expected a line starting with `{anchor}`)")]
    MissingAnchor { anchor: &'static str },

    #[error("malformed `{section}` section: {reason}")]
    Malformed {
        section: &'static str,
        reason: String,
    },

    #[error("edit `{edit}` produced an unexpected manifest: {reason}")]
    Unverified { edit: String, reason: String },
}

/// Fatal bootstrap failure.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum BootstrapError {
    /// A required tool or input file is missing.
    #[error("{what} not found")]
    #[diagnostic(code(funcboot::precondition), help("{remedy}"))]
    Precondition { what: String, remedy: String },

    /// The manifest lacks the structure an edit needs.
    #[error("cannot patch `{}`", path.display())]
    #[diagnostic(
        code(funcboot::manifest_structure),
        help("Fix the manifest by hand and re-run; nothing was written")
    )]
    ManifestStructure {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    /// A delegated tool exited unsuccessfully.
    #[error("`{command}` failed with exit code {status:?}\n{stderr}")]
    #[diagnostic(code(funcboot::external_tool))]
    ExternalTool {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl BootstrapError {
    /// A required executable is not on `PATH`.
    pub fn missing_tool(program: &str) -> Self {
        let remedy = match program {
            "uv" => suggestions::INSTALL_UV.to_string(),
            "func" => suggestions::INSTALL_FUNC.to_string(),
            other => format!("Install `{}` and make sure it is on PATH", other),
        };
        BootstrapError::Precondition {
            what: format!("`{}` executable", program),
            remedy,
        }
    }

    /// The root manifest does not exist.
    pub fn missing_manifest(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        BootstrapError::Precondition {
            what: format!("manifest `{}`", path.display()),
            remedy: suggestions::NO_MANIFEST.to_string(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BootstrapError::Precondition { what, remedy } => {
                Diagnostic::error(format!("{} not found", what))
                    .with_suggestion(remedy.clone())
                    .with_suggestion(suggestions::RUN_DOCTOR)
            }

            BootstrapError::ManifestStructure { path, source } => {
                Diagnostic::error(format!("cannot patch `{}`", path.display()))
                    .with_location(path.clone())
                    .with_context(source.to_string())
                    .with_suggestion(suggestions::FIX_MANIFEST.to_string())
            }

            BootstrapError::ExternalTool {
                command,
                status,
                stderr,
            } => {
                let code = status
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string());
                let mut diag =
                    Diagnostic::error(format!("`{}` failed with exit code {}", command, code));
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    diag = diag.with_context(line.to_string());
                }
                diag
            }
        }
    }
}
