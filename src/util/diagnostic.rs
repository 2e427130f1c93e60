//! User-friendly diagnostic messages.
//!
//! Every fatal error is rendered with its root cause, any context the
//! failing step collected, and a suggested fix.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// No `pyproject.toml` in the project directory.
    pub const NO_MANIFEST: &str =
        "Run `uv init` in the project directory first, or pass `--path <project>`";

    /// `uv` is not installed.
    pub const INSTALL_UV: &str =
        "Install uv: https://docs.astral.sh/uv/getting-started/installation/";

    /// Azure Functions Core Tools are not installed.
    pub const INSTALL_FUNC: &str =
        "Install the Azure Functions Core Tools (`npm i -g azure-functions-core-tools@4`)";

    /// A manifest edit needed structure that is not there.
    pub const FIX_MANIFEST: &str =
        "Edit the manifest by hand so the expected list or section exists, then re-run";

    /// Something is wrong with the local environment.
    pub const RUN_DOCTOR: &str = "Run `funcboot doctor` to check your environment";
}

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    fn style(self) -> &'static str {
        match self {
            Severity::Error => "\x1b[1;31m",
            Severity::Warning => "\x1b[1;33m",
        }
    }
}

/// An error or warning rendered for a person, not a log.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// File the problem is in
    pub location: Option<PathBuf>,
    /// Supporting detail, one line each
    pub context: Vec<String>,
    /// Numbered remedies
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            location: None,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Render for a terminal:
    ///
    /// ```text
    /// error: cannot patch `pyproject.toml`
    ///   --> pyproject.toml
    ///   = dependency list anchor not found
    ///
    /// help: consider:
    ///   1. Edit the manifest by hand ...
    /// ```
    pub fn format(&self, color: bool) -> String {
        let paint = |style: &str, text: &str| {
            if color {
                format!("{style}{text}\x1b[0m")
            } else {
                text.to_string()
            }
        };

        let mut lines = vec![format!(
            "{}: {}",
            paint(self.severity.style(), self.severity.label()),
            self.message
        )];
        lines.extend(self.location.iter().map(|p| format!("  --> {}", p.display())));
        lines.extend(self.context.iter().map(|c| format!("  = {c}")));

        if !self.suggestions.is_empty() {
            lines.push(String::new());
            lines.push(format!("{}: consider:", paint("\x1b[1;32m", "help")));
            lines.extend(
                self.suggestions
                    .iter()
                    .enumerate()
                    .map(|(i, s)| format!("  {}. {}", i + 1, s)),
            );
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
