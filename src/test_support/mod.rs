//! Test utilities for funcboot unit tests.
//!
//! [`FakeRunner`] stands in for `uv` and `func`: it records every command,
//! returns configured failures, and otherwise reproduces the on-disk effect
//! of the real tool closely enough for the bootstrap to continue.
//!
//! # Example
//!
//! ```rust,ignore
//! use funcboot::test_support::{FakeRunner, ProjectFixture};
//!
//! #[test]
//! fn test_example() {
//!     let project = ProjectFixture::root("shared-lib").create();
//!     let runner = FakeRunner::with_tools()
//!         .fail("uv sync", ToolOutput::failure(2, "resolution failed"));
//!
//!     // Run the bootstrap against `project.path()` with `&runner`...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::core::manifest::MANIFEST_NAME;
use crate::core::patcher::{self, Patched};
use crate::util::process::{ProcessBuilder, ToolOutput, ToolRunner};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Pattern for matching commands in [`FakeRunner`].
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

/// Fake `uv`/`func` for bootstrap tests.
#[derive(Debug, Default)]
pub struct FakeRunner {
    installed: Vec<String>,
    failures: Vec<(CommandPattern, ToolOutput)>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    /// A runner with no tools installed.
    pub fn new() -> Self {
        FakeRunner::default()
    }

    /// A runner with `uv` and `func` installed.
    pub fn with_tools() -> Self {
        FakeRunner::new().install("uv").install("func")
    }

    /// Make `program` locatable.
    pub fn install(mut self, program: &str) -> Self {
        self.installed.push(program.to_string());
        self
    }

    /// Return `output` for commands starting with `prefix`, without side effects.
    pub fn fail(mut self, prefix: &str, output: ToolOutput) -> Self {
        self.failures
            .push((CommandPattern::StartsWith(prefix.to_string()), output));
        self
    }

    /// Every command that was run, in order.
    pub fn commands(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn emulate(&self, process: &ProcessBuilder) -> Result<()> {
        let cwd = process.get_cwd().unwrap_or_else(|| Path::new("."));
        let args: Vec<String> = process
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let args = args.as_slice();
        let program = process
            .get_program()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match (program.as_str(), args.first().map(String::as_str)) {
            ("uv", Some("init")) => {
                let Some(dir) = args.last() else {
                    bail!("uv init without a path");
                };
                let dir = cwd.join(dir);
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().replace('_', "-"))
                    .unwrap_or_else(|| "app".to_string());
                write(&dir.join(MANIFEST_NAME), &fixtures::app_manifest(&name))?;
                write(&dir.join("main.py"), "def main():\n    print(\"Hello!\")\n")?;
            }
            ("uv", Some("add")) => {
                let project = value_after(args, "--project").unwrap_or(".");
                let Some(package) = args.last() else {
                    bail!("uv add without a package");
                };
                let manifest = cwd.join(project).join(MANIFEST_NAME);
                let text = std::fs::read_to_string(&manifest)?;
                // uv rewrites an empty inline list into the multi-line form.
                let updated = if text.contains("dependencies = []") {
                    text.replace(
                        "dependencies = []",
                        &format!("dependencies = [\n    \"{}\",\n]", package),
                    )
                } else {
                    match patcher::add_dependency(&text, package)? {
                        Patched::Changed(text) => text,
                        Patched::Unchanged => text,
                    }
                };
                write(&manifest, &updated)?;
            }
            ("func", Some("init")) => {
                write(&cwd.join("host.json"), "{\n  \"version\": \"2.0\"\n}\n")?;
                write(
                    &cwd.join("function_app.py"),
                    "import azure.functions as func\n\napp = func.FunctionApp()\n",
                )?;
            }
            ("func", Some("new")) => {
                let Some(name) = value_after(args, "--name") else {
                    bail!("func new without --name");
                };
                let path = cwd.join("function_app.py");
                let mut text = std::fs::read_to_string(&path).unwrap_or_default();
                text.push_str(&format!(
                    "\n@app.route(route=\"{name}\")\ndef {name}(req: func.HttpRequest) -> func.HttpResponse:\n    return func.HttpResponse(\"ok\")\n"
                ));
                write(&path, &text)?;
            }
            _ => {}
        }
        Ok(())
    }
}

impl ToolRunner for FakeRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.installed
            .iter()
            .any(|p| p == program)
            .then(|| PathBuf::from(program))
    }

    fn run(&self, process: &ProcessBuilder) -> Result<ToolOutput> {
        let cmd = process.display_command();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(cmd.clone());
        }

        if let Some((_, output)) = self.failures.iter().find(|(p, _)| p.matches(&cmd)) {
            return Ok(output.clone());
        }

        self.emulate(process)?;
        Ok(ToolOutput::success(""))
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_pattern_matching() {
        let exact = CommandPattern::Exact("uv sync".to_string());
        assert!(exact.matches("uv sync"));
        assert!(!exact.matches("uv sync --frozen"));

        let prefix = CommandPattern::StartsWith("func".to_string());
        assert!(prefix.matches("func new --name x"));
        assert!(!prefix.matches("uv init"));

        let contains = CommandPattern::Contains("--no-sync".to_string());
        assert!(contains.matches("uv add --no-sync --project app azure-functions"));
    }

    #[test]
    fn test_fake_runner_records_and_fails() {
        let runner = FakeRunner::with_tools().fail("uv sync", ToolOutput::failure(2, "boom"));

        assert_eq!(runner.locate("uv"), Some(PathBuf::from("uv")));
        assert_eq!(runner.locate("python3"), None);

        let output = runner.run(&ProcessBuilder::new("uv").arg("sync")).unwrap();
        assert_eq!(output.status, Some(2));
        assert_eq!(runner.commands(), vec!["uv sync"]);
    }

    #[test]
    fn test_fake_uv_init_and_add() {
        let tmp = tempfile::TempDir::new().unwrap();
        let runner = FakeRunner::with_tools();

        runner
            .run(&ProcessBuilder::new("uv").args(["init", "apps/my_app"]).cwd(tmp.path()))
            .unwrap();
        runner
            .run(
                &ProcessBuilder::new("uv")
                    .args(["add", "--project", "apps/my_app", "azure-functions"])
                    .cwd(tmp.path()),
            )
            .unwrap();

        let text = std::fs::read_to_string(tmp.path().join("apps/my_app/pyproject.toml")).unwrap();
        assert!(text.contains("name = \"my-app\""));
        assert!(text.contains("dependencies = [\n    \"azure-functions\",\n]"));
    }
}
