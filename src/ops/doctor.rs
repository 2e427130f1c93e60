//! Environment health checks.
//!
//! The `doctor` command verifies that a bootstrap can run here without
//! changing anything on disk.
//!
//! ## Usage
//!
//! ```bash
//! funcboot doctor           # Quick check
//! funcboot doctor --verbose # Detailed output
//! ```
//!
//! ## Checks Performed
//!
//! - Root `pyproject.toml` present and readable
//! - Manifest anchors the bootstrap edits rely on (informational)
//! - `uv` and `func` on `PATH`
//! - `python3` on `PATH` (optional)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;

use crate::core::manifest::{ManifestDocument, MANIFEST_NAME};
use crate::core::patcher::{self, DEPENDENCIES_ANCHOR, WORKSPACE_HEADER};
use crate::util::process::{ProcessBuilder, ToolRunner};

/// Result of a single health check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Path to the tool or file (if applicable)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// How long the check took
    #[serde(skip)]
    pub duration: Duration,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            duration: Duration::ZERO,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..CheckResult::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Summary of all health checks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,

    /// Total time taken
    #[serde(skip)]
    pub total_duration: Duration,

    /// Environment information
    pub environment: BTreeMap<String, String>,
}

impl DoctorReport {
    pub fn new() -> Self {
        DoctorReport::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Run every check against `project_dir`.
pub fn doctor(project_dir: &Path, runner: &dyn ToolRunner) -> Result<DoctorReport> {
    let start = Instant::now();
    let mut report = DoctorReport::new();

    report
        .environment
        .insert("os".to_string(), std::env::consts::OS.to_string());
    report
        .environment
        .insert("arch".to_string(), std::env::consts::ARCH.to_string());
    report
        .environment
        .insert("project".to_string(), project_dir.display().to_string());

    let manifest_path = project_dir.join(MANIFEST_NAME);
    let (manifest, doc) = check_manifest(&manifest_path);
    report.add(manifest);

    if let Some(doc) = doc {
        report.add(check_anchors(&doc));
    }

    report.add(check_tool(runner, "uv", "uv"));
    report.add(check_tool(runner, "func", "Azure Functions Core Tools"));
    report.add(check_tool(runner, "python3", "Python").optional());

    report.total_duration = start.elapsed();
    tracing::debug!(
        "doctor finished in {:?}: {} passed, {} failed",
        report.total_duration,
        report.passed_count(),
        report.failed_count()
    );
    Ok(report)
}

fn check_manifest(path: &Path) -> (CheckResult, Option<ManifestDocument>) {
    let start = Instant::now();

    match ManifestDocument::load(path) {
        Ok(doc) => {
            let message = match doc.project_name() {
                Some(name) => format!("Found project `{}`", name),
                None => "Found manifest without `[project].name`".to_string(),
            };
            let check = CheckResult::pass("Manifest", message)
                .with_path(path.to_path_buf())
                .with_duration(start.elapsed());
            (check, Some(doc))
        }
        Err(e) => {
            let check = CheckResult::fail("Manifest", format!("{:#}", e))
                .with_path(path.to_path_buf())
                .with_duration(start.elapsed());
            (check, None)
        }
    }
}

/// Informational: reports which edit anchors the manifest already has.
fn check_anchors(doc: &ManifestDocument) -> CheckResult {
    let start = Instant::now();

    let text = doc.text();
    let has_dependencies = patcher::has_dependency_anchor(text);
    let has_workspace = patcher::has_section(text, WORKSPACE_HEADER);

    let message = match (has_dependencies, has_workspace) {
        (true, true) => format!("`{}` list and `{}` section present", DEPENDENCIES_ANCHOR, WORKSPACE_HEADER),
        (true, false) => format!("`{}` list present; `{}` will be created", DEPENDENCIES_ANCHOR, WORKSPACE_HEADER),
        (false, true) => format!("`{}` section present; no `{}` list", WORKSPACE_HEADER, DEPENDENCIES_ANCHOR),
        (false, false) => format!("`{}` will be created", WORKSPACE_HEADER),
    };

    CheckResult::pass("Manifest anchors", message)
        .optional()
        .with_duration(start.elapsed())
}

fn check_tool(runner: &dyn ToolRunner, program: &str, label: &str) -> CheckResult {
    let start = Instant::now();

    let Some(path) = runner.locate(program) else {
        return CheckResult::fail(label, format!("`{}` not found on PATH", program))
            .with_duration(start.elapsed());
    };

    let version = runner
        .run(&ProcessBuilder::new(&path).arg("--version"))
        .ok()
        .filter(|o| o.is_success())
        .and_then(|o| {
            o.stdout
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown version".to_string());

    CheckResult::pass(label, format!("Found {}", program))
        .with_path(path)
        .with_version(version)
        .with_duration(start.elapsed())
}

/// Format the doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    use std::fmt::Write;

    let mut output = String::new();

    let _ = writeln!(output, "funcboot doctor");
    let _ = writeln!(output, "===============\n");

    if verbose {
        let get = |key: &str| {
            report
                .environment
                .get(key)
                .map(String::as_str)
                .unwrap_or("unknown")
        };
        let _ = writeln!(output, "Environment:");
        let _ = writeln!(output, "  OS: {} ({})", get("os"), get("arch"));
        let _ = writeln!(output, "  Project: {}", get("project"));
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };

        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        if verbose {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
        }
    }

    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();

    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\n{} required check(s) failed. `funcboot bootstrap` will not run.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nAll required checks passed. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nAll checks passed. Ready to bootstrap.");
    }

    output
}
