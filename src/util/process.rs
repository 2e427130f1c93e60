//! Subprocess execution utilities.
//!
//! External tools (`uv`, `func`) are reached only through [`ToolRunner`],
//! so the bootstrap logic never depends on a real process table and tests
//! can substitute a fake.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Get the working directory, if set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Run to completion with stdin closed, capturing stdout and stderr.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.spawn()
            .and_then(|child| child.wait_with_output())
            .with_context(|| format!("failed to spawn `{}`", self.display_command()))
    }

    /// The command line as shown to the user, with the program's file name
    /// in place of its resolved path.
    pub fn display_command(&self) -> String {
        let program = self
            .program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string());
        let mut parts = vec![program];
        parts.extend(self.args.iter().map(|arg| {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') {
                format!("\"{}\"", arg)
            } else {
                arg.into_owned()
            }
        }));
        parts.join(" ")
    }
}

/// Captured result of running an external tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        ToolOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        ToolOutput {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the tool exited with status zero.
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Narrow interface to the external tools.
pub trait ToolRunner {
    /// Resolve an executable name to a path, if it is installed.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Run a command to completion.
    fn run(&self, process: &ProcessBuilder) -> Result<ToolOutput>;
}

/// Runs tools as real child processes found on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        find_executable(program)
    }

    fn run(&self, process: &ProcessBuilder) -> Result<ToolOutput> {
        tracing::debug!("running `{}`", process.display_command());
        process.exec().map(ToolOutput::from)
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let output = SystemRunner
            .run(&ProcessBuilder::new("echo").arg("hello"))
            .unwrap();

        assert!(output.is_success());
        assert!(output.stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_exit_code() {
        let output = SystemRunner
            .run(&ProcessBuilder::new("sh").args(["-c", "echo oops >&2; exit 3"]))
            .unwrap();

        assert_eq!(output.status, Some(3));
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("func").args([
            "new",
            "--name",
            "http_example",
            "--template",
            "HTTP trigger",
        ]);

        assert_eq!(
            pb.display_command(),
            "func new --name http_example --template \"HTTP trigger\""
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_args_are_passed_through() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"apps/caf\xe9");
        let pb = ProcessBuilder::new("uv").arg("init").arg(raw);

        assert_eq!(pb.get_args()[1].as_os_str(), raw);
        assert_eq!(pb.display_command(), "uv init apps/caf\u{FFFD}");
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let err = SystemRunner
            .run(&ProcessBuilder::new("definitely-not-a-real-tool-xyz"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
