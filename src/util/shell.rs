//! User-facing output.
//!
//! Progress goes to stderr as right-aligned status lines
//! (`     Created src/shared/__init__.py`). With `--json` those lines are
//! suppressed and results are printed to stdout as one JSON object per
//! line. `tracing` output is separate and controlled by `--verbose`.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::str::FromStr;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// How much human-readable output to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    #[default]
    Normal,
    /// Every external command is printed before it runs, no spinner.
    Verbose,
}

/// `--color` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            other => Err(format!(
                "invalid color choice '{other}'; expected auto, always or never"
            )),
        }
    }
}

/// Label printed in front of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Added,
    Created,
    Updated,
    Finished,
    Running,
    Syncing,
    Skipped,
    Warning,
    Error,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Added => "Added",
            Status::Created => "Created",
            Status::Updated => "Updated",
            Status::Finished => "Finished",
            Status::Running => "Running",
            Status::Syncing => "Syncing",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    /// ANSI bold + color for the label.
    fn style(self) -> &'static str {
        match self {
            Status::Added | Status::Created | Status::Updated | Status::Finished => "\x1b[1;32m",
            Status::Running | Status::Syncing => "\x1b[1;36m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Width the status label is right-aligned to.
const LABEL_WIDTH: usize = 12;

/// Output sink shared by every command.
#[derive(Debug)]
pub struct Shell {
    verbosity: Verbosity,
    json: bool,
    color: bool,
    interactive: bool,
}

impl Shell {
    pub fn new(verbosity: Verbosity, color: ColorChoice, json: bool) -> Self {
        let interactive = io::stderr().is_terminal();
        let color = !json
            && match color {
                ColorChoice::Auto => interactive,
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            };

        Shell {
            verbosity,
            json,
            color,
            interactive,
        }
    }

    /// Build from the global CLI flags. `--json` wins over `--quiet` and
    /// `--verbose`.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        let verbosity = match (json, quiet, verbose) {
            (true, _, _) => Verbosity::Normal,
            (false, true, _) => Verbosity::Quiet,
            (false, false, true) => Verbosity::Verbose,
            (false, false, false) => Verbosity::Normal,
        };
        Shell::new(verbosity, color, json)
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == Verbosity::Verbose
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn use_color(&self) -> bool {
        self.color
    }

    /// Print `{status:>12} {msg}` to stderr.
    ///
    /// Nothing is printed in JSON mode; in quiet mode only errors are.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.json || (self.is_quiet() && status != Status::Error) {
            return;
        }
        eprintln!("{} {}", self.label(status), msg);
    }

    /// Report an error as a status line, or as a JSON event with `--json`.
    pub fn error(&self, msg: impl Display) {
        if self.json {
            self.json_event(&serde_json::json!({
                "reason": "error",
                "message": msg.to_string(),
            }));
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Print one JSON object to stdout. No-op outside JSON mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.json {
            return;
        }
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", event);
        let _ = stdout.flush();
    }

    fn label(&self, status: Status) -> String {
        if self.color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.style(),
                status.label(),
                width = LABEL_WIDTH
            )
        } else {
            format!("{:>width$}", status.label(), width = LABEL_WIDTH)
        }
    }

    /// Show a spinner while an external command runs.
    ///
    /// Verbose mode prints the command as a status line instead. Nothing is
    /// drawn when quiet, in JSON mode, or when stderr is not a terminal.
    pub fn spinner(&self, status: Status, msg: impl Display) -> Spinner {
        if self.is_verbose() {
            self.status(status, msg);
            return Spinner { bar: None };
        }
        if self.is_quiet() || self.json || !self.interactive {
            return Spinner { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(format!("{} {}", status.label(), msg));
        bar.enable_steady_tick(Duration::from_millis(100));
        Spinner { bar: Some(bar) }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(Verbosity::Normal, ColorChoice::Auto, false)
    }
}

/// Running-command spinner; cleared on drop.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn finish(self) {}
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
