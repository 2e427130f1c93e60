//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use funcboot::ops::LinkMode;
use funcboot::util::shell::ColorChoice;

/// funcboot - scaffold an Azure Functions app inside a uv project
#[derive(Parser)]
#[command(name = "funcboot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Emit machine-readable JSON instead of status lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the shared module and function app and wire them together
    Bootstrap(BootstrapArgs),

    /// Apply a single edit to a pyproject.toml
    #[command(subcommand)]
    Patch(PatchCommand),

    /// Check that uv, func and the project manifest are in place
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Project directory (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Root package name (defaults to `[project].name`)
    #[arg(long, env = "FUNCBOOT_PROJECT_NAME")]
    pub project_name: Option<String>,

    /// Module to create under src/
    #[arg(long, env = "FUNCBOOT_MODULE_NAME")]
    pub module_name: Option<String>,

    /// Function app directory, relative to the project
    #[arg(long, env = "FUNCBOOT_APP_DIR", value_name = "DIR")]
    pub app_dir: Option<PathBuf>,

    /// Name of the example HTTP function
    #[arg(long, env = "FUNCBOOT_FUNCTION_NAME")]
    pub function_name: Option<String>,

    /// Python version for the function app
    #[arg(long, env = "FUNCBOOT_PYTHON_VERSION", value_name = "VERSION")]
    pub python_version: Option<String>,

    /// How the app depends on the root package: workspace, path
    #[arg(long, value_name = "MODE")]
    pub link: Option<LinkMode>,

    /// Skip the final `uv sync`
    #[arg(long)]
    pub no_sync: bool,
}

#[derive(Subcommand, Debug)]
pub enum PatchCommand {
    /// Prepend an entry to `[project].dependencies`
    AddDependency {
        /// Dependency, e.g. `shared-lib` or `shared-lib @ file://../..`
        entry: String,

        #[command(flatten)]
        target: ManifestTarget,
    },

    /// Add a directory to `[tool.uv.workspace].members`
    AddMember {
        /// Member path, relative to the workspace root
        member: String,

        #[command(flatten)]
        target: ManifestTarget,
    },

    /// Bind a package to the workspace in `[tool.uv.sources]`
    AddSource {
        /// Package name
        package: String,

        #[command(flatten)]
        target: ManifestTarget,
    },
}

#[derive(Args, Debug)]
pub struct ManifestTarget {
    /// Manifest to edit
    #[arg(long, value_name = "PATH", default_value = "pyproject.toml")]
    pub manifest: PathBuf,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Project directory (defaults to current directory)
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}
