//! Implementation of `funcboot bootstrap`.
//!
//! Scaffolds a reusable module and an Azure Functions app inside an existing
//! uv project, then wires the app to the root package:
//!
//! 1. check that the root manifest, `uv` and `func` are present
//! 2. create `src/<module>/__init__.py`
//! 3. `uv init` the app directory and `uv add azure-functions` to it
//! 4. `func init` and `func new` inside the app directory
//! 5. patch the app and root manifests (see [`LinkMode`])
//! 6. `uv sync`
//!
//! Each step is skipped when its result already exists, so re-running the
//! command on a bootstrapped project changes nothing. Manifest edits are
//! computed for both manifests before either is written.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::dependency::DependencyEntry;
use crate::core::errors::BootstrapError;
use crate::core::manifest::{EditOutcome, ManifestDocument, ManifestEdit, MANIFEST_NAME};
use crate::util::config::BootstrapSettings;
use crate::util::fs;
use crate::util::process::{ProcessBuilder, ToolOutput, ToolRunner};
use crate::util::shell::{Shell, Status};

/// Default name of the reusable module created under `src/`.
pub const DEFAULT_MODULE_NAME: &str = "shared";

/// Default location of the function app, relative to the project root.
pub const DEFAULT_APP_DIR: &str = "apps/function_app";

/// Default name of the example function.
pub const DEFAULT_FUNCTION_NAME: &str = "http_example";

/// Default Python version passed to `uv init`.
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// Runtime package every function app depends on.
pub const FUNCTIONS_PACKAGE: &str = "azure-functions";

/// How the app refers to the root package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// App is a workspace member; the root package resolves through
    /// `[tool.uv.sources] <name> = { workspace = true }`.
    #[default]
    Workspace,
    /// App depends on `<name> @ file://<path to root>` directly.
    Path,
}

impl FromStr for LinkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workspace" => Ok(LinkMode::Workspace),
            "path" => Ok(LinkMode::Path),
            _ => Err(format!(
                "invalid link mode '{}'; expected 'workspace' or 'path'",
                s
            )),
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::Workspace => write!(f, "workspace"),
            LinkMode::Path => write!(f, "path"),
        }
    }
}

/// Everything the bootstrap needs, with defaults made explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Project root holding `pyproject.toml`
    pub project_dir: PathBuf,

    /// Root package name; read from the manifest when unset
    pub project_name: Option<String>,

    /// Reusable module created under `src/`
    pub module_name: String,

    /// Function app directory, relative to `project_dir`
    pub app_dir: PathBuf,

    /// Name of the example function
    pub function_name: String,

    /// Python version for the app project
    pub python_version: String,

    /// How the app refers to the root package
    pub link: LinkMode,

    /// Run `uv sync` at the end
    pub sync: bool,
}

impl BootstrapConfig {
    /// Configuration with every default applied.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        BootstrapConfig {
            project_dir: project_dir.into(),
            project_name: None,
            module_name: DEFAULT_MODULE_NAME.to_string(),
            app_dir: PathBuf::from(DEFAULT_APP_DIR),
            function_name: DEFAULT_FUNCTION_NAME.to_string(),
            python_version: DEFAULT_PYTHON_VERSION.to_string(),
            link: LinkMode::default(),
            sync: true,
        }
    }

    /// Overlay values from a config file.
    pub fn with_settings(mut self, settings: &BootstrapSettings) -> Self {
        if let Some(ref name) = settings.project_name {
            self.project_name = Some(name.clone());
        }
        if let Some(ref module) = settings.module_name {
            self.module_name = module.clone();
        }
        if let Some(ref app_dir) = settings.app_dir {
            self.app_dir = app_dir.clone();
        }
        if let Some(ref function) = settings.function_name {
            self.function_name = function.clone();
        }
        if let Some(ref version) = settings.python_version {
            self.python_version = version.clone();
        }
        if let Some(link) = settings.link {
            self.link = link;
        }
        if let Some(sync) = settings.sync {
            self.sync = sync;
        }
        self
    }

    /// Absolute path of the function app.
    pub fn app_path(&self) -> PathBuf {
        self.project_dir.join(&self.app_dir)
    }

    /// The app directory as written into the workspace members list.
    pub fn member_path(&self) -> String {
        self.app_dir
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// One manifest edit and whether it changed anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRecord {
    pub manifest: PathBuf,
    pub edit: String,
    pub applied: bool,
}

/// What a bootstrap run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    /// Root package name the app was wired to
    pub project_name: String,
    /// Files and directories created by funcboot or the tools it ran
    pub created: Vec<PathBuf>,
    /// Commands that were run, in order
    pub commands: Vec<String>,
    /// Manifest edits, applied or already present
    pub edits: Vec<EditRecord>,
    /// Manifests that were written
    pub written: Vec<PathBuf>,
}

impl BootstrapReport {
    /// Whether the run changed nothing on disk.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.written.is_empty()
    }
}

/// Resolved executables.
struct Tools {
    uv: PathBuf,
    func: PathBuf,
}

/// Run the bootstrap.
pub fn bootstrap(
    config: &BootstrapConfig,
    runner: &dyn ToolRunner,
    shell: &Shell,
) -> Result<BootstrapReport> {
    let root = config.project_dir.as_path();
    let root_manifest = root.join(MANIFEST_NAME);

    let tools = check_preconditions(&root_manifest, runner)?;
    let mut root_doc = ManifestDocument::load(&root_manifest)?;
    let project_name = resolve_project_name(config, &root_doc)?;
    tracing::debug!("bootstrapping `{}` in {}", project_name, root.display());

    let mut report = BootstrapReport {
        project_name: project_name.clone(),
        ..BootstrapReport::default()
    };

    create_module(config, shell, &mut report)?;
    create_app(config, &tools, runner, shell, &mut report)?;
    create_function(config, &tools, runner, shell, &mut report)?;

    let app_manifest = config.app_path().join(MANIFEST_NAME);
    let mut app_doc = ManifestDocument::load(&app_manifest)?;

    let (app_edits, root_edits) = wiring_edits(config, &project_name);
    apply_edits(&mut app_doc, &app_edits, shell, &mut report)?;
    apply_edits(&mut root_doc, &root_edits, shell, &mut report)?;

    for doc in [app_doc, root_doc] {
        let path = doc.path().to_path_buf();
        if doc.save()? {
            shell.status(Status::Updated, display_path(root, &path));
            report.written.push(path);
        }
    }

    if config.sync {
        let sync = ProcessBuilder::new(&tools.uv).arg("sync").cwd(root);
        run_tool(runner, shell, Status::Syncing, sync, &mut report)?;
    }

    if report.is_noop() {
        shell.status(Status::Finished, "project already bootstrapped, nothing to do");
    } else {
        shell.status(
            Status::Finished,
            format!(
                "`{}` wired to `{}`",
                config.member_path(),
                project_name
            ),
        );
    }

    Ok(report)
}

/// Fail fast when the root manifest or a required tool is missing.
fn check_preconditions(
    root_manifest: &Path,
    runner: &dyn ToolRunner,
) -> Result<Tools, BootstrapError> {
    if !root_manifest.is_file() {
        return Err(BootstrapError::missing_manifest(root_manifest));
    }

    let uv = runner
        .locate("uv")
        .ok_or_else(|| BootstrapError::missing_tool("uv"))?;
    let func = runner
        .locate("func")
        .ok_or_else(|| BootstrapError::missing_tool("func"))?;

    Ok(Tools { uv, func })
}

fn resolve_project_name(
    config: &BootstrapConfig,
    root_doc: &ManifestDocument,
) -> Result<String, BootstrapError> {
    config
        .project_name
        .clone()
        .or_else(|| root_doc.project_name())
        .or_else(|| {
            config
                .project_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .ok_or_else(|| BootstrapError::Precondition {
            what: "project name".to_string(),
            remedy: "Set `[project].name` in pyproject.toml or pass `--project-name`".to_string(),
        })
}

fn create_module(
    config: &BootstrapConfig,
    shell: &Shell,
    report: &mut BootstrapReport,
) -> Result<()> {
    let init = config
        .project_dir
        .join("src")
        .join(&config.module_name)
        .join("__init__.py");

    let contents = format!(
        "\"\"\"{}: code shared by the apps in this workspace.\"\"\"\n",
        config.module_name
    );
    if fs::write_if_absent(&init, &contents)? {
        shell.status(Status::Created, display_path(&config.project_dir, &init));
        report.created.push(init);
    } else {
        tracing::debug!("module {} already exists", init.display());
    }
    Ok(())
}

fn create_app(
    config: &BootstrapConfig,
    tools: &Tools,
    runner: &dyn ToolRunner,
    shell: &Shell,
    report: &mut BootstrapReport,
) -> Result<()> {
    let app_path = config.app_path();
    let app_manifest = app_path.join(MANIFEST_NAME);
    if app_manifest.exists() {
        tracing::debug!("app project {} already exists", app_manifest.display());
        return Ok(());
    }

    let init = ProcessBuilder::new(&tools.uv)
        .args(["init", "--app", "--no-workspace", "--vcs", "none", "--python"])
        .arg(&config.python_version)
        .arg(&config.app_dir)
        .cwd(&config.project_dir);
    run_tool(runner, shell, Status::Running, init, report)?;

    let add = ProcessBuilder::new(&tools.uv)
        .args(["add", "--project"])
        .arg(&config.app_dir)
        .args(["--no-sync", FUNCTIONS_PACKAGE])
        .cwd(&config.project_dir);
    run_tool(runner, shell, Status::Running, add, report)?;

    shell.status(Status::Created, display_path(&config.project_dir, &app_manifest));
    report.created.push(app_manifest);
    Ok(())
}

fn create_function(
    config: &BootstrapConfig,
    tools: &Tools,
    runner: &dyn ToolRunner,
    shell: &Shell,
    report: &mut BootstrapReport,
) -> Result<()> {
    let app_path = config.app_path();

    let host = app_path.join("host.json");
    if !host.exists() {
        let init = ProcessBuilder::new(&tools.func)
            .args(["init", "--worker-runtime", "python", "--model", "V2"])
            .cwd(&app_path);
        run_tool(runner, shell, Status::Running, init, report)?;
        shell.status(Status::Created, display_path(&config.project_dir, &host));
        report.created.push(host);
    }

    let function_app = app_path.join("function_app.py");
    let defined = function_app.exists()
        && fs::read_to_string(&function_app)?.contains(&config.function_name);
    if defined {
        tracing::debug!(
            "function `{}` already defined in {}",
            config.function_name,
            function_app.display()
        );
        return Ok(());
    }

    let new = ProcessBuilder::new(&tools.func)
        .args(["new", "--name"])
        .arg(&config.function_name)
        .args(["--template", "HTTP trigger", "--authlevel", "anonymous"])
        .cwd(&app_path);
    run_tool(runner, shell, Status::Running, new, report)?;
    shell.status(
        Status::Created,
        format!(
            "function `{}` in {}",
            config.function_name,
            display_path(&config.project_dir, &function_app)
        ),
    );
    report.created.push(function_app);
    Ok(())
}

/// Edits for the app manifest and the root manifest.
fn wiring_edits(config: &BootstrapConfig, project_name: &str) -> (Vec<ManifestEdit>, Vec<ManifestEdit>) {
    match config.link {
        LinkMode::Workspace => (
            vec![ManifestEdit::AddDependency(DependencyEntry::name(project_name))],
            vec![
                ManifestEdit::WorkspaceMember(config.member_path()),
                ManifestEdit::SourceBinding(project_name.to_string()),
            ],
        ),
        LinkMode::Path => {
            let rel = fs::relative_path(&config.app_path(), &config.project_dir);
            (
                vec![ManifestEdit::AddDependency(DependencyEntry::path(
                    project_name,
                    &rel,
                ))],
                Vec::new(),
            )
        }
    }
}

fn apply_edits(
    doc: &mut ManifestDocument,
    edits: &[ManifestEdit],
    shell: &Shell,
    report: &mut BootstrapReport,
) -> Result<(), BootstrapError> {
    for edit in edits {
        let outcome = doc
            .apply(edit)
            .map_err(|source| BootstrapError::ManifestStructure {
                path: doc.path().to_path_buf(),
                source,
            })?;

        let applied = outcome == EditOutcome::Applied;
        if applied {
            shell.status(Status::Added, edit);
        } else {
            shell.status(Status::Skipped, format!("{} (already present)", edit));
        }
        report.edits.push(EditRecord {
            manifest: doc.path().to_path_buf(),
            edit: edit.to_string(),
            applied,
        });
    }
    Ok(())
}

/// Run a tool and require a zero exit status.
fn run_tool(
    runner: &dyn ToolRunner,
    shell: &Shell,
    status: Status,
    process: ProcessBuilder,
    report: &mut BootstrapReport,
) -> Result<ToolOutput, BootstrapError> {
    let command = process.display_command();
    let spinner = shell.spinner(status, &command);
    let result = runner.run(&process);
    spinner.finish();

    let output = result.map_err(|e| BootstrapError::ExternalTool {
        command: command.clone(),
        status: None,
        stderr: format!("{:#}", e),
    })?;

    if !output.is_success() {
        return Err(BootstrapError::ExternalTool {
            command,
            status: output.status,
            stderr: output.stderr,
        });
    }

    tracing::debug!("`{}` succeeded", command);
    report.commands.push(command);
    Ok(output)
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeRunner, ProjectFixture};
    use crate::util::shell::{ColorChoice, Shell};

    fn quiet() -> Shell {
        Shell::from_flags(true, false, ColorChoice::Never, false)
    }

    #[test]
    fn test_fresh_bootstrap_runs_tools_in_order() {
        let project = ProjectFixture::root("shared-lib").create();
        let runner = FakeRunner::with_tools();
        let config = BootstrapConfig::new(project.path());

        let report = bootstrap(&config, &runner, &quiet()).unwrap();

        assert_eq!(
            runner.commands(),
            vec![
                "uv init --app --no-workspace --vcs none --python 3.11 apps/function_app",
                "uv add --project apps/function_app --no-sync azure-functions",
                "func init --worker-runtime python --model V2",
                "func new --name http_example --template \"HTTP trigger\" --authlevel anonymous",
                "uv sync",
            ]
        );
        assert_eq!(report.project_name, "shared-lib");
        assert!(project.path().join("src/shared/__init__.py").exists());

        let app = project.read("apps/function_app/pyproject.toml");
        assert!(app.contains("dependencies = [\n    \"shared-lib\",\n    \"azure-functions\",\n]"));

        let root = project.read("pyproject.toml");
        assert!(root.contains("[tool.uv.workspace]\nmembers = [\"apps/function_app\"]\n"));
        assert!(root.contains("[tool.uv.sources]\nshared-lib = { workspace = true }\n"));
    }

    #[test]
    fn test_second_run_is_noop() {
        let project = ProjectFixture::root("shared-lib").create();
        let config = BootstrapConfig::new(project.path());
        bootstrap(&config, &FakeRunner::with_tools(), &quiet()).unwrap();
        let root_before = project.read("pyproject.toml");
        let app_before = project.read("apps/function_app/pyproject.toml");

        let runner = FakeRunner::with_tools();
        let report = bootstrap(&config, &runner, &quiet()).unwrap();

        assert!(report.is_noop());
        assert!(report.edits.iter().all(|e| !e.applied));
        assert_eq!(runner.commands(), vec!["uv sync"]);
        assert_eq!(project.read("pyproject.toml"), root_before);
        assert_eq!(project.read("apps/function_app/pyproject.toml"), app_before);
    }

    #[test]
    fn test_path_link_mode() {
        let project = ProjectFixture::root("shared-lib").create();
        let mut config = BootstrapConfig::new(project.path());
        config.link = LinkMode::Path;
        config.sync = false;

        bootstrap(&config, &FakeRunner::with_tools(), &quiet()).unwrap();

        let app = project.read("apps/function_app/pyproject.toml");
        assert!(app.contains("\"shared-lib @ file://../..\","));
        let root = project.read("pyproject.toml");
        assert!(!root.contains("[tool.uv.workspace]"));
        assert!(!root.contains("[tool.uv.sources]"));
    }

    #[test]
    fn test_missing_manifest_is_precondition_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = BootstrapConfig::new(tmp.path());
        let runner = FakeRunner::with_tools();

        let err = bootstrap(&config, &runner, &quiet()).unwrap_err();
        let err = err.downcast::<BootstrapError>().unwrap();
        assert!(matches!(err, BootstrapError::Precondition { .. }));
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_missing_func_is_precondition_error() {
        let project = ProjectFixture::root("shared-lib").create();
        let config = BootstrapConfig::new(project.path());
        let runner = FakeRunner::new().install("uv");

        let err = bootstrap(&config, &runner, &quiet()).unwrap_err();
        assert!(err.to_string().contains("`func` executable not found"));
        assert!(!project.path().join("src/shared").exists());
    }

    #[test]
    fn test_tool_failure_stops_before_manifest_writes() {
        let project = ProjectFixture::root("shared-lib").create();
        let root_before = project.read("pyproject.toml");
        let config = BootstrapConfig::new(project.path());
        let runner = FakeRunner::with_tools()
            .fail("func new", ToolOutput::failure(1, "Can't find template \"HTTP trigger\""));

        let err = bootstrap(&config, &runner, &quiet()).unwrap_err();
        let err = err.downcast::<BootstrapError>().unwrap();
        match err {
            BootstrapError::ExternalTool { status, stderr, .. } => {
                assert_eq!(status, Some(1));
                assert_eq!(stderr, "Can't find template \"HTTP trigger\"");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(project.read("pyproject.toml"), root_before);
    }

    #[test]
    fn test_malformed_root_manifest_writes_nothing() {
        let project = ProjectFixture::root("shared-lib")
            .with_manifest_tail("\n[tool.uv.workspace]\nexclude = [\"old\"]\n")
            .create();
        let mut config = BootstrapConfig::new(project.path());
        config.sync = false;
        let runner = FakeRunner::with_tools();

        let err = bootstrap(&config, &runner, &quiet()).unwrap_err();
        let err = err.downcast::<BootstrapError>().unwrap();
        assert!(matches!(err, BootstrapError::ManifestStructure { .. }));

        // The app manifest edit was valid but must not be persisted alone.
        let app = project.read("apps/function_app/pyproject.toml");
        assert!(!app.contains("shared-lib"));
    }

    #[test]
    fn test_existing_function_skips_func_new() {
        let project = ProjectFixture::root("shared-lib").create();
        let mut config = BootstrapConfig::new(project.path());
        config.sync = false;
        project.write(
            "apps/function_app/pyproject.toml",
            "[project]\nname = \"function-app\"\ndependencies = [\"azure-functions\"]\n",
        );
        project.write("apps/function_app/host.json", "{}\n");
        project.write(
            "apps/function_app/function_app.py",
            "@app.route(route=\"http_example\")\ndef http_example(req): ...\n",
        );

        let runner = FakeRunner::with_tools();
        let report = bootstrap(&config, &runner, &quiet()).unwrap();

        assert!(runner.commands().is_empty());
        let app = project.read("apps/function_app/pyproject.toml");
        assert!(app.contains("dependencies = [\"shared-lib\", \"azure-functions\"]"));
        assert_eq!(report.written.len(), 2);
    }

    #[test]
    fn test_project_name_override() {
        let project = ProjectFixture::root("shared-lib").create();
        let mut config = BootstrapConfig::new(project.path());
        config.project_name = Some("core-utils".to_string());
        config.sync = false;

        let report = bootstrap(&config, &FakeRunner::with_tools(), &quiet()).unwrap();

        assert_eq!(report.project_name, "core-utils");
        assert!(project
            .read("pyproject.toml")
            .contains("core-utils = { workspace = true }"));
    }

    #[test]
    fn test_with_settings_overrides_defaults() {
        let settings = BootstrapSettings {
            module_name: Some("common".to_string()),
            app_dir: Some(PathBuf::from("functions/api")),
            sync: Some(false),
            ..BootstrapSettings::default()
        };
        let config = BootstrapConfig::new("/repo").with_settings(&settings);

        assert_eq!(config.module_name, "common");
        assert_eq!(config.member_path(), "functions/api");
        assert_eq!(config.function_name, DEFAULT_FUNCTION_NAME);
        assert!(!config.sync);
    }

    #[test]
    fn test_link_mode_parse() {
        assert_eq!("workspace".parse::<LinkMode>().unwrap(), LinkMode::Workspace);
        assert_eq!("Path".parse::<LinkMode>().unwrap(), LinkMode::Path);
        assert!("git".parse::<LinkMode>().is_err());
    }
}
