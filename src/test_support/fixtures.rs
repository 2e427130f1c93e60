//! Test fixtures for common test scenarios.
//!
//! Manifest text in the shape `uv init` produces, and a temporary project
//! directory to run the bootstrap in.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Root manifest of a freshly initialised uv library.
pub fn root_manifest(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"
version = "0.1.0"
description = "Add your description here"
readme = "README.md"
requires-python = ">=3.11"
dependencies = []

[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"
"#
    )
}

/// Manifest written by `uv init --app`.
pub fn app_manifest(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"
version = "0.1.0"
description = "Add your description here"
readme = "README.md"
requires-python = ">=3.11"
dependencies = []
"#
    )
}

/// Fixture for a project directory.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Project name.
    pub name: String,
    /// pyproject.toml content.
    pub manifest: String,
    /// Extra files (path relative to project root -> content).
    pub files: Vec<(PathBuf, String)>,
}

impl ProjectFixture {
    /// A uv library project with the given name.
    pub fn root(name: impl Into<String>) -> Self {
        let name = name.into();
        ProjectFixture {
            manifest: root_manifest(&name),
            name,
            files: Vec::new(),
        }
    }

    /// Append raw text to the manifest.
    pub fn with_manifest_tail(mut self, tail: &str) -> Self {
        self.manifest.push_str(tail);
        self
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Write the fixture to a directory.
    pub fn write_to(&self, project_path: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(project_path)?;
        std::fs::write(project_path.join("pyproject.toml"), &self.manifest)?;

        for (rel_path, content) in &self.files {
            let full_path = project_path.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }
        Ok(())
    }

    /// Write the fixture into a fresh temporary directory named after the project.
    pub fn create(&self) -> TempProject {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().join(&self.name);
        self.write_to(&root).expect("write project fixture");
        TempProject { _tmp: tmp, root }
    }
}

/// A project on disk, removed when dropped.
#[derive(Debug)]
pub struct TempProject {
    _tmp: TempDir,
    root: PathBuf,
}

impl TempProject {
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Read a file relative to the project root.
    pub fn read(&self, rel: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.root.join(rel)).expect("read project file")
    }

    /// Write a file relative to the project root, creating parents.
    pub fn write(&self, rel: impl AsRef<Path>, contents: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(path, contents).expect("write project file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_fixture_create() {
        let project = ProjectFixture::root("shared-lib")
            .with_file("README.md", "# shared-lib\n")
            .create();

        assert!(project.path().ends_with("shared-lib"));
        assert!(project.read("pyproject.toml").contains("name = \"shared-lib\""));
        assert_eq!(project.read("README.md"), "# shared-lib\n");
    }
}
