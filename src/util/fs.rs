//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
///
/// Returns `true` when the directory had to be created.
pub fn ensure_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    Ok(true)
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Write a file only if nothing exists at `path` yet.
///
/// Returns `true` when the file was written.
pub fn write_if_absent(path: &Path, contents: &str) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    write_string(path, contents)?;
    Ok(true)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_if_absent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("src/shared/__init__.py");

        assert!(write_if_absent(&path, "first").unwrap());
        assert!(!write_if_absent(&path, "second").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_ensure_dir_reports_creation() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("apps").join("x");

        assert!(ensure_dir(&dir).unwrap());
        assert!(!ensure_dir(&dir).unwrap());
    }

    #[test]
    fn test_relative_path() {
        let rel = relative_path(Path::new("/repo/apps/app"), Path::new("/repo"));
        assert_eq!(rel, PathBuf::from("../.."));
    }
}
