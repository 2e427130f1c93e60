//! Dependency entries as they appear in a `dependencies = [...]` list.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A dependency specifier string.
///
/// Either a bare package name (`shared-lib`) or a name with a direct
/// reference (`shared-lib @ file://../..`, `shared-lib @ git+https://...@v1`).
/// The text is kept exactly as given, so `pkg@url` and `pkg @ url` are
/// different entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DependencyEntry {
    text: String,
    name: String,
    location: Option<String>,
}

impl DependencyEntry {
    /// A bare-name dependency.
    pub fn name(name: impl Into<String>) -> Self {
        let name = name.into();
        DependencyEntry {
            text: name.clone(),
            name,
            location: None,
        }
    }

    /// A direct reference to a local directory, rendered as a `file://` location.
    ///
    /// The path is written with forward slashes so the manifest stays portable.
    pub fn path(name: impl Into<String>, path: &Path) -> Self {
        let rendered = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let rendered = if rendered.is_empty() {
            ".".to_string()
        } else {
            rendered
        };

        let name = name.into();
        let location = format!("file://{}", rendered);
        DependencyEntry {
            text: format!("{} @ {}", name, location),
            name,
            location: Some(location),
        }
    }

    /// The package name, without any location.
    pub fn package_name(&self) -> &str {
        &self.name
    }

    /// The direct-reference location, if any.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl fmt::Display for DependencyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for DependencyEntry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("dependency entry cannot be empty");
        }
        if s.contains('"') || s.contains('\'') {
            bail!("dependency entry `{}` must not contain quotes", s);
        }

        match s.split_once('@') {
            Some((name, location)) => {
                let name = name.trim();
                let location = location.trim();
                if name.is_empty() {
                    bail!("dependency entry `{}` is missing a package name", s);
                }
                if location.is_empty() {
                    bail!("dependency entry `{}` is missing a location after `@`", s);
                }
                Ok(DependencyEntry {
                    text: s.to_string(),
                    name: name.to_string(),
                    location: Some(location.to_string()),
                })
            }
            None => Ok(DependencyEntry::name(s)),
        }
    }
}

impl From<DependencyEntry> for String {
    fn from(entry: DependencyEntry) -> String {
        entry.to_string()
    }
}

impl TryFrom<String> for DependencyEntry {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}
