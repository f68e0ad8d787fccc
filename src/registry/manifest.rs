//! Installed package manifests.
//!
//! Each installed command directory carries a `package.json`. Only the
//! fields kap cares about are decoded; everything else is ignored.

use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{KapError, Result};

/// Manifest file name inside a command directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Entry point used when the manifest declares none.
pub const DEFAULT_ENTRY_POINT: &str = "index.js";

const DEFAULT_DESCRIPTION: &str = "No description";

/// Decoded `package.json` of an installed command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    /// Package name as known to the package manager.
    #[serde(default)]
    pub name: Option<String>,

    /// Package version.
    #[serde(default)]
    pub version: Option<String>,

    /// Command name the package wants to be invoked as.
    #[serde(default)]
    pub command: Option<String>,

    /// One-line description shown in help.
    #[serde(default)]
    pub description: Option<String>,

    /// Explicit entry point, relative to the package directory.
    #[serde(default)]
    pub executable: Option<String>,

    /// Generic package entry point, used when `executable` is absent.
    #[serde(default)]
    pub main: Option<String>,
}

impl PackageManifest {
    /// Load and validate the manifest in `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path).map_err(|e| {
            KapError::not_found(format!("package manifest {} ({})", path.display(), e))
        })?;

        let manifest: Self =
            serde_json::from_str(&content).map_err(|e| KapError::ManifestParse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        manifest.validate(&path)?;
        Ok(manifest)
    }

    /// Declared entry point with defaults applied.
    pub fn entry_point(&self) -> &str {
        declared(&self.executable)
            .or_else(|| declared(&self.main))
            .unwrap_or(DEFAULT_ENTRY_POINT)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let entry = Path::new(self.entry_point());
        let escapes = entry.is_absolute()
            || entry
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));

        if escapes {
            return Err(KapError::ManifestParse {
                path: path.to_path_buf(),
                message: format!(
                    "entry point '{}' must stay inside the package directory",
                    entry.display()
                ),
            });
        }

        Ok(())
    }
}

/// Read-only view of an installed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledCommandInfo {
    /// Name the command is invoked as.
    pub command: String,

    /// Description shown in help listings.
    pub description: String,

    /// Absolute path of the entry point.
    pub executable_path: PathBuf,

    /// Package name from the manifest.
    pub package_name: Option<String>,

    /// Package version from the manifest.
    pub version: Option<String>,

    /// Whether the slot is a link to a local working directory.
    pub linked: bool,
}

impl InstalledCommandInfo {
    /// Combine a slot and its manifest, applying defaults.
    pub fn from_manifest(
        slot_name: &str,
        slot: &Path,
        manifest: PackageManifest,
        linked: bool,
    ) -> Self {
        let executable_path = slot.join(manifest.entry_point());

        Self {
            command: manifest
                .command
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| slot_name.to_string()),
            description: manifest
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            executable_path,
            package_name: manifest.name,
            version: manifest.version,
            linked,
        }
    }
}

/// A manifest field, unless it is blank.
fn declared(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), json).unwrap();
    }

    #[test]
    fn parses_known_fields_and_ignores_the_rest() {
        let temp = TempDir::new().unwrap();
        write_manifest(
            temp.path(),
            r#"{
                "name": "@kapeta/kap-hello",
                "version": "1.2.3",
                "command": "hello",
                "description": "Say hello",
                "executable": "bin/hello.js",
                "dependencies": { "left-pad": "^1.0.0" }
            }"#,
        );

        let manifest = PackageManifest::load(temp.path()).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("@kapeta/kap-hello"));
        assert_eq!(manifest.command.as_deref(), Some("hello"));
        assert_eq!(manifest.entry_point(), "bin/hello.js");
    }

    #[test]
    fn entry_point_falls_back_to_main_then_index() {
        let with_main = PackageManifest {
            main: Some("lib/cli.js".into()),
            ..Default::default()
        };
        assert_eq!(with_main.entry_point(), "lib/cli.js");

        let bare = PackageManifest::default();
        assert_eq!(bare.entry_point(), DEFAULT_ENTRY_POINT);
    }

    #[test]
    fn blank_executable_falls_through_to_main() {
        let manifest = PackageManifest {
            executable: Some(String::new()),
            main: Some("cli.js".into()),
            ..Default::default()
        };
        assert_eq!(manifest.entry_point(), "cli.js");

        let blank = PackageManifest {
            executable: Some("  ".into()),
            main: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(blank.entry_point(), DEFAULT_ENTRY_POINT);
    }

    #[test]
    fn missing_manifest_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = PackageManifest::load(temp.path()).unwrap_err();
        assert!(matches!(err, KapError::NotFound { .. }));
    }

    #[test]
    fn malformed_manifest_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), "{ \"name\": ");
        let err = PackageManifest::load(temp.path()).unwrap_err();
        assert!(matches!(err, KapError::ManifestParse { .. }));
    }

    #[test]
    fn entry_point_may_not_escape_package() {
        let temp = TempDir::new().unwrap();
        write_manifest(temp.path(), r#"{ "executable": "../../bin/sh" }"#);
        let err = PackageManifest::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("inside the package directory"));
    }

    #[test]
    fn info_applies_defaults() {
        let slot = Path::new("/cmds/hello");
        let info =
            InstalledCommandInfo::from_manifest("hello", slot, PackageManifest::default(), false);

        assert_eq!(info.command, "hello");
        assert_eq!(info.description, "No description");
        assert_eq!(info.executable_path, PathBuf::from("/cmds/hello/index.js"));
        assert!(!info.linked);
    }

    #[test]
    fn info_prefers_declared_values() {
        let manifest = PackageManifest {
            command: Some("hi".into()),
            description: Some("Greets".into()),
            executable: Some("cli.js".into()),
            ..Default::default()
        };
        let info = InstalledCommandInfo::from_manifest("hello", Path::new("/c/hello"), manifest, true);

        assert_eq!(info.command, "hi");
        assert_eq!(info.description, "Greets");
        assert_eq!(info.executable_path, PathBuf::from("/c/hello/cli.js"));
        assert!(info.linked);
    }
}
