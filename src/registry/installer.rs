//! Package installers.
//!
//! The registry never talks to a package manager directly. It hands a
//! package reference and a target directory to a [`CommandInstaller`],
//! which is responsible for leaving a complete package tree at the target.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use crate::error::{KapError, Result};

/// How an installer upgrades an existing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpgradeStrategy {
    /// Remove the command directory, then install the latest version.
    #[default]
    Reinstall,
    /// Ask the installer to upgrade the directory in place.
    InPlace,
}

/// Materializes packages into command directories.
pub trait CommandInstaller: Send + Sync {
    /// Install `reference` so that its package root is `target`.
    ///
    /// `target` does not exist when this is called.
    fn install(&self, reference: &str, target: &Path) -> Result<()>;

    /// Remove an installed command directory.
    fn remove(&self, target: &Path) -> Result<()> {
        remove_slot(target)?;
        Ok(())
    }

    /// Strategy used by the registry when upgrading.
    fn upgrade_strategy(&self) -> UpgradeStrategy {
        UpgradeStrategy::Reinstall
    }

    /// Upgrade `target` in place. Only called for [`UpgradeStrategy::InPlace`].
    fn upgrade(&self, package: &str, _target: &Path) -> Result<()> {
        Err(KapError::Installer {
            package: package.to_string(),
            message: "in-place upgrade is not supported by this installer".to_string(),
        })
    }
}

/// Remove a command slot without following symlinks.
///
/// A linked slot only loses the link; the linked working directory is
/// left untouched. A missing slot is not an error.
pub fn remove_slot(target: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.file_type().is_symlink() {
        remove_link(target)
    } else if meta.is_dir() {
        fs::remove_dir_all(target)
    } else {
        fs::remove_file(target)
    }
}

#[cfg(windows)]
fn remove_link(target: &Path) -> io::Result<()> {
    // Directory symlinks are removed like directories on Windows
    fs::remove_dir(target).or_else(|_| fs::remove_file(target))
}

#[cfg(not(windows))]
fn remove_link(target: &Path) -> io::Result<()> {
    fs::remove_file(target)
}

/// Installs commands from the npm registry.
///
/// Each install runs `npm install` into a private staging prefix next to
/// the commands directory, then moves the package into place so the
/// target never holds a half-installed tree.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    program: String,
}

impl NpmInstaller {
    /// Create an installer that runs the given package manager executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run_install(&self, reference: &str, prefix: &Path) -> Result<()> {
        tracing::debug!(
            "Running {} install {} --prefix {}",
            self.program,
            reference,
            prefix.display()
        );

        let output = Command::new(&self.program)
            .arg("install")
            .arg(reference)
            .arg("--prefix")
            .arg(prefix)
            .args(["--no-audit", "--no-fund", "--loglevel=error"])
            .output()
            .map_err(|e| KapError::Installer {
                package: reference.to_string(),
                message: format!("could not run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("{} exited with {}", self.program, output.status),
                text => text.to_string(),
            };
            return Err(KapError::Installer {
                package: reference.to_string(),
                message,
            });
        }

        Ok(())
    }
}

impl Default for NpmInstaller {
    fn default() -> Self {
        Self::new(if cfg!(windows) { "npm.cmd" } else { "npm" })
    }
}

impl CommandInstaller for NpmInstaller {
    fn install(&self, reference: &str, target: &Path) -> Result<()> {
        let parent = target.parent().ok_or_else(|| {
            KapError::Other(anyhow::anyhow!(
                "Command directory has no parent: {}",
                target.display()
            ))
        })?;
        fs::create_dir_all(parent)?;

        // Stage next to the target so the final rename stays on one filesystem
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(parent)?;

        self.run_install(reference, staging.path())?;

        let package_name = installed_package_name(staging.path())?
            .unwrap_or_else(|| package_name_from_reference(reference));
        let modules = staging.path().join("node_modules");
        let package_dir = modules.join(&package_name);

        if !package_dir.is_dir() {
            return Err(KapError::Installer {
                package: reference.to_string(),
                message: format!("package '{}' missing after install", package_name),
            });
        }

        fs::rename(&package_dir, target)?;

        let target_modules = target.join("node_modules");
        if modules.is_dir() && !target_modules.exists() {
            fs::rename(&modules, &target_modules)?;
        }

        tracing::info!("Installed {} into {}", package_name, target.display());
        Ok(())
    }

    fn upgrade_strategy(&self) -> UpgradeStrategy {
        UpgradeStrategy::InPlace
    }

    /// Install the latest release beside `target`, then swap it in.
    ///
    /// The old tree is only moved out once the new one is complete, and is
    /// put back if the swap fails.
    fn upgrade(&self, package: &str, target: &Path) -> Result<()> {
        let parent = target.parent().ok_or_else(|| {
            KapError::Other(anyhow::anyhow!(
                "Command directory has no parent: {}",
                target.display()
            ))
        })?;

        let work = tempfile::Builder::new()
            .prefix(".upgrade-")
            .tempdir_in(parent)?;
        let fresh = work.path().join("package");
        self.install(&format!("{}@latest", package), &fresh)?;

        let previous = work.path().join("previous");
        fs::rename(target, &previous)?;
        if let Err(e) = fs::rename(&fresh, target) {
            fs::rename(&previous, target)?;
            return Err(e.into());
        }

        tracing::info!("Upgraded {} in {}", package, target.display());
        Ok(())
    }
}

#[derive(Deserialize)]
struct StagingManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

/// Name of the package npm recorded in the staging prefix.
fn installed_package_name(prefix: &Path) -> Result<Option<String>> {
    let path = prefix.join("package.json");
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let manifest: StagingManifest =
        serde_json::from_str(&content).map_err(|e| KapError::ManifestParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

    Ok(manifest.dependencies.into_keys().next())
}

/// Strip a version or tag suffix from a package reference.
pub(crate) fn package_name_from_reference(reference: &str) -> String {
    match reference.strip_prefix('@') {
        Some(scoped) => match scoped.find('@') {
            Some(at) => reference[..at + 1].to_string(),
            None => reference.to_string(),
        },
        None => reference
            .split('@')
            .next()
            .unwrap_or(reference)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reference_names_strip_versions() {
        assert_eq!(
            package_name_from_reference("@kapeta/kap-deploy@1.2.0"),
            "@kapeta/kap-deploy"
        );
        assert_eq!(
            package_name_from_reference("@kapeta/kap-deploy"),
            "@kapeta/kap-deploy"
        );
        assert_eq!(package_name_from_reference("left-pad@^1"), "left-pad");
        assert_eq!(package_name_from_reference("left-pad"), "left-pad");
    }

    #[test]
    fn staging_manifest_names_the_package() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{ "dependencies": { "@kapeta/kap-hello": "^1.0.0" } }"#,
        )
        .unwrap();

        let name = installed_package_name(temp.path()).unwrap();
        assert_eq!(name.as_deref(), Some("@kapeta/kap-hello"));
    }

    #[test]
    fn staging_without_manifest_has_no_name() {
        let temp = TempDir::new().unwrap();
        assert!(installed_package_name(temp.path()).unwrap().is_none());
    }

    #[test]
    fn remove_slot_deletes_directories() {
        let temp = TempDir::new().unwrap();
        let slot = temp.path().join("hello");
        fs::create_dir_all(slot.join("lib")).unwrap();
        fs::write(slot.join("lib").join("x.js"), "").unwrap();

        remove_slot(&slot).unwrap();
        assert!(!slot.exists());
    }

    #[test]
    fn remove_slot_ignores_missing() {
        let temp = TempDir::new().unwrap();
        remove_slot(&temp.path().join("nothing")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn remove_slot_only_unlinks_symlinks() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("package.json"), "{}").unwrap();
        let slot = temp.path().join("slot");
        std::os::unix::fs::symlink(&work, &slot).unwrap();

        remove_slot(&slot).unwrap();

        assert!(fs::symlink_metadata(&slot).is_err());
        assert!(work.join("package.json").exists());
    }

    #[test]
    fn failing_package_manager_is_an_installer_error() {
        let temp = TempDir::new().unwrap();
        let installer = NpmInstaller::new("kap-test-no-such-package-manager");

        let err = installer
            .install("left-pad", &temp.path().join("commands").join("pad"))
            .unwrap_err();

        assert!(matches!(err, KapError::Installer { .. }));
        assert!(!temp.path().join("commands").join("pad").exists());
    }

    #[test]
    fn npm_upgrades_in_place() {
        assert_eq!(
            NpmInstaller::default().upgrade_strategy(),
            UpgradeStrategy::InPlace
        );
    }

    /// A package manager that "installs" `pkg-hello` at `version`, or fails
    /// when `version` is empty.
    #[cfg(unix)]
    fn fake_npm(dir: &Path, version: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = if version.is_empty() {
            "#!/bin/sh\necho 'E404 not found' >&2\nexit 1\n".to_string()
        } else {
            format!(
                "#!/bin/sh\nmkdir -p \"$4/node_modules/pkg-hello\"\n\
                 printf '{{\"name\":\"pkg-hello\",\"version\":\"{}\"}}' \
                 > \"$4/node_modules/pkg-hello/package.json\"\n",
                version
            )
        };
        let path = dir.join(format!("npm-{}", if version.is_empty() { "fail" } else { version }));
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    fn installed_version(target: &Path) -> String {
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(target.join("package.json")).unwrap())
                .unwrap();
        manifest["version"].as_str().unwrap_or_default().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn upgrade_swaps_in_the_latest_release() {
        let temp = TempDir::new().unwrap();
        let commands = temp.path().join("commands");
        let target = commands.join("hello");

        NpmInstaller::new(fake_npm(temp.path(), "1.0.0"))
            .install("pkg-hello", &target)
            .unwrap();
        assert_eq!(installed_version(&target), "1.0.0");

        NpmInstaller::new(fake_npm(temp.path(), "2.0.0"))
            .upgrade("pkg-hello", &target)
            .unwrap();

        assert_eq!(installed_version(&target), "2.0.0");
        let leftovers: Vec<_> = fs::read_dir(&commands)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("hello")]);
    }

    #[cfg(unix)]
    #[test]
    fn failed_upgrade_keeps_the_installed_release() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("commands").join("hello");
        NpmInstaller::new(fake_npm(temp.path(), "1.0.0"))
            .install("pkg-hello", &target)
            .unwrap();

        let err = NpmInstaller::new(fake_npm(temp.path(), ""))
            .upgrade("pkg-hello", &target)
            .unwrap_err();

        assert!(err.to_string().contains("E404"));
        assert_eq!(installed_version(&target), "1.0.0");
    }
}
