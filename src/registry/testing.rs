//! Installer double shared by registry and command tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::json;

use super::installer::{
    package_name_from_reference, remove_slot, CommandInstaller, UpgradeStrategy,
};
use super::manifest::MANIFEST_FILE;
use crate::error::{KapError, Result};

/// Installer that writes a small package instead of calling npm.
///
/// References containing `broken` fail like an unknown package would.
#[derive(Default)]
pub struct FakeInstaller {
    installs: Mutex<Vec<String>>,
    removes: Mutex<Vec<PathBuf>>,
    upgrades: Mutex<Vec<String>>,
    strategy: UpgradeStrategy,
}

impl FakeInstaller {
    /// An installer that upgrades commands in place.
    pub fn in_place() -> Self {
        Self {
            strategy: UpgradeStrategy::InPlace,
            ..Self::default()
        }
    }

    pub fn installs(&self) -> Vec<String> {
        self.installs.lock().unwrap().clone()
    }

    pub fn removes(&self) -> Vec<PathBuf> {
        self.removes.lock().unwrap().clone()
    }

    /// Packages upgraded in place.
    pub fn upgrades(&self) -> Vec<String> {
        self.upgrades.lock().unwrap().clone()
    }
}

fn write_package(target: &Path, name: &str, version: &str, reference: &str) -> Result<()> {
    fs::create_dir_all(target)?;
    let manifest = json!({
        "name": name,
        "version": version,
        "description": format!("Installed from {}", reference),
    });
    fs::write(target.join(MANIFEST_FILE), manifest.to_string())?;
    fs::write(target.join("index.js"), "")?;
    Ok(())
}

impl CommandInstaller for FakeInstaller {
    fn install(&self, reference: &str, target: &Path) -> Result<()> {
        if reference.contains("broken") {
            return Err(KapError::Installer {
                package: reference.to_string(),
                message: "404 Not Found".to_string(),
            });
        }
        self.installs.lock().unwrap().push(reference.to_string());
        write_package(
            target,
            &package_name_from_reference(reference),
            "1.2.3",
            reference,
        )
    }

    fn remove(&self, target: &Path) -> Result<()> {
        self.removes.lock().unwrap().push(target.to_path_buf());
        remove_slot(target)?;
        Ok(())
    }

    fn upgrade_strategy(&self) -> UpgradeStrategy {
        self.strategy
    }

    fn upgrade(&self, package: &str, target: &Path) -> Result<()> {
        self.upgrades.lock().unwrap().push(package.to_string());
        write_package(target, package, "2.0.0", package)
    }
}
