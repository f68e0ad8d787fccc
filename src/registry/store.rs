//! The command registry.
//!
//! Tracks which plugin commands are installed, where they came from, and
//! keeps the user registry file in sync with the commands directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{KapError, Result};
use crate::paths::{self, Paths};

use super::installer::{remove_slot, CommandInstaller, UpgradeStrategy};
use super::manifest::{InstalledCommandInfo, PackageManifest, MANIFEST_FILE};
use super::name::{validate_link_name, validate_slot_name};
use super::source::{read_command_map, write_command_map, CommandMap, RegistrySource};

/// Result of ensuring a single command during default provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The command directory was already present.
    AlreadyInstalled,
    /// The command was installed now.
    Installed,
}

/// Result of upgrading a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The command was upgraded from the named package.
    Upgraded { package: String },
    /// The command is a link to a working directory and was left alone.
    Linked,
}

/// Result of linking a working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Name the directory is linked as.
    pub name: String,
    /// Canonical path of the linked directory.
    pub target: PathBuf,
}

/// Installed plugin commands and their package references.
pub struct CommandRegistry {
    paths: Paths,
    installer: Arc<dyn CommandInstaller>,
    ci: bool,
    commands: CommandMap,
}

impl CommandRegistry {
    /// Open the registry, loading the user registry file if present.
    pub fn open(paths: Paths, installer: Arc<dyn CommandInstaller>) -> Result<Self> {
        let user_registry = paths.user_registry();
        let commands = if user_registry.is_file() {
            read_command_map(&user_registry)?
        } else {
            CommandMap::new()
        };

        Ok(Self {
            paths,
            installer,
            ci: paths::is_ci(),
            commands,
        })
    }

    /// Override CI detection, which selects the CI seed manifest.
    pub fn with_ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    /// Recorded command references.
    pub fn commands(&self) -> &CommandMap {
        &self.commands
    }

    /// Seed sources in priority order.
    pub fn sources(&self) -> RegistrySource {
        RegistrySource::for_paths(&self.paths, self.ci)
    }

    /// Whether the user registry file exists yet.
    pub fn is_initialized(&self) -> bool {
        self.paths.user_registry().is_file()
    }

    /// Whether a command directory exists for `name`.
    pub fn exists(&self, name: &str) -> bool {
        validate_slot_name(name).is_ok() && self.paths.command_dir(name).exists()
    }

    /// Install the command set from the first usable source.
    ///
    /// The winning source replaces the recorded references; nothing is
    /// merged. Each command is installed only if missing, and the user
    /// registry is rewritten afterwards.
    pub fn ensure_defaults(&mut self) -> Result<Vec<(String, EnsureOutcome)>> {
        if let Some((path, commands)) = self.sources().load_first()? {
            tracing::debug!("Using command set from {}", path.display());
            self.commands = commands;
        }

        let entries: Vec<(String, String)> = self
            .commands
            .iter()
            .map(|(name, reference)| (name.clone(), reference.clone()))
            .collect();

        let mut outcomes = Vec::with_capacity(entries.len());
        for (name, reference) in entries {
            let outcome = self.ensure(&name, &reference, true)?;
            outcomes.push((name, outcome));
        }

        self.persist()?;
        Ok(outcomes)
    }

    /// Install `reference` as `name` unless it is already present.
    pub fn ensure(&mut self, name: &str, reference: &str, silent: bool) -> Result<EnsureOutcome> {
        if self.exists(name) {
            if !silent {
                tracing::info!("Command {} is already installed", name);
            }
            return Ok(EnsureOutcome::AlreadyInstalled);
        }

        self.install(name, reference)?;
        Ok(EnsureOutcome::Installed)
    }

    /// Install `reference` as `name`.
    pub fn install(&mut self, name: &str, reference: &str) -> Result<()> {
        validate_slot_name(name)?;
        if self.exists(name) {
            return Err(KapError::AlreadyExists {
                name: name.to_string(),
            });
        }

        let target = self.paths.command_dir(name);
        fs::create_dir_all(self.paths.commands_dir())?;
        // A dangling link would block the installer's rename
        remove_slot(&target)?;

        tracing::info!("Installing {} as {}", reference, name);
        self.installer.install(reference, &target)?;

        self.commands.insert(name.to_string(), reference.to_string());
        self.persist()
    }

    /// Remove the command `name`.
    ///
    /// Returns `false` without touching anything when it is not installed.
    pub fn uninstall(&mut self, name: &str) -> Result<bool> {
        validate_slot_name(name)?;
        if !self.exists(name) {
            return Ok(false);
        }

        let target = self.paths.command_dir(name);
        tracing::info!("Removing command {}", name);
        self.installer.remove(&target)?;

        self.commands.remove(name);
        self.persist()?;
        Ok(true)
    }

    /// Upgrade the command `name` to the latest version of its package.
    pub fn upgrade(&mut self, name: &str) -> Result<UpgradeOutcome> {
        if !self.exists(name) {
            return Err(KapError::not_found(format!("command '{}'", name)));
        }

        let target = self.paths.command_dir(name);
        if is_link(&target) {
            tracing::debug!("Skipping upgrade of linked command {}", name);
            return Ok(UpgradeOutcome::Linked);
        }

        let manifest = PackageManifest::load(&target)?;
        let package = manifest
            .name
            .or_else(|| self.commands.get(name).cloned())
            .ok_or_else(|| KapError::not_found(format!("package name for '{}'", name)))?;

        match self.installer.upgrade_strategy() {
            UpgradeStrategy::Reinstall => {
                self.installer.remove(&target)?;
                self.installer.install(&package, &target)?;
            }
            UpgradeStrategy::InPlace => self.installer.upgrade(&package, &target)?,
        }

        if !self.commands.contains_key(name) {
            self.commands.insert(name.to_string(), package.clone());
            self.persist()?;
        }

        Ok(UpgradeOutcome::Upgraded { package })
    }

    /// Upgrade every installed command.
    pub fn upgrade_all(&mut self) -> Result<Vec<(String, UpgradeOutcome)>> {
        let mut outcomes = Vec::new();
        for name in self.list()? {
            let outcome = self.upgrade(&name)?;
            outcomes.push((name, outcome));
        }
        Ok(outcomes)
    }

    /// Link a local package directory as a command.
    ///
    /// Without an explicit name the manifest's `command` field is used.
    pub fn link(&mut self, dir: &Path, name: Option<&str>) -> Result<LinkOutcome> {
        let dir = fs::canonicalize(dir)
            .map_err(|_| KapError::not_found(format!("directory {}", dir.display())))?;
        let manifest = PackageManifest::load(&dir)?;

        let name = match name {
            Some(name) => name.to_string(),
            None => manifest
                .command
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| KapError::MissingCommandName {
                    path: dir.join(MANIFEST_FILE),
                })?,
        };
        validate_link_name(&name)?;

        let slot = self.paths.command_dir(&name);
        if let Ok(existing) = fs::read_link(&slot) {
            if existing == dir {
                tracing::debug!("{} is already linked to {}", name, dir.display());
                return self.record_link(name, dir);
            }
            if !slot.exists() {
                // Stale link to a directory that no longer exists
                remove_slot(&slot)?;
            }
        }

        if fs::symlink_metadata(&slot).is_ok() {
            return Err(KapError::AlreadyExists { name });
        }

        fs::create_dir_all(self.paths.commands_dir())?;
        symlink_dir(&dir, &slot)?;
        tracing::info!("Linked {} to {}", name, dir.display());

        self.record_link(name, dir)
    }

    fn record_link(&mut self, name: String, dir: PathBuf) -> Result<LinkOutcome> {
        self.commands
            .insert(name.clone(), format!("file:{}", dir.display()));
        self.persist()?;
        Ok(LinkOutcome { name, target: dir })
    }

    /// Names of installed commands, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.paths.commands_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names)
    }

    /// Describe the installed command `name`.
    pub fn describe(&self, name: &str) -> Result<InstalledCommandInfo> {
        validate_slot_name(name)?;
        let slot = self.paths.command_dir(name);
        let manifest = PackageManifest::load(&slot)?;
        Ok(InstalledCommandInfo::from_manifest(
            name,
            &slot,
            manifest,
            is_link(&slot),
        ))
    }

    fn persist(&self) -> Result<()> {
        write_command_map(&self.paths.user_registry(), &self.commands)
    }
}

fn is_link(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(unix)]
fn symlink_dir(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink_dir(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(original, link)
}
