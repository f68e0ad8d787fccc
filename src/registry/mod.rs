//! Plugin command registry.
//!
//! Commands live in `~/.kapeta/kap/commands/<name>/`, one package per
//! directory. The user registry (`~/.kapeta/kap/commands.json`) records the
//! package reference each command was installed from.
//!
//! # Provisioning
//!
//! On first run the command set comes from the first usable source:
//! 1. The user registry
//! 2. `ci-commands.json` in CI, otherwise `default-commands.json`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kap::paths::Paths;
//! use kap::registry::{CommandRegistry, NpmInstaller};
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let paths = Paths::new(temp.path().join("home"), temp.path().join("install"));
//! let registry = CommandRegistry::open(paths, Arc::new(NpmInstaller::default())).unwrap();
//!
//! assert!(registry.list().unwrap().is_empty());
//! ```

pub mod installer;
pub mod manifest;
pub mod name;
pub mod source;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use installer::{remove_slot, CommandInstaller, NpmInstaller, UpgradeStrategy};
pub use manifest::{InstalledCommandInfo, PackageManifest};
pub use name::{validate_link_name, validate_slot_name};
pub use source::{CommandMap, RegistrySource};
pub use store::{CommandRegistry, EnsureOutcome, LinkOutcome, UpgradeOutcome};
