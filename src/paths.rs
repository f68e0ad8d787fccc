//! Well-known filesystem locations.
//!
//! Everything kap reads or writes lives under two roots:
//!
//! - the **user base directory** (`~/.kapeta`, or `$KAP_HOME`), holding the
//!   session file and the tool directory with installed commands and the
//!   user registry
//! - the **install root** (one level above the running binary's directory),
//!   holding the bundled default/CI manifests and local override commands

use std::path::{Path, PathBuf};

use crate::error::{KapError, Result};

/// Environment variable overriding the user base directory.
pub const HOME_ENV: &str = "KAP_HOME";

const BASE_DIR_NAME: &str = ".kapeta";
const TOOL_DIR_NAME: &str = "kap";

/// Resolved filesystem layout for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base_dir: PathBuf,
    install_root: PathBuf,
}

impl Paths {
    /// Create a layout from explicit roots.
    pub fn new(base_dir: impl Into<PathBuf>, install_root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            install_root: install_root.into(),
        }
    }

    /// Discover the layout for the current user and running binary.
    pub fn discover() -> Result<Self> {
        let base_dir = match std::env::var_os(HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .map(|h| h.join(BASE_DIR_NAME))
                .ok_or_else(|| KapError::not_found("home directory"))?,
        };

        let exe = current_executable()?;
        let install_root = install_root_for(&exe);

        Ok(Self::new(base_dir, install_root))
    }

    /// User base directory (`~/.kapeta`).
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Tool directory (`~/.kapeta/kap`).
    pub fn tool_dir(&self) -> PathBuf {
        self.base_dir.join(TOOL_DIR_NAME)
    }

    /// Directory holding one subdirectory per installed command.
    pub fn commands_dir(&self) -> PathBuf {
        self.tool_dir().join("commands")
    }

    /// Slot for a single installed command.
    pub fn command_dir(&self, name: &str) -> PathBuf {
        self.commands_dir().join(name)
    }

    /// The user's editable registry file.
    pub fn user_registry(&self) -> PathBuf {
        self.tool_dir().join("commands.json")
    }

    /// Settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.tool_dir().join("config.yml")
    }

    /// Persisted session/token file.
    pub fn token_file(&self) -> PathBuf {
        self.base_dir.join("authentication.json")
    }

    /// Directory one level above the running binary's directory.
    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Bundled default command manifest.
    pub fn default_manifest(&self) -> PathBuf {
        self.install_root.join("default-commands.json")
    }

    /// Bundled manifest used instead of the default one in CI.
    pub fn ci_manifest(&self) -> PathBuf {
        self.install_root.join("ci-commands.json")
    }

    /// Local override commands shipped next to the binary.
    pub fn local_commands_dir(&self) -> PathBuf {
        self.install_root.join("commands")
    }
}

/// The running binary with symlinks resolved.
pub fn current_executable() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(std::fs::canonicalize(&exe).unwrap_or(exe))
}

fn install_root_for(exe: &Path) -> PathBuf {
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Check if running in a CI environment.
///
/// Used to pick the CI command manifest over the default one.
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS", "JENKINS_URL"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Paths {
        Paths::new("/home/me/.kapeta", "/opt/kap")
    }

    #[test]
    fn tool_files_live_under_base_dir() {
        let paths = layout();
        assert_eq!(paths.tool_dir(), PathBuf::from("/home/me/.kapeta/kap"));
        assert_eq!(
            paths.user_registry(),
            PathBuf::from("/home/me/.kapeta/kap/commands.json")
        );
        assert_eq!(
            paths.command_dir("hello"),
            PathBuf::from("/home/me/.kapeta/kap/commands/hello")
        );
        assert_eq!(
            paths.settings_file(),
            PathBuf::from("/home/me/.kapeta/kap/config.yml")
        );
    }

    #[test]
    fn token_file_is_shared_with_other_tools() {
        assert_eq!(
            layout().token_file(),
            PathBuf::from("/home/me/.kapeta/authentication.json")
        );
    }

    #[test]
    fn manifests_live_under_install_root() {
        let paths = layout();
        assert_eq!(
            paths.default_manifest(),
            PathBuf::from("/opt/kap/default-commands.json")
        );
        assert_eq!(
            paths.ci_manifest(),
            PathBuf::from("/opt/kap/ci-commands.json")
        );
        assert_eq!(paths.local_commands_dir(), PathBuf::from("/opt/kap/commands"));
    }

    #[test]
    fn install_root_is_two_levels_up_from_binary() {
        assert_eq!(
            install_root_for(Path::new("/opt/kap/bin/kap")),
            PathBuf::from("/opt/kap")
        );
    }

    #[test]
    fn is_ci_does_not_panic() {
        let _ = is_ci();
    }
}
