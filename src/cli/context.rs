//! Per-invocation application state.

use std::sync::Arc;

use crate::auth::{AuthClient, SessionStore};
use crate::config::Settings;
use crate::error::Result;
use crate::paths::{is_ci, Paths};
use crate::registry::{CommandInstaller, CommandRegistry, NpmInstaller};

/// Everything commands need, built once in `main` and passed down.
pub struct AppContext {
    pub paths: Paths,
    pub settings: Settings,
    pub installer: Arc<dyn CommandInstaller>,
    pub ci: bool,
}

impl AppContext {
    pub fn new(paths: Paths, settings: Settings, installer: Arc<dyn CommandInstaller>) -> Self {
        Self {
            paths,
            settings,
            installer,
            ci: false,
        }
    }

    /// Discover paths and settings for the current user and binary.
    pub fn discover() -> Result<Self> {
        let paths = Paths::discover()?;
        let settings = Settings::load(&paths.settings_file())?;
        let installer = Arc::new(NpmInstaller::new(settings.package_manager.clone()));

        tracing::debug!(
            "Using {} with install root {}",
            paths.base_dir().display(),
            paths.install_root().display()
        );

        Ok(Self::new(paths, settings, installer).with_ci(is_ci()))
    }

    pub fn with_ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    /// Open the command registry.
    pub fn registry(&self) -> Result<CommandRegistry> {
        Ok(CommandRegistry::open(self.paths.clone(), Arc::clone(&self.installer))?.with_ci(self.ci))
    }

    /// Authentication client over the stored session.
    pub fn auth(&self) -> Result<AuthClient> {
        let session = SessionStore::load(self.paths.token_file())?;
        AuthClient::from_settings(&self.settings, session)
    }
}
