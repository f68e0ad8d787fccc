//! `kap install` - install a command from a package.

use crate::cli::args::InstallArgs;
use crate::cli::context::AppContext;
use crate::error::{KapError, Result};
use crate::registry::validate_link_name;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct InstallCommand<'a> {
    ctx: &'a AppContext,
    args: InstallArgs,
}

impl<'a> InstallCommand<'a> {
    pub fn new(ctx: &'a AppContext, args: InstallArgs) -> Self {
        Self { ctx, args }
    }

    /// Command name and package reference to install.
    ///
    /// A bare command name without an explicit name installs the
    /// first-party package for it.
    fn target(&self) -> Result<(String, String)> {
        let package = &self.args.package;
        if let Some(name) = &self.args.name {
            return Ok((name.clone(), package.clone()));
        }

        validate_link_name(package).map_err(|_| KapError::InvalidName {
            name: package.clone(),
            reason: "give a command name when installing a package reference".to_string(),
        })?;

        Ok((
            package.clone(),
            self.ctx.settings.default_package_for(package),
        ))
    }
}

impl Command for InstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let (name, reference) = self.target()?;
        let mut registry = self.ctx.registry()?;

        let path = self.ctx.paths.command_dir(&name);
        let mut spinner = ui.start_spinner(&format!(
            "Installing command {} in {}",
            name,
            path.display()
        ));

        match registry.install(&name, &reference) {
            Ok(()) => {
                spinner.finish_success(&format!("Installed command {} from {}", name, reference));
                Ok(CommandResult::success())
            }
            Err(e) => {
                spinner.finish_error(&format!("Could not install {}", name));
                Err(e)
            }
        }
    }
}
