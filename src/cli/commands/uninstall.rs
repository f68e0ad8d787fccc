//! `kap uninstall` - remove an installed command.

use crate::cli::args::UninstallArgs;
use crate::cli::context::AppContext;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct UninstallCommand<'a> {
    ctx: &'a AppContext,
    args: UninstallArgs,
}

impl<'a> UninstallCommand<'a> {
    pub fn new(ctx: &'a AppContext, args: UninstallArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for UninstallCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let name = &self.args.name;
        let mut registry = self.ctx.registry()?;

        if registry.uninstall(name)? {
            ui.success(&format!("Removed command {}", name));
        } else {
            ui.warning(&format!("Command {} is not installed", name));
        }

        Ok(CommandResult::success())
    }
}
