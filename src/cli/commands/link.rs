//! `kap link` - use a working directory as a command.

use std::path::PathBuf;

use crate::cli::args::LinkArgs;
use crate::cli::context::AppContext;
use crate::error::Result;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct LinkCommand<'a> {
    ctx: &'a AppContext,
    args: LinkArgs,
}

impl<'a> LinkCommand<'a> {
    pub fn new(ctx: &'a AppContext, args: LinkArgs) -> Self {
        Self { ctx, args }
    }

    fn directory(&self) -> Result<PathBuf> {
        match &self.args.path {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

impl Command for LinkCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let dir = self.directory()?;
        let mut registry = self.ctx.registry()?;

        let outcome = registry.link(&dir, self.args.name.as_deref())?;
        ui.success(&format!(
            "Linked command {} to {}",
            outcome.name,
            outcome.target.display()
        ));

        Ok(CommandResult::success())
    }
}
