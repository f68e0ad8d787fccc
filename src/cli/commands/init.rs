//! `kap init` - install the default command set.

use crate::cli::context::AppContext;
use crate::error::Result;
use crate::registry::EnsureOutcome;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct InitCommand<'a> {
    ctx: &'a AppContext,
}

impl<'a> InitCommand<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }
}

impl Command for InitCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut registry = self.ctx.registry()?;

        let mut spinner = ui.start_spinner("Installing default commands");
        let outcomes = match registry.ensure_defaults() {
            Ok(outcomes) => outcomes,
            Err(e) => {
                spinner.finish_error("Could not install default commands");
                return Err(e);
            }
        };

        let installed = outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == EnsureOutcome::Installed)
            .count();
        if installed == 0 {
            spinner.finish_skipped("Default commands are already installed");
        } else {
            spinner.finish_success(&format!("Installed {} command(s)", installed));
        }

        for (name, outcome) in &outcomes {
            match outcome {
                EnsureOutcome::Installed => ui.success(&format!("Installed {}", name)),
                EnsureOutcome::AlreadyInstalled => {
                    ui.message(&format!("{} is already installed", name))
                }
            }
        }

        Ok(CommandResult::success())
    }
}
