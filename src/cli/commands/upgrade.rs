//! `kap upgrade` - upgrade installed commands.

use crate::cli::args::UpgradeArgs;
use crate::cli::context::AppContext;
use crate::error::Result;
use crate::registry::UpgradeOutcome;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

pub struct UpgradeCommand<'a> {
    ctx: &'a AppContext,
    args: UpgradeArgs,
}

impl<'a> UpgradeCommand<'a> {
    pub fn new(ctx: &'a AppContext, args: UpgradeArgs) -> Self {
        Self { ctx, args }
    }
}

fn report(ui: &mut dyn UserInterface, name: &str, outcome: &UpgradeOutcome) {
    match outcome {
        UpgradeOutcome::Upgraded { package } => {
            ui.success(&format!("Upgraded command {} from {}", name, package))
        }
        UpgradeOutcome::Linked => {
            ui.message(&format!("Skipped {}: linked to a working directory", name))
        }
    }
}

impl Command for UpgradeCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let mut registry = self.ctx.registry()?;

        match &self.args.name {
            Some(name) => {
                let mut spinner = ui.start_spinner(&format!("Upgrading command {}", name));
                match registry.upgrade(name) {
                    Ok(UpgradeOutcome::Upgraded { package }) => spinner.finish_success(&format!(
                        "Upgraded command {} from {}",
                        name, package
                    )),
                    Ok(UpgradeOutcome::Linked) => spinner.finish_skipped(&format!(
                        "Skipped {}: linked to a working directory",
                        name
                    )),
                    Err(e) => {
                        spinner.finish_error(&format!("Could not upgrade {}", name));
                        return Err(e);
                    }
                }
            }
            None => {
                let outcomes = registry.upgrade_all()?;
                if outcomes.is_empty() {
                    ui.message("No commands installed");
                }
                for (name, outcome) in &outcomes {
                    report(ui, name, outcome);
                }
            }
        }

        Ok(CommandResult::success())
    }
}
