//! `kap list` - show installed commands.

use serde::Serialize;

use crate::cli::args::ListArgs;
use crate::cli::context::AppContext;
use crate::error::{KapError, Result};
use crate::registry::InstalledCommandInfo;
use crate::ui::{Table, UserInterface};

use super::dispatcher::{Command, CommandResult};

pub struct ListCommand<'a> {
    ctx: &'a AppContext,
    args: ListArgs,
}

/// One row of `kap list --json`.
#[derive(Debug, Serialize)]
struct ListEntry {
    command: String,
    package: Option<String>,
    version: Option<String>,
    description: String,
    linked: bool,
}

impl From<InstalledCommandInfo> for ListEntry {
    fn from(info: InstalledCommandInfo) -> Self {
        Self {
            command: info.command,
            package: info.package_name,
            version: info.version,
            description: info.description,
            linked: info.linked,
        }
    }
}

impl<'a> ListCommand<'a> {
    pub fn new(ctx: &'a AppContext, args: ListArgs) -> Self {
        Self { ctx, args }
    }
}

impl Command for ListCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let registry = self.ctx.registry()?;

        let mut entries = Vec::new();
        for name in registry.list()? {
            match registry.describe(&name) {
                Ok(info) => entries.push(ListEntry::from(info)),
                Err(e) => ui.warning(&format!("Skipping {}: {}", name, e)),
            }
        }

        if self.args.json {
            let json = serde_json::to_string_pretty(&entries)
                .map_err(|e| KapError::Other(e.into()))?;
            ui.message(&json);
            return Ok(CommandResult::success());
        }

        if entries.is_empty() {
            ui.message("No commands installed. Run 'kap init' to install the defaults.");
            return Ok(CommandResult::success());
        }

        let mut table = Table::new(vec!["Command", "Package", "Version", "Description"]);
        for entry in &entries {
            let package = match (&entry.package, entry.linked) {
                (_, true) => "(linked)",
                (Some(package), false) => package.as_str(),
                (None, false) => "-",
            };
            table.add_row(&[
                entry.command.as_str(),
                package,
                entry.version.as_deref().unwrap_or("-"),
                entry.description.as_str(),
            ]);
        }
        ui.message(&table.render());

        Ok(CommandResult::success())
    }
}
