//! Plugin commands.
//!
//! Refreshes a stale session so the child finds a usable token file, then
//! hands over to the [`ProcessDispatcher`].

use crate::cli::context::AppContext;
use crate::dispatch::{ChildEnvironment, ProcessDispatcher};
use crate::error::{KapError, Result};
use crate::paths::current_executable;
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// Name exported to plugins as the root command.
pub const PARENT_CLI: &str = "kap";

pub struct ExternalCommand<'a> {
    ctx: &'a AppContext,
    args: Vec<String>,
}

impl<'a> ExternalCommand<'a> {
    pub fn new(ctx: &'a AppContext, args: Vec<String>) -> Self {
        Self { ctx, args }
    }

    /// Environment for the child, refreshing the session first if needed.
    fn child_environment(&self, ui: &mut dyn UserInterface) -> Result<ChildEnvironment> {
        let mut context = None;
        match self.ctx.auth() {
            Ok(mut auth) => {
                if let Err(e) = auth.refresh_if_stale() {
                    ui.warning(&format!("Could not refresh your session: {}", e));
                }
                context = auth.current_context().map(|m| m.handle().to_string());
            }
            Err(e) => tracing::warn!("Could not read the session: {}", e),
        }

        Ok(ChildEnvironment {
            parent_cli: PARENT_CLI.to_string(),
            credentials: self.ctx.paths.token_file(),
            parent_path: current_executable()?,
            context,
        })
    }
}

impl Command for ExternalCommand<'_> {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let Some((name, rest)) = self.args.split_first() else {
            return Err(KapError::not_found("command"));
        };

        let registry = self.ctx.registry()?;
        let env = self.child_environment(ui)?;
        let dispatcher = ProcessDispatcher::new(&self.ctx.paths, &self.ctx.settings, &registry);

        let code = dispatcher.dispatch(name, rest, env)?;
        tracing::debug!("{} exited with {}", name, code);

        Ok(CommandResult::from_exit_code(code))
    }
}
