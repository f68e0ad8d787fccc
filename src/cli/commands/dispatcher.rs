//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands};
use crate::cli::context::AppContext;
use crate::error::Result;
use crate::registry::CommandRegistry;
use crate::ui::{Table, UserInterface};

use super::auth::{
    LoginCommand, LogoutCommand, OrganizationsCommand, UseCommand, WhoamiCommand,
};
use super::completions::CompletionsCommand;
use super::external::ExternalCommand;
use super::init::InitCommand;
use super::install::InstallCommand;
use super::link::LinkCommand;
use super::list::ListCommand;
use super::uninstall::UninstallCommand;
use super::upgrade::UpgradeCommand;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result carrying a child process's exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            success: exit_code == 0,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher<'a> {
    ctx: &'a AppContext,
}

impl<'a> CommandDispatcher<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// Route the parsed command line to its implementation.
    ///
    /// Without a subcommand only global flags were given, so usage is
    /// shown and the invocation fails.
    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = self.ctx;
        match &cli.command {
            Some(Commands::Install(args)) => InstallCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Uninstall(args)) => {
                UninstallCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Upgrade(args)) => UpgradeCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Link(args)) => LinkCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Init) => InitCommand::new(ctx).execute(ui),
            Some(Commands::List(args)) => ListCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Login) => LoginCommand::new(ctx).execute(ui),
            Some(Commands::Logout) => LogoutCommand::new(ctx).execute(ui),
            Some(Commands::Whoami) => WhoamiCommand::new(ctx).execute(ui),
            Some(Commands::Organizations) => OrganizationsCommand::new(ctx).execute(ui),
            Some(Commands::Use(args)) => UseCommand::new(ctx, args.clone()).execute(ui),
            Some(Commands::Completions(args)) => CompletionsCommand::new(args.clone()).execute(ui),
            Some(Commands::External(args)) => ExternalCommand::new(ctx, args.clone()).execute(ui),
            None => Ok(CommandResult::failure(1)),
        }
    }
}

/// Help section listing installed plugin commands.
///
/// Returns `None` when nothing is installed.
pub fn plugin_help(registry: &CommandRegistry) -> Option<String> {
    let names = registry.list().ok()?;
    if names.is_empty() {
        return None;
    }

    let mut table = Table::new(vec!["Command", "Description"]);
    for name in &names {
        let description = registry
            .describe(name)
            .map(|info| info.description)
            .unwrap_or_default();
        table.add_row(&[name.as_str(), description.as_str()]);
    }

    Some(format!("Installed commands:\n{}", table.render()))
}
