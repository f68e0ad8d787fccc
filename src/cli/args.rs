//! CLI argument definitions.
//!
//! Built-in commands are declared here. Anything else on the command line
//! is captured by [`Commands::External`] and dispatched to an installed
//! plugin command.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// kap - Pluggable command launcher.
#[derive(Debug, Parser)]
#[command(name = "kap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true, disable_help_subcommand = true)]
pub struct Cli {
    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true, env = "KAP_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Install a command from a package
    #[command(visible_alias = "i")]
    Install(InstallArgs),

    /// Remove an installed command
    #[command(visible_alias = "rm")]
    Uninstall(UninstallArgs),

    /// Upgrade one or all installed commands
    Upgrade(UpgradeArgs),

    /// Link a working directory as a command
    #[command(visible_alias = "ln")]
    Link(LinkArgs),

    /// Install the default command set
    Init,

    /// List installed commands
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Sign in with your browser
    Login,

    /// Sign out and remove stored credentials
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// List organizations you belong to
    #[command(visible_alias = "orgs")]
    Organizations,

    /// Act on behalf of an organization, or yourself when no handle is given
    Use(UseArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// An installed plugin command
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, clap::Args)]
pub struct InstallArgs {
    /// Package reference, or a bare command name for a first-party command
    pub package: String,

    /// Name to install the command as
    pub name: Option<String>,
}

/// Arguments for the `uninstall` command.
#[derive(Debug, Clone, clap::Args)]
pub struct UninstallArgs {
    /// Command to remove
    pub name: String,
}

/// Arguments for the `upgrade` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UpgradeArgs {
    /// Command to upgrade (all when omitted)
    pub name: Option<String>,
}

/// Arguments for the `link` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct LinkArgs {
    /// Name to link as (defaults to the package's "command" property)
    pub name: Option<String>,

    /// Directory to link (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `use` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UseArgs {
    /// Organization handle
    pub handle: Option<String>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
