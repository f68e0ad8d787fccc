//! Command-line interface for kap.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Built-in command implementations and plugin dispatch
//! - [`context`] - Shared state built once per invocation

pub mod args;
pub mod commands;
pub mod context;

pub use args::{
    Cli, Commands, CompletionsArgs, InstallArgs, LinkArgs, ListArgs, UninstallArgs, UpgradeArgs,
    UseArgs,
};
pub use commands::{plugin_help, Command, CommandDispatcher, CommandResult};
pub use context::AppContext;
