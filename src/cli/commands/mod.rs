//! CLI command implementations.
//!
//! Each built-in implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]. Plugin commands go through [`external`], which
//! hands the terminal to a child process and reports its exit code.

pub mod auth;
pub mod completions;
pub mod dispatcher;
pub mod external;
pub mod init;
pub mod install;
pub mod link;
pub mod list;
pub mod uninstall;
pub mod upgrade;

pub use dispatcher::{plugin_help, Command, CommandDispatcher, CommandResult};
