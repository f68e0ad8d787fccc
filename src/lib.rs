//! kap - Pluggable command launcher.
//!
//! kap is a thin root command. Everything beyond package management and
//! sign-in is provided by plugin commands: packages installed into the
//! user's command directory and run as child processes with the caller's
//! terminal and a few `KAP_*` environment variables.
//!
//! # Modules
//!
//! - [`auth`] - Session file, device sign-in, token refresh and identity lookups
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - User settings
//! - [`dispatch`] - Resolving and running plugin commands
//! - [`error`] - Error types and result aliases
//! - [`paths`] - On-disk layout
//! - [`registry`] - Installed plugin commands
//! - [`ui`] - Spinners, tables and terminal output
//!
//! # Example
//!
//! ```
//! use kap::dispatch::normalize_help;
//!
//! let args = vec!["help".to_string(), "deploy".to_string()];
//! assert_eq!(
//!     normalize_help(args),
//!     Some(vec!["deploy".to_string(), "--help".to_string()])
//! );
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod paths;
pub mod registry;
pub mod ui;

pub use error::{KapError, Result};
