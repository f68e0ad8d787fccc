//! Error types for kap operations.
//!
//! This module defines [`KapError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `KapError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `KapError::Other`) for unexpected errors
//! - All errors should provide actionable messages for users

use std::path::PathBuf;
use thiserror::Error;

/// Why a plugin executable could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFailure {
    /// The executable does not exist.
    Missing,
    /// The executable exists but may not be executed.
    NotExecutable,
}

/// Core error type for kap operations.
#[derive(Debug, Error)]
pub enum KapError {
    /// A command with this name is already installed.
    #[error("Command already exists: {name}")]
    AlreadyExists { name: String },

    /// A command, manifest, or remote resource does not exist.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Command name does not satisfy the naming rules.
    #[error("Invalid command name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Linking without a name from a package that declares none.
    #[error("{path} is missing a \"command\" property and no command name was specified")]
    MissingCommandName { path: PathBuf },

    /// No usable credential is available.
    #[error("Not authenticated. Run 'kap login' first.")]
    NotAuthenticated,

    /// Context switch to a handle the user is not a member of.
    #[error("Organization not found: {handle}")]
    OrganizationNotFound { handle: String },

    /// The device authorization expired before the user approved it.
    #[error("Failed to complete verification in time")]
    VerificationTimeout,

    /// The identity service answered with a well-formed error body.
    #[error("Service error ({status}): {error}{}", description_suffix(.description))]
    Service {
        status: u16,
        error: String,
        description: Option<String>,
    },

    /// Network failure or a response that does not match a known shape.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A plugin executable could not be started.
    #[error("{}", spawn_message(.path, .kind))]
    Spawn { path: PathBuf, kind: SpawnFailure },

    /// The package manager failed to materialize a package.
    #[error("Failed to install '{package}': {message}")]
    Installer { package: String, message: String },

    /// Failed to parse a manifest or state file.
    #[error("Failed to parse {path}: {message}")]
    ManifestParse { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn description_suffix(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" - {}", d))
        .unwrap_or_default()
}

fn spawn_message(path: &std::path::Path, kind: &SpawnFailure) -> String {
    match kind {
        SpawnFailure::Missing => format!("{}(1) does not exist, try --help", path.display()),
        SpawnFailure::NotExecutable => format!(
            "{}(1) not executable. try chmod or run with root",
            path.display()
        ),
    }
}

impl KapError {
    /// Shorthand for [`KapError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Shorthand for [`KapError::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// True when this is the OAuth "keep polling" answer.
    pub fn is_authorization_pending(&self) -> bool {
        matches!(self, Self::Service { error, .. } if error == "authorization_pending")
    }

    /// True when the service asked the client to poll less often.
    pub fn is_slow_down(&self) -> bool {
        matches!(self, Self::Service { error, .. } if error == "slow_down")
    }
}

impl From<reqwest::Error> for KapError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

/// Result type alias for kap operations.
pub type Result<T> = std::result::Result<T, KapError>;
