//! Command name rules.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{KapError, Result};

static LINK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9-]+$").unwrap_or_else(|e| panic!("invalid link name pattern: {e}"))
});

/// Validate a name for `kap link`.
///
/// A lowercase letter followed by at least one lowercase letter, digit or dash.
pub fn validate_link_name(name: &str) -> Result<()> {
    if LINK_NAME.is_match(name) {
        return Ok(());
    }

    Err(KapError::InvalidName {
        name: name.to_string(),
        reason: "must start with a lowercase letter and contain only lowercase letters, \
                 digits and dashes (at least 2 characters)"
            .to_string(),
    })
}

/// Validate that a name can be used as a directory under the commands dir.
pub fn validate_slot_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        Some("must not be empty")
    } else if name.starts_with('.') {
        Some("must not start with '.'")
    } else if name.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(KapError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
