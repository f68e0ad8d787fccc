//! Colors and marks.

use console::{Style, Term};

/// Styles used by [`TerminalUI`](super::TerminalUI).
#[derive(Debug, Clone)]
pub struct KapTheme {
    /// Green.
    pub success: Style,
    /// Orange.
    pub warning: Style,
    /// Red bold.
    pub error: Style,
    pub dim: Style,
}

impl Default for KapTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl KapTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
        }
    }

    /// Theme without any styling, for pipes and `--no-color`.
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
        }
    }

    /// Theme for the current terminal.
    pub fn detect(no_color: bool) -> Self {
        if should_use_colors(no_color) {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{} {}", self.success.apply_to("✓"), msg)
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{} {}", self.warning.apply_to("⚠"), msg)
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{} {}", self.error.apply_to("✗"), msg)
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{} {}", self.dim.apply_to("○"), self.dim.apply_to(msg))
    }
}

/// Whether output should be colored.
///
/// Honors the `--no-color` flag, the `NO_COLOR` convention and whether
/// stdout is a terminal.
pub fn should_use_colors(no_color: bool) -> bool {
    if no_color || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    Term::stdout().is_term()
}
