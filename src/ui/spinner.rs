//! Progress spinners.

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

use super::theme::KapTheme;
use super::SpinnerHandle;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Spinner shown while kap installs or contacts the identity service.
pub struct ProgressSpinner {
    bar: ProgressBar,
    theme: KapTheme,
    /// Print the final line instead of drawing it on the bar.
    echo: bool,
}

impl ProgressSpinner {
    pub fn new(message: &str, theme: KapTheme) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS);
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            theme,
            echo: false,
        }
    }

    /// A spinner that draws nothing, for quiet and silent modes.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme: KapTheme::plain(),
            echo: false,
        }
    }

    /// A spinner for pipes and CI logs: no animation, but the final line
    /// is still written out.
    pub fn unattended(theme: KapTheme) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            theme,
            echo: true,
        }
    }

    /// Whether the final line is written as plain output.
    pub fn echoes(&self) -> bool {
        self.echo
    }

    fn finish_with(&mut self, line: String, mut term: Term) {
        if self.echo {
            self.bar.finish_and_clear();
            writeln!(term, "{}", line).ok();
            return;
        }

        let style = ProgressStyle::default_spinner()
            .template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        self.bar.set_style(style);
        self.bar.finish_with_message(line);
    }
}

impl SpinnerHandle for ProgressSpinner {
    fn finish_success(&mut self, msg: &str) {
        let line = self.theme.format_success(msg);
        self.finish_with(line, Term::stdout());
    }

    fn finish_error(&mut self, msg: &str) {
        let line = self.theme.format_error(msg);
        self.finish_with(line, Term::stderr());
    }

    fn finish_skipped(&mut self, msg: &str) {
        let line = self.theme.format_skipped(msg);
        self.finish_with(line, Term::stdout());
    }
}
