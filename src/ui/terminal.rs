//! Terminal UI.

use console::Term;
use std::io::Write;

use super::{KapTheme, OutputMode, ProgressSpinner, SpinnerHandle, UserInterface};

/// Writes to the terminal. Errors go to stderr so plugin-style piping of
/// kap's stdout stays clean.
pub struct TerminalUI {
    out: Term,
    err: Term,
    theme: KapTheme,
    mode: OutputMode,
}

impl TerminalUI {
    pub fn new(mode: OutputMode, theme: KapTheme) -> Self {
        Self {
            out: Term::stdout(),
            err: Term::stderr(),
            theme,
            mode,
        }
    }

    /// Animated on a terminal; piped output only gets the final line.
    fn spinner(&self, message: &str) -> ProgressSpinner {
        if !self.mode.shows_spinners() {
            ProgressSpinner::hidden()
        } else if self.out.is_term() {
            ProgressSpinner::new(message, self.theme.clone())
        } else {
            ProgressSpinner::unattended(self.theme.clone())
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_messages() {
            writeln!(self.out, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.out, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.err, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.err, "{}", self.theme.format_error(msg)).ok();
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        Box::new(self.spinner(message))
    }

    fn is_interactive(&self) -> bool {
        self.out.is_term()
    }
}

/// Build the UI for the global output flags.
pub fn create_ui(mode: OutputMode, no_color: bool) -> Box<dyn UserInterface> {
    Box::new(TerminalUI::new(mode, KapTheme::detect(no_color)))
}
