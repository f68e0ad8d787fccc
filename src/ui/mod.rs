//! Terminal output for kap's own commands.
//!
//! Commands talk to a [`UserInterface`] rather than to stdout directly so
//! they can be exercised with [`MockUI`] in tests. Plugin commands own the
//! terminal while they run and never go through this layer.

pub mod mock;
pub mod output;
pub mod spinner;
pub mod table;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI, SpinnerOutcome};
pub use output::OutputMode;
pub use spinner::ProgressSpinner;
pub use table::Table;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, KapTheme};

/// Output sink used by built-in commands.
pub trait UserInterface {
    /// Current verbosity.
    fn output_mode(&self) -> OutputMode;

    /// Plain informational line.
    fn message(&mut self, msg: &str);

    /// Line marking a completed action.
    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    /// Error line. Shown in every mode, including silent.
    fn error(&mut self, msg: &str);

    /// Start a spinner for a long-running operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Whether a human is watching the terminal.
    fn is_interactive(&self) -> bool;
}

/// Handle to a running spinner.
pub trait SpinnerHandle {
    /// Stop with a success mark.
    fn finish_success(&mut self, msg: &str);

    /// Stop with an error mark.
    fn finish_error(&mut self, msg: &str);

    /// Stop with a neutral mark, for work that turned out to be unnecessary.
    fn finish_skipped(&mut self, msg: &str);
}
