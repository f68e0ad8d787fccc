//! Recording UI for tests.
//!
//! ```
//! use kap::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.success("Installed deploy");
//!
//! assert!(ui.has_success("deploy"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use super::{OutputMode, SpinnerHandle, UserInterface};

/// Spinner results, in the order spinners were finished.
type FinishLog = Rc<RefCell<Vec<(SpinnerOutcome, String)>>>;

/// Captures everything written to it.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    spinners: Vec<String>,
    finishes: FinishLog,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Messages spinners were started with.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// How each spinner started by this UI was finished.
    pub fn spinner_results(&self) -> Vec<(SpinnerOutcome, String)> {
        self.finishes.borrow().clone()
    }

    /// Whether a spinner finished with `outcome` and a line containing `msg`.
    pub fn has_spinner_result(&self, outcome: SpinnerOutcome, msg: &str) -> bool {
        self.finishes
            .borrow()
            .iter()
            .any(|(o, m)| *o == outcome && m.contains(msg))
    }

    /// Whether any message contains `msg`.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            log: Rc::clone(&self.finishes),
            ..MockSpinner::default()
        })
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Spinner that remembers how it finished.
///
/// Spinners handed out by [`MockUI`] also report to the UI, so a test can
/// inspect them after the command dropped its handle.
#[derive(Debug, Default)]
pub struct MockSpinner {
    finished: Option<(SpinnerOutcome, String)>,
    log: FinishLog,
}

/// How a [`MockSpinner`] was finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerOutcome {
    Success,
    Error,
    Skipped,
}

impl MockSpinner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Option<SpinnerOutcome> {
        self.finished.as_ref().map(|(outcome, _)| *outcome)
    }

    pub fn finish_message(&self) -> Option<&str> {
        self.finished.as_ref().map(|(_, msg)| msg.as_str())
    }

    fn finish(&mut self, outcome: SpinnerOutcome, msg: &str) {
        self.finished = Some((outcome, msg.to_string()));
        self.log.borrow_mut().push((outcome, msg.to_string()));
    }
}

impl SpinnerHandle for MockSpinner {
    fn finish_success(&mut self, msg: &str) {
        self.finish(SpinnerOutcome::Success, msg);
    }

    fn finish_error(&mut self, msg: &str) {
        self.finish(SpinnerOutcome::Error, msg);
    }

    fn finish_skipped(&mut self, msg: &str) {
        self.finish(SpinnerOutcome::Skipped, msg);
    }
}
