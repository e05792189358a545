pub mod controller;

pub use controller::{Controller, Submission, Update};

use crate::provider::ProviderError;
use crate::{Change, CheckOutcome, HighlightRange};
use thiserror::Error;

pub const TRIGGER_LABEL: &str = "Check & Correct Text";
pub const BUSY_LABEL: &str = "Processing...";
pub const PROCESSING_PLACEHOLDER: &str = "Processing your text...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Checking {
        request: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user: a dialog in a windowed front end, a line on
/// stderr in the terminal one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, message)
    }

    fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("a check is already running")]
    Busy,
}

/// Everything the front end displays. Only the controller mutates it, and
/// only through the transition methods below.
#[derive(Debug, Default)]
pub struct AppState {
    phase: Phase,
    original: String,
    corrected: String,
    changes: Vec<Change>,
    highlights: Vec<HighlightRange>,
    notices: Vec<Notice>,
}

impl AppState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_checking(&self) -> bool {
        matches!(self.phase, Phase::Checking { .. })
    }

    pub fn trigger_enabled(&self) -> bool {
        !self.is_checking()
    }

    pub fn trigger_label(&self) -> &'static str {
        if self.is_checking() {
            BUSY_LABEL
        } else {
            TRIGGER_LABEL
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn corrected(&self) -> &str {
        &self.corrected
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn highlights(&self) -> &[HighlightRange] {
        &self.highlights
    }

    pub fn pending_notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Snapshot of the displayed buffers.
    pub fn outcome(&self) -> CheckOutcome {
        CheckOutcome {
            original: self.original.clone(),
            corrected: self.corrected.clone(),
            changes: self.changes.clone(),
            highlights: self.highlights.clone(),
        }
    }

    fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn is_current(&self, request: u64) -> bool {
        self.phase == Phase::Checking { request }
    }

    fn start_check(&mut self, request: u64, text: &str) -> Result<(), TransitionError> {
        if self.is_checking() {
            return Err(TransitionError::Busy);
        }

        self.phase = Phase::Checking { request };
        self.original = text.to_string();
        self.corrected = PROCESSING_PLACEHOLDER.to_string();
        self.changes.clear();
        self.highlights.clear();
        Ok(())
    }

    fn receive_result(&mut self, request: u64, outcome: CheckOutcome) -> bool {
        if !self.is_current(request) {
            return false;
        }

        self.phase = Phase::Idle;
        self.original = outcome.original;
        self.corrected = outcome.corrected;
        self.changes = outcome.changes;
        self.highlights = outcome.highlights;
        true
    }

    fn receive_error(&mut self, request: u64, error: &ProviderError) -> bool {
        if !self.is_current(request) {
            return false;
        }

        self.phase = Phase::Idle;
        self.corrected.clear();
        self.push_notice(Notice::error("Error", format!("Check failed: {}", error)));
        true
    }

    fn cancel(&mut self, request: u64) -> bool {
        if !self.is_current(request) {
            return false;
        }

        self.phase = Phase::Idle;
        self.corrected.clear();
        self.push_notice(Notice::info("Cancelled", "The check was cancelled"));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> CheckOutcome {
        CheckOutcome {
            original: "I has a apple".to_string(),
            corrected: "I have an apple".to_string(),
            changes: vec![Change::new("has", "have"), Change::new("a", "an")],
            highlights: vec![HighlightRange::new(2, 5), HighlightRange::new(6, 7)],
        }
    }

    #[test]
    fn test_start_check_disables_trigger() {
        let mut state = AppState::default();
        assert!(state.trigger_enabled());
        assert_eq!(state.trigger_label(), TRIGGER_LABEL);

        state.start_check(1, "I has a apple").unwrap();
        assert!(!state.trigger_enabled());
        assert_eq!(state.trigger_label(), BUSY_LABEL);
        assert_eq!(state.corrected(), PROCESSING_PLACEHOLDER);
        assert_eq!(state.phase(), Phase::Checking { request: 1 });
    }

    #[test]
    fn test_start_check_while_busy() {
        let mut state = AppState::default();
        state.start_check(1, "first").unwrap();
        assert_eq!(state.start_check(2, "second"), Err(TransitionError::Busy));
        assert_eq!(state.original(), "first");
    }

    #[test]
    fn test_receive_result_applies_buffers() {
        let mut state = AppState::default();
        state.start_check(1, "I has a apple").unwrap();

        assert!(state.receive_result(1, outcome()));
        assert!(state.trigger_enabled());
        assert_eq!(state.corrected(), "I have an apple");
        assert_eq!(state.highlights().len(), 2);
        assert_eq!(state.changes()[0], Change::new("has", "have"));
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let mut state = AppState::default();
        state.start_check(2, "I has a apple").unwrap();

        assert!(!state.receive_result(1, outcome()));
        assert!(state.is_checking());
        assert!(state.highlights().is_empty());
    }

    #[test]
    fn test_receive_error_notifies_and_reenables() {
        let mut state = AppState::default();
        state.start_check(1, "text").unwrap();

        let error = ProviderError::QuotaExceeded("daily limit".to_string());
        assert!(state.receive_error(1, &error));
        assert!(state.trigger_enabled());
        assert!(state.corrected().is_empty());

        let notices = state.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Check failed: quota exceeded: daily limit");
        assert!(state.take_notices().is_empty());
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let mut state = AppState::default();
        assert!(!state.cancel(1));

        state.start_check(1, "text").unwrap();
        assert!(state.cancel(1));
        assert!(state.trigger_enabled());
        assert_eq!(state.pending_notices()[0].level, NoticeLevel::Info);

        // A result arriving after cancellation is dropped.
        assert!(!state.receive_result(1, outcome()));
    }

    #[test]
    fn test_new_check_clears_previous_highlights() {
        let mut state = AppState::default();
        state.start_check(1, "I has a apple").unwrap();
        state.receive_result(1, outcome());

        state.start_check(2, "Fine text").unwrap();
        assert!(state.highlights().is_empty());
        assert!(state.changes().is_empty());
        assert_eq!(state.original(), "Fine text");
    }
}
