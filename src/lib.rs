pub mod app;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod logging;
pub mod provider;

pub use app::{Controller, Submission};
pub use config::Config;
pub use highlight::Strategy;
pub use provider::{CorrectionProvider, ProviderError};

use serde::Serialize;

/// A word of the original text paired with what the correction replaced it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub original: String,
    pub corrected: String,
}

impl Change {
    pub fn new(original: impl Into<String>, corrected: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
        }
    }
}

/// Half-open byte range into the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HighlightRange {
    pub start: usize,
    pub end: usize,
}

impl HighlightRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The slice of `text` covered by this range.
    pub fn word<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// Everything one completed check produced.
#[derive(Debug, Clone, Default)]
pub struct CheckOutcome {
    pub original: String,
    pub corrected: String,
    pub changes: Vec<Change>,
    pub highlights: Vec<HighlightRange>,
}

impl CheckOutcome {
    pub fn change_count(&self) -> usize {
        self.highlights.len()
    }

    /// True only when the provider returned the text unchanged.
    pub fn is_clean(&self) -> bool {
        self.highlights.is_empty() && self.corrected.trim() == self.original.trim()
    }
}
