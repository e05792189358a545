pub mod gemini;

pub use gemini::GeminiProvider;

use crate::highlight::positional_changes;
use crate::Change;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    // original->corrected, optionally behind a list bullet
    static ref CHANGE_LINE: Regex =
        Regex::new(r"^\s*(?:[-*•]\s+)?(.+?)\s*->\s*(.+?)\s*$").unwrap();
}

/// Failures of a single correction request. None of them are retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API key rejected: {0}")]
    Unauthorized(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request blocked by the provider: {0}")]
    Blocked(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// A remote service that rewrites text to remove spelling and grammar errors.
#[async_trait]
pub trait CorrectionProvider: Send + Sync {
    /// Return the corrected version of `text`. Output may vary between calls.
    async fn correct(&self, text: &str) -> Result<String, ProviderError>;

    /// List the words that changed between `original` and `corrected`.
    ///
    /// The default pairs words by position locally without a remote call.
    async fn list_changes(
        &self,
        original: &str,
        corrected: &str,
    ) -> Result<Vec<Change>, ProviderError> {
        Ok(positional_changes(original, corrected))
    }

    fn name(&self) -> &str;
}

/// Read `original->corrected` lines out of a model reply.
pub fn parse_change_list(reply: &str) -> Vec<Change> {
    reply
        .lines()
        .filter(|line| line.contains("->"))
        .filter_map(|line| CHANGE_LINE.captures(line))
        .filter_map(|caps| {
            let original = strip_quotes(caps.get(1)?.as_str());
            let corrected = strip_quotes(caps.get(2)?.as_str());
            if original.is_empty() || corrected.is_empty() || original == corrected {
                return None;
            }
            Some(Change::new(original, corrected))
        })
        .collect()
}

fn strip_quotes(word: &str) -> &str {
    word.trim()
        .trim_matches(|c| c == '`' || c == '"' || c == '\'')
        .trim()
}
