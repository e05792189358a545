use super::{parse_change_list, CorrectionProvider, ProviderError};
use crate::{Change, Config};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

const CORRECT_INSTRUCTION: &str =
    "Correct all errors in this text while preserving meaning and style:";
const DIFF_INSTRUCTIONS: [&str; 2] = [
    "You are a precise text differencing tool. For the following text, list all changed words",
    "in format 'original->corrected', one per line. Only return the changes, nothing else:",
];

const MAX_ERROR_MESSAGE: usize = 200;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

impl GenerateRequest {
    fn from_parts(parts: Vec<String>) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: parts.into_iter().map(|text| RequestPart { text }).collect(),
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Correction provider backed by the Gemini `generateContent` endpoint.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build a provider from configuration. Returns `None` when no API key is
    /// configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, ProviderError> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };

        Self::new(
            api_key.trim(),
            config.model.clone(),
            config.endpoint.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
        .map(Some)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn generate(&self, parts: Vec<String>) -> Result<String, ProviderError> {
        let request = GenerateRequest::from_parts(parts);
        debug!(model = %self.model, "sending generateContent request");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "generateContent response");

        if !status.is_success() {
            let err = classify_error(status.as_u16(), &body);
            warn!(status = status.as_u16(), "generateContent failed: {}", err);
            return Err(err);
        }

        extract_text(&body)
    }
}

#[async_trait]
impl CorrectionProvider for GeminiProvider {
    async fn correct(&self, text: &str) -> Result<String, ProviderError> {
        self.generate(vec![CORRECT_INSTRUCTION.to_string(), text.to_string()])
            .await
    }

    async fn list_changes(
        &self,
        original: &str,
        corrected: &str,
    ) -> Result<Vec<Change>, ProviderError> {
        let mut parts: Vec<String> = DIFF_INSTRUCTIONS.iter().map(|s| s.to_string()).collect();
        parts.push(format!("Original: {}", original));
        parts.push(format!("Corrected: {}", corrected));

        let reply = self.generate(parts).await?;
        let changes = parse_change_list(&reply);
        debug!(count = changes.len(), "parsed change list");
        Ok(changes)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Map a non-success status and its body to a provider error.
fn classify_error(status: u16, body: &str) -> ProviderError {
    let (message, api_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), None),
    };
    let message = truncate(&message, MAX_ERROR_MESSAGE);

    let bad_key = message.to_lowercase().contains("api key")
        || api_status.as_deref() == Some("UNAUTHENTICATED");

    match status {
        401 | 403 => ProviderError::Unauthorized(message),
        400 if bad_key => ProviderError::Unauthorized(message),
        429 => ProviderError::QuotaExceeded(message),
        _ => ProviderError::Http { status, message },
    }
}

/// Pull the reply text out of a successful response body.
fn extract_text(body: &str) -> Result<String, ProviderError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        return match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => Err(ProviderError::Blocked(reason)),
            None => Err(ProviderError::MalformedResponse(
                "response has no candidates".to_string(),
            )),
        };
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_default();
        return match reason.as_str() {
            "SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" => {
                Err(ProviderError::Blocked(reason.clone()))
            }
            _ => Err(ProviderError::EmptyResponse),
        };
    }

    Ok(text.to_string())
}

fn truncate(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &message[..idx]),
        None => message.to_string(),
    }
}
