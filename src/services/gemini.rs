//! Client for the Gemini `generateContent` endpoint.
//!
//! One request per evaluation: no retries and no backoff. The configured
//! timeout bounds the whole call.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{ApiCredential, EvaluationResult};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model call timed out")]
    Timeout,

    #[error("model returned no content ({reason})")]
    EmptyContent { reason: String },

    #[error("{0}")]
    MalformedReply(#[source] serde_json::Error),

    #[error("{0}")]
    Schema(String),
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, all parts concatenated.
    pub fn text(&self) -> Result<String, LlmError> {
        let candidate = match self.candidates.first() {
            Some(candidate) => candidate,
            None => {
                let reason = self
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
                    .map(|r| format!("prompt blocked: {}", r))
                    .unwrap_or_else(|| "no candidates".to_string());
                return Err(LlmError::EmptyContent { reason });
            }
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            let reason = candidate
                .finish_reason
                .as_ref()
                .map(|r| format!("finish reason: {}", r))
                .unwrap_or_else(|| "empty candidate".to_string());
            return Err(LlmError::EmptyContent { reason });
        }

        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.model_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }

    /// Sends the prompt and returns the raw reply text.
    pub async fn generate(&self, prompt: &str, credential: &ApiCredential) -> Result<String, LlmError> {
        let start = Instant::now();
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "Calling model");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), "Model API returned an error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateContentResponse = response.json().await.map_err(transport_error)?;

        if let Some(usage) = &reply.usage_metadata {
            debug!(
                prompt_tokens = ?usage.prompt_token_count,
                reply_tokens = ?usage.candidates_token_count,
                "Model usage"
            );
        }

        let text = reply.text()?;
        info!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            reply_chars = text.len(),
            "Model call succeeded"
        );
        Ok(text)
    }

    /// Calls the model and validates its reply into an [`EvaluationResult`].
    pub async fn evaluate(
        &self,
        prompt: &str,
        credential: &ApiCredential,
    ) -> Result<EvaluationResult, LlmError> {
        let text = self.generate(prompt, credential).await?;
        parse_reply(&text)
    }
}

fn transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Http(err)
    }
}

/// Parses the reply text as JSON and validates it against the schema.
pub fn parse_reply(text: &str) -> Result<EvaluationResult, LlmError> {
    let value: Value = serde_json::from_str(strip_json_fences(text)).map_err(LlmError::MalformedReply)?;
    EvaluationResult::from_reply(value).map_err(LlmError::Schema)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));

    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}
