//! Chat-completion client for the AI script writer.
//!
//! Wraps the OpenAI-compatible `POST /chat/completions` endpoint using
//! [`reqwest`]. One call per [`ScriptGenerator::generate_script`]; the
//! caller decides whether to try again.

use async_trait::async_trait;
use pitch_core::prompt::SYSTEM_PROMPT;
use pitch_core::upstream::{ScriptGenerator, UpstreamError};
use serde::{Deserialize, Serialize};

use crate::http;

/// Service name used in error messages and logs.
pub const SERVICE: &str = "script writer";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature sent with every request.
const TEMPERATURE: f32 = 0.8;

/// Upper bound on completion tokens; comfortably above a 180-word pitch.
const MAX_TOKENS: u32 = 600;

/// Configuration for the script writer.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token. An empty key fails every call as rejected.
    pub api_key: String,
    /// Base URL without a trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env var               | Default                        |
    /// |-----------------------|--------------------------------|
    /// | `OPENAI_API_KEY`      | (empty)                        |
    /// | `OPENAI_BASE_URL`     | `https://api.openai.com/v1`    |
    /// | `OPENAI_MODEL`        | `gpt-4o-mini`                  |
    /// | `SCRIPT_TIMEOUT_SECS` | `60`                           |
    ///
    /// # Panics
    ///
    /// Panics if `SCRIPT_TIMEOUT_SECS` is not a valid `u64`.
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs: u64 = std::env::var("SCRIPT_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("SCRIPT_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key,
            base_url,
            model,
            timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Every body shape the endpoint has been seen to return with a 2xx status.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChatResponse {
    Completion { choices: Vec<Choice> },
    Error { error: ApiErrorBody },
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

/// Pull the provider's own message out of a non-2xx body.
fn describe_error(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
}

/// Extract the script text from a decoded response body.
fn extract_script(response: ChatResponse) -> Result<String, UpstreamError> {
    let invalid = |message: String| UpstreamError::InvalidResponse {
        service: SERVICE,
        message,
    };

    match response {
        ChatResponse::Completion { choices } => {
            let Some(choice) = choices.into_iter().next() else {
                return Err(invalid("response contained no choices".to_string()));
            };
            let text = choice.message.content.unwrap_or_default();
            let text = text.trim();
            if text.is_empty() {
                return Err(invalid(format!(
                    "completion was empty (finish_reason: {})",
                    choice.finish_reason.as_deref().unwrap_or("none")
                )));
            }
            Ok(text.to_string())
        }
        ChatResponse::Error { error } => Err(invalid(format!(
            "error body with success status: {}",
            error.message
        ))),
        ChatResponse::Unrecognized(value) => {
            let keys: Vec<&str> = value
                .as_object()
                .map(|o| o.keys().map(String::as_str).collect())
                .unwrap_or_default();
            Err(invalid(format!(
                "unrecognized response shape (keys: [{}])",
                keys.join(", ")
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for an OpenAI-compatible chat-completion endpoint.
pub struct OpenAiScriptClient {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiScriptClient {
    /// Create a client whose requests are bounded by `config.timeout_secs`.
    pub fn new(config: OpenAiConfig) -> Result<Self, reqwest::Error> {
        let client = http::build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl ScriptGenerator for OpenAiScriptClient {
    async fn generate_script(&self, prompt: &str) -> Result<String, UpstreamError> {
        if self.config.api_key.is_empty() {
            return Err(UpstreamError::Rejected {
                service: SERVICE,
                status: None,
                message: "OPENAI_API_KEY is not configured".to_string(),
            });
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let timeout = self.config.timeout_secs;

        tracing::debug!(model = %self.config.model, "Requesting script completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::classify(SERVICE, timeout, e))?;

        let response = http::ensure_success(SERVICE, response, describe_error).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| http::classify(SERVICE, timeout, e))?;

        extract_script(body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
