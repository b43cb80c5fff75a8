/// Access to text models served behind an OpenAI-compatible HTTP API.
///
/// Only two calls are needed: the list of served model ids, and a single-turn prompt
/// (instruction plus input text) answered by one chat completion. Calls are never
/// retried.
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8001/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_ERROR_BODY_BYTES: usize = 8 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointConfig {
    /// API root, without a trailing slash (e.g. `http://host:8001/v1`)
    pub base_url: String,
    pub timeout: Duration,
    /// Error bodies longer than this are cut before being reported
    pub max_error_body_bytes: usize,
}

impl EndpointConfig {
    /// `OPENAI_BASE_URL`, `OPENAI_TIMEOUT_SECS` and `OPENAI_MAX_ERROR_BODY_BYTES`;
    /// unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env_number("OPENAI_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS);
        let max_error_body_bytes =
            env_number("OPENAI_MAX_ERROR_BODY_BYTES").unwrap_or(DEFAULT_MAX_ERROR_BODY_BYTES);
        Self::new(&base_url, Duration::from_secs(timeout_secs), max_error_body_bytes)
    }

    pub fn new(base_url: &str, timeout: Duration, max_error_body_bytes: usize) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            timeout,
            max_error_body_bytes,
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx response carrying an OpenAI-style error object
    #[error("model endpoint rejected the request ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Non-2xx response with any other body
    #[error("model endpoint returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("model returned an empty reply")]
    EmptyReply,
}

/// One single-turn request: the instruction goes in the system message and the
/// input text in the user message.
#[derive(Debug, Clone)]
pub struct Prompt<'a> {
    pub instruction: &'a str,
    pub input: &'a str,
    pub max_tokens: Option<u32>,
}

#[derive(Clone)]
pub struct ModelEndpoint {
    config: EndpointConfig,
    http: reqwest::Client,
}

impl ModelEndpoint {
    pub fn new(config: EndpointConfig) -> Result<Self, EndpointError> {
        let http = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Ids of the models the endpoint currently serves.
    pub async fn served_models(&self) -> Result<Vec<String>, EndpointError> {
        let resp = self
            .http
            .get(format!("{}/models", self.config.base_url))
            .send()
            .await?;
        let list: ModelList = self.decode(resp).await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    /// Ask `model` to answer `prompt` and return the trimmed reply text.
    pub async fn prompt(&self, model: &str, prompt: &Prompt<'_>) -> Result<String, EndpointError> {
        let request = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: prompt.input,
                },
            ],
            temperature: 0.0,
            max_tokens: prompt.max_tokens,
        };
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .json(&request)
            .send()
            .await?;
        let reply: ChatResponse = self.decode(resp).await?;

        let text = reply
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();
        debug!(model, chars = text.len(), "model replied");
        if text.is_empty() {
            return Err(EndpointError::EmptyReply);
        }
        Ok(text)
    }

    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, EndpointError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let mut body = match resp.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(error = %e, "could not read model endpoint error body");
                String::new()
            }
        };
        if let Ok(ApiErrorBody { error }) = serde_json::from_str::<ApiErrorBody>(&body) {
            if let Some(message) = error.message {
                return Err(EndpointError::Api { status, message });
            }
        }
        truncate_at_char_boundary(&mut body, self.config.max_error_body_bytes);
        Err(EndpointError::Http { status, body })
    }
}

fn truncate_at_char_boundary(text: &mut String, max_bytes: usize) {
    if text.len() <= max_bytes {
        return;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorObject,
}

#[derive(Deserialize)]
struct ApiErrorObject {
    message: Option<String>,
}
