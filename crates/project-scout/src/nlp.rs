/// Model-backed text capabilities: abstractive summaries and keyword extraction.
///
/// The pipeline only sees the `Summarizer` and `KeywordExtractor` traits. The
/// implementations here send one prompt per call to a `ModelEndpoint`.
use std::sync::Arc;

use tracing::{info, warn};

use scout_common::openai::{ModelEndpoint, Prompt};

use crate::error::AppError;

/// Requested summary length, in words.
pub const SUMMARY_MIN_WORDS: u32 = 60;
pub const SUMMARY_MAX_WORDS: u32 = 100;

const KEYWORD_MAX_TOKENS: u32 = 120;
/// Task prefix the keyword models are trained on.
const KEYWORD_TASK_PREFIX: &str = "Keywords: ";

#[allow(async_fn_in_trait)]
pub trait Summarizer {
    async fn summarize(&self, text: &str) -> Result<String, AppError>;
}

#[allow(async_fn_in_trait)]
pub trait KeywordExtractor {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>, AppError>;
}

pub struct ChatSummarizer {
    endpoint: Arc<ModelEndpoint>,
    model: String,
}

impl ChatSummarizer {
    pub fn new(endpoint: Arc<ModelEndpoint>, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }
}

impl Summarizer for ChatSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, AppError> {
        let instruction = format!(
            "Write an abstractive summary of the user's text in {SUMMARY_MIN_WORDS} to \
             {SUMMARY_MAX_WORDS} words. Reply with the summary only."
        );
        let prompt = Prompt {
            instruction: &instruction,
            input: text,
            max_tokens: Some(SUMMARY_MAX_WORDS * 2),
        };
        let raw = self.endpoint.prompt(&self.model, &prompt).await?;
        Ok(clean_summary(&raw))
    }
}

pub struct ChatKeywordExtractor {
    endpoint: Arc<ModelEndpoint>,
    model: String,
}

impl ChatKeywordExtractor {
    pub fn new(endpoint: Arc<ModelEndpoint>, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }
}

impl KeywordExtractor for ChatKeywordExtractor {
    async fn extract_keywords(&self, text: &str) -> Result<Vec<String>, AppError> {
        let input = format!("{KEYWORD_TASK_PREFIX}{text}");
        let prompt = Prompt {
            instruction: "Reply with a comma-separated list of keywords describing the text.",
            input: &input,
            max_tokens: Some(KEYWORD_MAX_TOKENS),
        };
        let raw = self.endpoint.prompt(&self.model, &prompt).await?;
        Ok(parse_keyword_list(&raw))
    }
}

/// Split a comma-separated model reply into keywords: trimmed, non-empty, first
/// spelling kept for case-insensitive duplicates.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !out.iter().any(|k| k.to_lowercase() == keyword.to_lowercase()) {
            out.push(keyword.to_string());
        }
    }
    out
}

/// Some summarization models emit `<n>` for line breaks.
fn clean_summary(raw: &str) -> String {
    raw.replace("<n>", "\n").trim().to_string()
}

/// Warn about configured models the endpoint does not list. Never fails.
pub async fn check_models(endpoint: &ModelEndpoint, models: &[&str]) {
    let served = match endpoint.served_models().await {
        Ok(served) => served,
        Err(e) => {
            warn!(error = %e, "could not list models, continuing");
            return;
        }
    };
    for &model in models {
        if served.iter().any(|id| id == model) {
            info!(model, "model available");
        } else {
            warn!(
                model,
                base_url = endpoint.base_url(),
                "model not listed by endpoint, calls may fail"
            );
        }
    }
}
