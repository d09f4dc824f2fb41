//! Summarization backends.
//!
//! [`ChatBackend`] talks to an OpenAI-style chat-completions endpoint and
//! demands strict JSON sections back; anything else is a
//! [`BackendError::MalformedOutput`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::models::SummarySections;
use crate::utils::HttpClient;

/// Errors from a summarization backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Http(String),

    #[error("Backend returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Backend output malformed: {0}")]
    MalformedOutput(String),
}

/// A backend that turns a title and abstract into summary sections
#[async_trait]
pub trait SummaryBackend: Send + Sync + std::fmt::Debug {
    /// Identity of the underlying model
    fn model(&self) -> &str;

    async fn generate(
        &self,
        title: &str,
        abstract_text: &str,
    ) -> Result<SummarySections, BackendError>;
}

/// Chat-completions backend (Groq, OpenAI and compatibles)
#[derive(Debug)]
pub struct ChatBackend {
    client: HttpClient,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatBackend {
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: HttpClient::with_timeout(
                concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
                timeout,
            ),
            api_url: api_url.into(),
            api_key,
            model: model.into(),
        }
    }

    fn prompt(title: &str, abstract_text: &str) -> String {
        format!(
            "Title: {title}\n\nAbstract: {abstract_text}\n\n\
             Analyze this research paper and respond in JSON with these exact fields:\n\n\
             {{\n\
             \x20 \"key_findings\": [\"Finding 1\", \"Finding 2\", \"Finding 3\"],\n\
             \x20 \"methodology\": \"Brief description of the research methods used\",\n\
             \x20 \"impact\": \"Why this work matters and where it applies\",\n\
             \x20 \"conclusion\": \"The paper's main takeaway\"\n\
             }}\n\n\
             Provide only the JSON, no additional text."
        )
    }
}

/// Strip a markdown code fence if the model wrapped its JSON in one
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if let Some(rest) = trimmed.split("```json").nth(1) {
        return rest.split("```").next().unwrap_or(rest).trim();
    }
    if let Some(rest) = trimmed.split("```").nth(1) {
        return rest.trim();
    }
    trimmed
}

fn parse_sections(content: &str) -> Result<SummarySections, BackendError> {
    let body = strip_fences(content);
    let parsed: ParsedSections = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedOutput(format!("JSON: {e}")))?;

    if parsed.key_findings.is_empty()
        || parsed.methodology.trim().is_empty()
        || parsed.impact.trim().is_empty()
        || parsed.conclusion.trim().is_empty()
    {
        return Err(BackendError::MalformedOutput(
            "one or more sections empty".to_string(),
        ));
    }

    Ok(SummarySections {
        key_findings: parsed.key_findings,
        methodology: parsed.methodology,
        impact: parsed.impact,
        conclusion: parsed.conclusion,
    })
}

#[derive(Debug, Deserialize)]
struct ParsedSections {
    #[serde(default)]
    key_findings: Vec<String>,
    #[serde(default)]
    methodology: String,
    #[serde(default)]
    impact: String,
    #[serde(default)]
    conclusion: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl SummaryBackend for ChatBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        title: &str,
        abstract_text: &str,
    ) -> Result<SummarySections, BackendError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a research paper summarization expert. \
                                Provide clear, accurate summaries in JSON format.",
                },
                {"role": "user", "content": Self::prompt(title, abstract_text)},
            ],
            "temperature": 0.3,
            "max_tokens": 2000,
        });

        let mut request = self.client.client().post(&self.api_url).json(&payload);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BackendError::Status(response.status()));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::MalformedOutput(format!("envelope: {e}")))?;

        let content = data
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| BackendError::MalformedOutput("no choices".to_string()))?;

        parse_sections(content)
    }
}
