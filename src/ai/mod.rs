//! AI description-generator collaborator.
//!
//! On a first-ever sync, tables that neither the source nor the reference
//! catalog could describe are sent — as one batch — to an LLM endpoint
//! that returns a table-name → description mapping. Gaps in the reply are
//! tolerated: an undescribed table is not an error.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Result type for description generation.
pub type AiResult<T> = Result<T, AiError>;

/// Errors from the AI collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Http(String),

    #[error("AI response was not usable: {0}")]
    InvalidResponse(String),
}

/// Generates human-readable table descriptions in batch.
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    /// Describe the named tables. Tables absent from the returned map
    /// simply stay undescribed.
    async fn generate_table_descriptions(
        &self,
        table_names: &[String],
    ) -> AiResult<HashMap<String, String>>;
}

#[async_trait]
impl<T: DescriptionGenerator + ?Sized> DescriptionGenerator for std::sync::Arc<T> {
    async fn generate_table_descriptions(
        &self,
        table_names: &[String],
    ) -> AiResult<HashMap<String, String>> {
        (**self).generate_table_descriptions(table_names).await
    }
}

/// A generator that describes nothing; used when no AI endpoint is
/// configured.
#[derive(Debug, Default)]
pub struct NullDescriptionGenerator;

#[async_trait]
impl DescriptionGenerator for NullDescriptionGenerator {
    async fn generate_table_descriptions(
        &self,
        _table_names: &[String],
    ) -> AiResult<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

/// A fixed-answer generator for tests.
#[derive(Debug, Default)]
pub struct StaticDescriptionGenerator {
    answers: HashMap<String, String>,
}

impl StaticDescriptionGenerator {
    pub fn new(answers: HashMap<String, String>) -> Self {
        Self { answers }
    }
}

#[async_trait]
impl DescriptionGenerator for StaticDescriptionGenerator {
    async fn generate_table_descriptions(
        &self,
        table_names: &[String],
    ) -> AiResult<HashMap<String, String>> {
        Ok(table_names
            .iter()
            .filter_map(|name| {
                self.answers
                    .get(name)
                    .map(|desc| (name.clone(), desc.clone()))
            })
            .collect())
    }
}

/// Chat-completions response shape (the part we read).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Description generator backed by an OpenAI-style chat-completions
/// endpoint.
pub struct LlmDescriptionGenerator {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl LlmDescriptionGenerator {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn prompt(table_names: &[String]) -> String {
        format!(
            "These are tables in a relational database: {}.\n\
             For each table, write a one-sentence description of what it \
             likely contains.\n\
             Respond with a single JSON object mapping each table name to \
             its description.",
            table_names.join(", ")
        )
    }
}

#[async_trait]
impl DescriptionGenerator for LlmDescriptionGenerator {
    async fn generate_table_descriptions(
        &self,
        table_names: &[String],
    ) -> AiResult<HashMap<String, String>> {
        if table_names.is_empty() {
            return Ok(HashMap::new());
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "Return JSON only, no text."},
                {"role": "user", "content": Self::prompt(table_names)}
            ],
            "temperature": 0.2,
            "max_tokens": 500,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::Http(format!(
                "description endpoint returned status {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("");

        let answers = parse_description_reply(content)?;
        debug!(requested = table_names.len(), answered = answers.len(), "AI descriptions parsed");
        Ok(answers)
    }
}

/// Parse the model's reply into a name → description map.
///
/// Lenient on purpose: code fences are stripped, non-string values are
/// skipped, and an empty object is a valid (if unhelpful) answer.
fn parse_description_reply(content: &str) -> AiResult<HashMap<String, String>> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| AiError::InvalidResponse(format!("reply was not JSON: {}", e)))?;

    let object = value
        .as_object()
        .ok_or_else(|| AiError::InvalidResponse("reply was not a JSON object".to_string()))?;

    Ok(object
        .iter()
        .filter_map(|(name, desc)| desc.as_str().map(|d| (name.clone(), d.to_string())))
        .collect())
}
