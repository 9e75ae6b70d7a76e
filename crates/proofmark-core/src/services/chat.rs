//! Text correction through an OpenAI-compatible chat completion endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::TextCorrector;
use super::http::decode_response;
use crate::config::CorrectionConfig;
use crate::error::{ServiceError, ServiceResult};

const SERVICE: &str = "correction";

/// Instructions sent with every request. The model may repair the text but
/// not rewrite it.
const SYSTEM_PROMPT: &str = "\
You are a grammar correction engine.

STRICT RULES:
- Fix ONLY grammar, spelling, capitalization, commas, punctuation
- Do NOT rephrase
- Do NOT improve style
- Do NOT change sentence structure
- Do NOT add or remove sentences
- Preserve original wording as much as possible

Return ONLY the corrected text.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    top_p: f32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Corrector backed by a chat completion API.
#[derive(Debug, Clone)]
pub struct ChatCorrector {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key_env: String,
    api_key: Option<String>,
}

impl ChatCorrector {
    /// Create a corrector from configuration. The API key is read from the
    /// configured environment variable on each call.
    pub fn from_config(client: reqwest::Client, config: &CorrectionConfig) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key: None,
        }
    }

    /// Use `key` instead of reading the environment.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn api_key(&self) -> ServiceResult<String> {
        if let Some(ref key) = self.api_key {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env).map_err(|_| ServiceError::MissingApiKey {
            var: self.api_key_env.clone(),
        })
    }
}

#[async_trait]
impl TextCorrector for ChatCorrector {
    fn name(&self) -> &str {
        SERVICE
    }

    #[tracing::instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn correct(&self, text: &str) -> ServiceResult<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let key = self.api_key()?;
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            top_p: 1.0,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&request)
            .send()
            .await?;

        let parsed: ChatResponse = decode_response(SERVICE, response).await?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Decode {
                service: SERVICE,
                message: "response has no message content".to_string(),
            })?;

        tracing::debug!(corrected_len = content.len(), "correction received");
        Ok(content.trim().to_string())
    }
}
