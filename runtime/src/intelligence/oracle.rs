//! Classification oracle: a chat-completions model that returns one label.

use crate::config::RunConfig;
use crate::error::OracleError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, warn};

/// Answers a classification question with a single free-text label.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Send a system prompt, a user message, and an optional PNG screenshot.
    /// Returns the trimmed reply.
    async fn classify(
        &self,
        system: &str,
        user: &str,
        image: Option<&[u8]>,
    ) -> Result<String, OracleError>;
}

/// OpenAI-compatible chat-completions oracle.
pub struct OpenAiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: crate::config::DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build from the run config. The key must be present.
    pub fn from_config(config: &RunConfig) -> Option<Self> {
        let key = config.api_key.as_deref()?;
        Some(Self::new(key, config.model.clone()).with_base_url(config.api_base.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn user_content(user: &str, image: Option<&[u8]>) -> Value {
    match image {
        None => Value::String(user.to_string()),
        Some(png) => json!([
            { "type": "text", "text": user },
            {
                "type": "image_url",
                "image_url": { "url": format!("data:image/png;base64,{}", BASE64.encode(png)) }
            }
        ]),
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn classify(
        &self,
        system: &str,
        user: &str,
        image: Option<&[u8]>,
    ) -> Result<String, OracleError> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                json!({ "role": "system", "content": system }),
                json!({ "role": "user", "content": user_content(user, image) }),
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "oracle request failed");
                OracleError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "oracle API error");
            return Err(OracleError::Api(format!("{status}: {error_text}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::Parse("no choices in response".into()))?
            .message
            .content
            .unwrap_or_default();

        debug!(
            model = %self.model,
            with_image = image.is_some(),
            duration_ms = start.elapsed().as_millis() as u64,
            "oracle reply received"
        );

        Ok(content.trim().to_string())
    }
}

/// Oracle for offline runs: every call fails with [`OracleError::Disabled`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOracle;

#[async_trait]
impl Oracle for DisabledOracle {
    async fn classify(&self, _: &str, _: &str, _: Option<&[u8]>) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }
}
