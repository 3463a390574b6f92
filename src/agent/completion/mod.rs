#[cfg(test)]
mod tests;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ChatCompletion, ChatMessage};
use crate::config::CompletionConfig;
use crate::{RagError, Result};

/// Secret used as the bearer token; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read the key from environment variable `var`
    #[inline]
    pub fn from_env(var: &str) -> Result<Self> {
        match std::env::var(var) {
            Ok(value) => Self::from_value(var, &value),
            Err(_) => Err(RagError::Authentication(format!(
                "API key not found: set the {} environment variable",
                var
            ))),
        }
    }

    fn from_value(var: &str, value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RagError::Authentication(format!(
                "API key in {} is empty",
                var
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    #[inline]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Client for any endpoint speaking the OpenAI chat completions protocol
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    base_url: String,
    model: String,
    api_key: ApiKey,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleClient {
    #[inline]
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            agent,
        }
    }

    /// Build a client from the completion settings, reading the key from the environment
    #[inline]
    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        let api_key = ApiKey::from_env(config.api_key_env())?;
        Ok(Self::new(
            config.base_url(),
            &config.model,
            api_key,
            Duration::from_secs(config.timeout_seconds),
        ))
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn send(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };
        let body = serde_json::to_string(&request).map_err(|e| {
            RagError::Completion(format!("Failed to serialize completion request: {}", e))
        })?;

        let url = self.endpoint();
        debug!("Sending {} messages to {}", messages.len(), url);

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", &format!("Bearer {}", self.api_key.expose()))
            .header("Content-Type", "application/json")
            .send(&body)
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(transport_error)?;

        if !(200..300).contains(&status) {
            warn!("Completion request failed with status {}", status);
            return Err(status_error(status, &text));
        }

        Ok(text)
    }
}

impl ChatCompletion for OpenAiCompatibleClient {
    #[inline]
    fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let text = self.send(messages)?;
        let answer = parse_completion(&text)?;
        info!("Received completion of {} characters", answer.chars().count());
        Ok(answer)
    }
}

fn transport_error(error: ureq::Error) -> RagError {
    match error {
        ureq::Error::StatusCode(status) => status_error(status, ""),
        other => RagError::Network(other.to_string()),
    }
}

fn status_error(status: u16, body: &str) -> RagError {
    let detail = error_detail(body);
    let message = if detail.is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, detail)
    };

    match status {
        401 | 403 => RagError::Authentication(message),
        429 => RagError::RateLimit(message),
        _ => RagError::Completion(message),
    }
}

/// Provider error message from an `{"error": {"message": ..}}` body, or the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

fn parse_completion(text: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(text).map_err(|e| {
        RagError::Completion(format!("Failed to parse completion response: {}", e))
    })?;

    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RagError::Completion("Completion response has no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| RagError::Completion("Completion response has no content".to_string()))
}
