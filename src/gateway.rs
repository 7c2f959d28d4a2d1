use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::GatewayConfig;
use crate::idea::{ideas_payload_typedef, IDEAS_TOOL_DESCRIPTION, IDEAS_TOOL_NAME};
use crate::prompt::{Mode, PromptPair};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway credential is not configured")]
    NotConfigured,

    #[error("gateway rate limited the request")]
    RateLimited,

    #[error("gateway credits exhausted")]
    CreditsExhausted,

    #[error("gateway HTTP error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway response was not valid JSON: {0}")]
    Decode(String),
}

// Request wire format (OpenAI-compatible chat completions)

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionName {
    pub name: String,
}

impl ChatRequest {
    /// Build the request body for a prompt pair. Structured prompts carry the
    /// idea tool and a `tool_choice` pinning the model to it.
    pub fn from_prompt(prompt: &PromptPair, model: &str) -> Self {
        let messages = vec![
            ChatMessage {
                role: "system".into(),
                content: prompt.system.clone(),
            },
            ChatMessage {
                role: "user".into(),
                content: prompt.user.clone(),
            },
        ];

        let (tools, tool_choice) = match prompt.mode {
            Mode::Narrative => (None, None),
            Mode::Structured => (
                Some(vec![ToolSpec {
                    kind: "function".into(),
                    function: FunctionSpec {
                        name: IDEAS_TOOL_NAME.into(),
                        description: IDEAS_TOOL_DESCRIPTION.into(),
                        parameters: ideas_payload_typedef().to_json_schema(),
                    },
                }]),
                Some(ToolChoice {
                    kind: "function".into(),
                    function: FunctionName {
                        name: IDEAS_TOOL_NAME.into(),
                    },
                }),
            ),
        };

        Self {
            model: model.to_string(),
            messages,
            tools,
            tool_choice,
        }
    }
}

// Response wire format. Everything is optional so that a thin response is an
// extraction failure rather than a decode failure.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// A chat-completion backend. One call, one full response, no streaming.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError>;

    fn model_name(&self) -> &str;
}

#[derive(Clone)]
pub struct HttpGateway {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    rate_limit_retries: u32,
    retry_base_delay: Duration,
}

impl HttpGateway {
    /// Fails with `NotConfigured` when the credential is absent, before any
    /// network activity.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GatewayError::NotConfigured)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            rate_limit_retries: config.rate_limit_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let resp = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.base_url, error = %e, "gateway request failed");
                GatewayError::Transport(e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = status.as_u16(),
                body = %truncate(&body, 500),
                "gateway returned an error"
            );
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => GatewayError::CreditsExhausted,
                _ => GatewayError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, body = %truncate(&text, 500), "gateway body did not decode");
            GatewayError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl ChatGateway for HttpGateway {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        let mut attempt = 0u32;
        loop {
            debug!(
                model = %request.model,
                attempt,
                tools = request.tools.is_some(),
                "calling gateway"
            );
            match self.send_once(request).await {
                Err(GatewayError::RateLimited) if attempt < self.rate_limit_retries => {
                    let delay = self.retry_base_delay.saturating_mul(2u32.saturating_pow(attempt));
                    warn!(attempt, ?delay, "gateway rate limited, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Ok(resp) => {
                    info!(choices = resp.choices.len(), "gateway call completed");
                    return Ok(resp);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
