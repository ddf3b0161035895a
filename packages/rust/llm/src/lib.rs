//! Language-model clients used by the synthesis pipeline.
//!
//! The pipeline only needs "prompt in, text out". [`OpenRouterClient`] talks
//! to an OpenAI-compatible chat-completions endpoint; [`DisabledModel`]
//! always fails so every model-backed section takes its fallback path.

use std::time::Duration;

use async_trait::async_trait;
use interviewprep_shared::{AppConfig, InterviewPrepError, OpenRouterConfig, Result, validate_api_key};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("InterviewPrep/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed back in a `ModelCall` error.
const MAX_ERROR_BODY_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A text-completion backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier shown in logs.
    fn model_name(&self) -> &str;

    /// Send one user prompt and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// OpenRouter
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenRouter (or any OpenAI-compatible) chat completions.
pub struct OpenRouterClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenRouterClient {
    pub fn new(config: &OpenRouterConfig, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                InterviewPrepError::Connectivity(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.default_model.clone(),
            temperature: config.temperature,
        })
    }

    /// Build from the app config, reading the API key from its env var.
    pub fn from_config(config: &AppConfig, timeout: Duration) -> Result<Self> {
        let api_key = validate_api_key(config)?;
        Self::new(&config.openrouter, api_key, timeout)
    }

    /// Override the model (e.g. from `--model`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl ModelClient for OpenRouterClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!(endpoint = %self.endpoint, "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InterviewPrepError::ModelCall(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InterviewPrepError::ModelCall(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(InterviewPrepError::ModelCall(format!("HTTP {status}: {snippet}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| InterviewPrepError::ModelCall(format!("invalid response JSON: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(InterviewPrepError::ModelCall("empty completion".into()));
        }

        debug!(reply_chars = content.len(), "completion received");
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Disabled
// ---------------------------------------------------------------------------

/// Model stand-in for offline runs. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledModel;

#[async_trait]
impl ModelClient for DisabledModel {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(InterviewPrepError::ModelCall("model calls are disabled (offline mode)".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenRouterClient {
        let config = OpenRouterConfig {
            base_url: format!("{}/api/v1/", server.uri()),
            ..OpenRouterConfig::default()
        };
        OpenRouterClient::new(&config, "sk-test", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "google/gemini-flash-1.5",
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "Overview\n\nText" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server).complete("hello").await.unwrap();
        assert_eq!(reply, "Overview\n\nText");
    }

    #[tokio::test]
    async fn http_error_is_model_call_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = client(&server).complete("hello").await.unwrap_err();
        assert!(matches!(err, InterviewPrepError::ModelCall(_)));
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn empty_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        assert!(client(&server).complete("hello").await.is_err());
    }

    #[tokio::test]
    async fn blank_content_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "   " } }]
            })))
            .mount(&server)
            .await;

        assert!(client(&server).complete("hello").await.is_err());
    }

    #[test]
    fn model_override() {
        let config = OpenRouterConfig::default();
        let client = OpenRouterClient::new(&config, "k", Duration::from_secs(1))
            .unwrap()
            .with_model("meta-llama/llama-3.1-8b-instruct");
        assert_eq!(client.model_name(), "meta-llama/llama-3.1-8b-instruct");
    }

    #[tokio::test]
    async fn disabled_model_always_fails() {
        assert!(DisabledModel.complete("anything").await.is_err());
    }
}
