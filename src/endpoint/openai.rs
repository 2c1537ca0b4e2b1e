//! OpenAI-compatible HTTP endpoint

use super::{ChatEndpoint, ChatResponse, EndpointError};
use crate::config::ModelSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Chat-completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    pub max_tokens: u32,
    pub chat_template_kwargs: TemplateKwargs,
}

/// Message in a chat conversation
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Engine-specific chat template switches (vLLM / SGLang style)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TemplateKwargs {
    pub enable_thinking: bool,
}

impl<'a> ChatRequest<'a> {
    /// Build the body for one prompt: fixed system message, then the user prompt
    pub fn new(prompt: &'a str, settings: &'a ModelSettings) -> Self {
        Self {
            model: &settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &settings.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: settings.temperature,
            top_p: settings.top_p,
            top_k: settings.top_k,
            max_tokens: settings.max_tokens,
            chat_template_kwargs: TemplateKwargs {
                enable_thinking: settings.enable_thinking,
            },
        }
    }
}

/// Chat endpoint speaking the OpenAI `/chat/completions` protocol
#[derive(Debug, Clone)]
pub struct OpenAiEndpoint {
    client: Client,
    url: String,
    api_key: String,
}

impl OpenAiEndpoint {
    /// Create an endpoint for `settings.base_url`
    ///
    /// No request timeout is configured: a slow request is measured for as
    /// long as it takes.
    pub fn new(settings: &ModelSettings) -> Result<Self, EndpointError> {
        let client = Client::builder()
            .user_agent(concat!("chat-loadgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EndpointError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: Self::chat_url(&settings.base_url),
            api_key: settings.api_key.clone(),
        })
    }

    /// Get the chat completions endpoint URL
    fn chat_url(base_url: &str) -> String {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Render an error together with its source chain, e.g.
/// "error sending request: connection refused".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[async_trait]
impl ChatEndpoint for OpenAiEndpoint {
    async fn call(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<ChatResponse, EndpointError> {
        let body = ChatRequest::new(prompt, settings);

        let mut request = self.client.post(&self.url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EndpointError::Transport(error_chain(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EndpointError::Transport(error_chain(&e)))?;
        debug!("{} answered {} ({} bytes)", self.url, status, text.len());

        if !status.is_success() {
            return Err(EndpointError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw: Value =
            serde_json::from_str(&text).map_err(|e| EndpointError::Decode(e.to_string()))?;
        ChatResponse::from_json(raw)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn settings_for(base_url: String) -> ModelSettings {
        ModelSettings {
            base_url,
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            temperature: 0.5,
            top_p: 0.75,
            top_k: None,
            max_tokens: 64,
            enable_thinking: false,
        }
    }

    #[test]
    fn test_chat_url() {
        assert_eq!(
            OpenAiEndpoint::chat_url("http://localhost:8000/v1"),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            OpenAiEndpoint::chat_url("http://localhost:8000/v1/"),
            "http://localhost:8000/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let mut settings = settings_for("http://unused".to_string());
        settings.top_k = Some(20);

        let body = serde_json::to_value(ChatRequest::new("ping", &settings)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "test-model",
                "messages": [
                    { "role": "system", "content": "You are a helpful assistant." },
                    { "role": "user", "content": "ping" }
                ],
                "temperature": 0.5,
                "top_p": 0.75,
                "top_k": 20,
                "max_tokens": 64,
                "chat_template_kwargs": { "enable_thinking": false }
            })
        );
    }

    #[test]
    fn test_top_k_omitted_when_unset() {
        let settings = settings_for("http://unused".to_string());
        let body = serde_json::to_value(ChatRequest::new("ping", &settings)).unwrap();
        assert!(body.get("top_k").is_none());
    }

    #[tokio::test]
    async fn call_posts_expected_payload_and_headers() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("Authorization", "Bearer test-key")
                    .json_body(json!({
                        "model": "test-model",
                        "messages": [
                            { "role": "system", "content": "You are a helpful assistant." },
                            { "role": "user", "content": "ping" }
                        ],
                        "temperature": 0.5,
                        "top_p": 0.75,
                        "max_tokens": 64,
                        "chat_template_kwargs": { "enable_thinking": false }
                    }));
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "content": "pong", "reasoning_content": "because" } }
                    ]
                }));
            })
            .await;

        let settings = settings_for(server.url("/v1"));
        let endpoint = OpenAiEndpoint::new(&settings).unwrap();
        let response = endpoint.call("ping", &settings).await.unwrap();

        assert_eq!(response.content, "pong");
        assert_eq!(response.reasoning.as_deref(), Some("because"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn call_maps_non_success_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(503).body("model is overloaded");
            })
            .await;

        let settings = settings_for(server.url("/v1"));
        let endpoint = OpenAiEndpoint::new(&settings).unwrap();
        let err = endpoint.call("ping", &settings).await.unwrap_err();

        assert_eq!(
            err,
            EndpointError::Status {
                status: 503,
                body: "model is overloaded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn call_maps_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).body("not json");
            })
            .await;

        let settings = settings_for(server.url("/v1"));
        let endpoint = OpenAiEndpoint::new(&settings).unwrap();
        let err = endpoint.call("ping", &settings).await.unwrap_err();

        assert!(matches!(err, EndpointError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn call_maps_connection_failure() {
        // Reserve a port, then free it so nothing is listening there.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let settings = settings_for(format!("http://127.0.0.1:{}/v1", port));
        let endpoint = OpenAiEndpoint::new(&settings).unwrap();
        let err = endpoint.call("ping", &settings).await.unwrap_err();

        match err {
            EndpointError::Transport(message) => assert!(!message.is_empty()),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn call_without_api_key_sends_no_authorization() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header_missing("Authorization");
                then.status(200)
                    .json_body(json!({ "choices": [ { "message": { "content": "ok" } } ] }));
            })
            .await;

        let mut settings = settings_for(server.url("/v1"));
        settings.api_key.clear();
        let endpoint = OpenAiEndpoint::new(&settings).unwrap();
        let response = endpoint.call("ping", &settings).await.unwrap();

        assert_eq!(response.content, "ok");
        mock.assert_async().await;
    }
}
