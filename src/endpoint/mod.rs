//! # Chat Endpoint Abstraction
//!
//! Every request the load generator sends goes through the `ChatEndpoint`
//! trait. Implementations turn one prompt into one chat-completion call and
//! normalize whatever wire shape the server returns into a `ChatResponse`, so
//! executors never branch on representation.
//!
//! ## Response Normalization
//!
//! OpenAI-compatible servers disagree on where generated text lives:
//!
//! - `choices[0].message.content` / `reasoning_content` (the common case)
//! - `choices[0].message.reasoning` instead of `reasoning_content`
//! - `content` as an array of `{ "type": "text", "text": ... }` parts
//! - legacy completion shape `choices[0].text`
//!
//! `ChatResponse::from_json` tries the typed lookup first and only walks the
//! raw JSON for the alternate shapes when that yields neither content nor
//! reasoning.

use crate::config::ModelSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod openai;

pub use openai::{ChatMessage, ChatRequest, OpenAiEndpoint};

/// Failure of a single chat-completion call
///
/// Always recovered by the executor and recorded as a failed request; it
/// never aborts a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// Connection, TLS, or I/O failure before a complete response arrived
    #[error("request failed: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not valid JSON
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The body parsed but carried no completion choice
    #[error("response contained no choices")]
    EmptyChoices,
}

/// Normalized result of one chat-completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated answer text, empty when the server returned none
    pub content: String,

    /// Separate reasoning text, `None` when absent or empty
    pub reasoning: Option<String>,

    /// The response body as received
    pub raw: Value,
}

impl ChatResponse {
    /// Normalize a decoded response body
    ///
    /// ## Errors
    /// `EndpointError::EmptyChoices` when `choices` is missing or empty.
    pub fn from_json(raw: Value) -> Result<Self, EndpointError> {
        let has_choice = raw
            .get("choices")
            .and_then(Value::as_array)
            .is_some_and(|choices| !choices.is_empty());
        if !has_choice {
            return Err(EndpointError::EmptyChoices);
        }

        let (content, reasoning) = match structured_fields(&raw) {
            Some((content, reasoning)) if !content.is_empty() || reasoning.is_some() => {
                (content, reasoning)
            }
            _ => alternate_fields(&raw),
        };

        Ok(Self {
            content,
            reasoning,
            raw,
        })
    }
}

#[derive(Deserialize)]
struct CompletionBody {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

fn structured_fields(raw: &Value) -> Option<(String, Option<String>)> {
    let body = CompletionBody::deserialize(raw).ok()?;
    let message = body.choices.into_iter().next()?.message?;
    Some((
        message.content.unwrap_or_default(),
        message.reasoning_content.filter(|r| !r.is_empty()),
    ))
}

fn alternate_fields(raw: &Value) -> (String, Option<String>) {
    let choice = &raw["choices"][0];
    let message = &choice["message"];

    let mut content = text_of(&message["content"]);
    if content.is_empty() {
        content = text_of(&choice["text"]);
    }

    let mut reasoning = text_of(&message["reasoning_content"]);
    if reasoning.is_empty() {
        reasoning = text_of(&message["reasoning"]);
    }

    (content, Some(reasoning).filter(|r| !r.is_empty()))
}

/// Flatten a string or an array of text parts into one string.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                other => other.get("text").and_then(Value::as_str),
            })
            .collect(),
        _ => String::new(),
    }
}

/// A chat-completion endpoint the load generator can drive
///
/// Implementations must be shareable across executor tasks; the scheduler
/// holds one instance behind an `Arc` for the whole run.
#[async_trait]
pub trait ChatEndpoint: Send + Sync {
    /// Send one chat-completion request for `prompt`
    async fn call(
        &self,
        prompt: &str,
        settings: &ModelSettings,
    ) -> Result<ChatResponse, EndpointError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
