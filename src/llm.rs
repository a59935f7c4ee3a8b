//! Response generation client
//!
//! Adapter over the OpenAI Chat Completions API. The conversation turns are
//! sent exactly in store order (oldest first), optionally preceded by a
//! system prompt; the upstream model is stateless per call and relies
//! entirely on that order for context.

use async_trait::async_trait;

use crate::config::UPSTREAM_TIMEOUT;
use crate::conversation::Turn;
use crate::pipeline::Responder;
use crate::{Error, Result};

#[derive(serde::Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Generates assistant replies from the conversation history
pub struct ChatResponder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    system_prompt: Option<String>,
}

impl ChatResponder {
    /// Create a chat responder
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built.
    pub fn new(
        api_key: String,
        model: String,
        max_tokens: u32,
        system_prompt: Option<String>,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for chat".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()?,
            api_key,
            model,
            max_tokens,
            system_prompt,
        })
    }
}

#[async_trait]
impl Responder for ChatResponder {
    async fn respond(&self, turns: &[Turn]) -> Result<String> {
        tracing::debug!(turns = turns.len(), model = %self.model, "generating response");

        let mut messages = Vec::with_capacity(turns.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: prompt,
            });
        }
        for turn in turns {
            messages.push(ChatMessage {
                role: match turn.role {
                    crate::conversation::Role::User => "user",
                    crate::conversation::Role::Assistant => "assistant",
                },
                content: &turn.content,
            });
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat request failed");
                Error::Response(format!("chat request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Response(format!("chat API error {status}: {body}")));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat response");
            Error::Response(format!("invalid chat response: {e}"))
        })?;

        let reply = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Response("no choices in chat response".to_string()))?;

        tracing::info!(chars = reply.len(), "response generated");
        Ok(reply)
    }
}
