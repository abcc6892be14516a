//! Strategy assistant: a stateful follow-up conversation about a finished
//! strategy document.
//!
//! The whole `StrategyResult` is serialized into the system instruction, so
//! every turn is answered against the same document. History sent to the
//! model holds only completed exchanges; the visible transcript also keeps
//! the greeting and any apology for a failed turn.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StratifyConfig;
use crate::models::StrategyResult;
use crate::pipeline::gemini::{
    Content, GeminiClient, GeminiError, GenerateRequest, ModelClient, Part, ResponseFormat,
};
use crate::pipeline::prompt::chat_system_instruction;

pub const GREETING: &str =
    "Hi! I can help you analyze this strategy. Ask me about risks, timeline conflicts, or suggest new OKRs.";
pub const APOLOGY: &str = "Sorry, I encountered an error connecting to the AI.";
pub const FALLBACK_REPLY: &str = "I'm not sure how to answer that.";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("API key is missing")]
    MissingCredential,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Could not serialize strategy: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Chat request failed: {0}")]
    Model(GeminiError),
}

impl From<GeminiError> for ChatError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingCredential => Self::MissingCredential,
            other => Self::Model(other),
        }
    }
}

// ═══════════════════════════════════════════
// Transcript types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One line of the visible transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Local::now(),
        }
    }
}

// ═══════════════════════════════════════════
// Session
// ═══════════════════════════════════════════

pub struct StrategyChat {
    client: Arc<dyn ModelClient>,
    model: String,
    system_instruction: String,
    history: Vec<Content>,
    transcript: Vec<ChatMessage>,
}

impl StrategyChat {
    /// Open a conversation about `strategy`. The transcript starts with the greeting.
    pub fn open(
        client: Arc<dyn ModelClient>,
        model: impl Into<String>,
        strategy: &StrategyResult,
    ) -> Result<Self, ChatError> {
        let document = serde_json::to_string_pretty(strategy)?;
        Ok(Self {
            client,
            model: model.into(),
            system_instruction: chat_system_instruction(&document),
            history: Vec::new(),
            transcript: vec![ChatMessage::new(ChatRole::Model, GREETING)],
        })
    }

    /// Open against the live provider. Fails fast without an API key.
    pub fn from_config(config: &StratifyConfig, strategy: &StrategyResult) -> Result<Self, ChatError> {
        let client: Arc<dyn ModelClient> = Arc::new(GeminiClient::from_config(config)?);
        Self::open(client, config.chat_model.clone(), strategy)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// Number of completed exchanges.
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }

    /// Send a user message and return the reply.
    ///
    /// On failure the user message stays in the transcript followed by an
    /// apology, and the failed turn is not replayed to the model later.
    pub async fn send(&mut self, text: &str) -> Result<String, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        self.transcript.push(ChatMessage::new(ChatRole::User, text));
        let request = self.build_request(text);

        match self.client.generate(&request).await {
            Ok(reply) => {
                let reply = if reply.trim().is_empty() {
                    FALLBACK_REPLY.to_string()
                } else {
                    reply
                };
                self.history.push(Content::user(vec![Part::text(text)]));
                self.history.push(Content::model_text(reply.clone()));
                self.transcript.push(ChatMessage::new(ChatRole::Model, reply.clone()));
                tracing::debug!(turns = self.turns(), reply_len = reply.len(), "Chat reply");
                Ok(reply)
            }
            // The provider's "no text" answer is a normal turn with a fallback
            Err(GeminiError::EmptyResponse) => {
                self.history.push(Content::user(vec![Part::text(text)]));
                self.history.push(Content::model_text(FALLBACK_REPLY));
                self.transcript.push(ChatMessage::new(ChatRole::Model, FALLBACK_REPLY));
                Ok(FALLBACK_REPLY.to_string())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Chat request failed");
                self.transcript.push(ChatMessage::new(ChatRole::Model, APOLOGY));
                Err(err.into())
            }
        }
    }

    fn build_request(&self, text: &str) -> GenerateRequest {
        let mut contents = self.history.clone();
        contents.push(Content::user(vec![Part::text(text)]));
        GenerateRequest {
            model: self.model.clone(),
            system_instruction: Some(self.system_instruction.clone()),
            contents,
            temperature: None,
            response_format: ResponseFormat::Text,
        }
    }
}
