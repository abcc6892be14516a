//! Gemini `generateContent` wire types and the `ModelClient` seam.
//!
//! Every stage and the chat assistant talk to the provider through
//! `ModelClient`, so tests swap in `MockModelClient` without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::GeminiError;

pub const JSON_MIME_TYPE: &str = "application/json";

// ──────────────────────────────────────────────
// Request model
// ──────────────────────────────────────────────

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// Inline binary payload (base64 encoded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One part of a turn: text or inline data.
///
/// `thought` is set by reasoning models on their internal reasoning parts;
/// those are never part of the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn inline(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: base64_data.into(),
            }),
            ..Self::default()
        }
    }
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
        }
    }
}

/// How the model is asked to format its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// Provider-independent description of one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

impl GenerateRequest {
    /// Single user turn asking for a JSON-only answer.
    pub fn json(model: &str, parts: Vec<Part>, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            system_instruction: None,
            contents: vec![Content::user(parts)],
            temperature: Some(temperature),
            response_format: ResponseFormat::Json,
        }
    }

    /// All text parts of all turns, joined. Handy for assertions and logging.
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Model provider abstraction (allows mocking).
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one generation and return the answer text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GeminiError>;
}

// ──────────────────────────────────────────────
// Wire bodies
// ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentBody<'a> {
    pub contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct SystemInstruction {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<&'static str>,
}

impl<'a> GenerateContentBody<'a> {
    pub fn from_request(request: &'a GenerateRequest) -> Self {
        Self {
            contents: &request.contents,
            system_instruction: request.system_instruction.as_ref().map(|text| {
                SystemInstruction {
                    parts: vec![Part::text(text.clone())],
                }
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: match request.response_format {
                    ResponseFormat::Json => Some(JSON_MIME_TYPE),
                    ResponseFormat::Text => None,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Answer text of the first candidate, with reasoning parts removed.
    pub fn answer_text(self) -> Result<String, GeminiError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GeminiError::Blocked(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or(GeminiError::EmptyResponse)?;

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.unwrap_or_default();
            let blocked = matches!(reason.as_str(), "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST");
            return if blocked {
                Err(GeminiError::Blocked(reason))
            } else {
                Err(GeminiError::EmptyResponse)
            };
        }

        Ok(text)
    }
}
