//! Core types for inference requests.
//!
//! These types are provider-agnostic; [`super::provider`] translates them
//! into provider-specific wire formats.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// The role of a participant in a chat-style request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona and style instructions.
    System,
    /// Text typed by the chat user.
    User,
}

/// A single message in a chat-style request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Decoding parameters sent with every generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
    pub temperature: f32,
    /// Nucleus-sampling cutoff.
    pub top_p: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 220,
            temperature: 0.9,
            top_p: 0.9,
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A fully composed generation request.
///
/// Carries both the flattened completion prompt and the equivalent chat
/// message list so that either provider shape can be produced from it.
/// Streaming is never requested.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Persona, style preface and user text flattened into one prompt.
    pub prompt: String,
    /// `[system, user]` form of the same content.
    pub messages: Vec<Message>,
    pub params: SamplingParams,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Outcome of a single diagnostic call against the primary model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub model: String,
    pub url: String,
    pub status: u16,
    pub ok: bool,
    pub body_snippet: String,
}

impl ProbeReport {
    /// Pretty-printed JSON form, as shown to operators.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
