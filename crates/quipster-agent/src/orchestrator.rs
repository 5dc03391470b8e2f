//! Reply orchestration.
//!
//! [`ReplyOrchestrator`] composes the cooldown gate, the optional input
//! filter, the prompt builder, the inference client and the sanitizer into a
//! single "scope + user text in, reply text out" operation.
//!
//! Per invocation:
//!
//! ```text
//! RECEIVED -> GATE_CHECK -+-> REJECTED
//!                         +-> FILTER_CHECK -+-> REJECTED
//!                                           +-> CALLING -+-> SUCCEEDED
//!                                                        +-> FAILED
//! ```
//!
//! The only state that outlives an invocation is the gate's timestamp for
//! the scope.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cooldown::{CooldownGate, Scope};
use crate::error::{AgentError, Result};
use crate::llm::client::InferenceClient;
use crate::prompt::PromptBuilder;
use crate::sanitize::{Sanitizer, truncate_chars};

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// User-facing notices for rejections and failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notices {
    /// Sent when the scope is on cooldown.
    pub cooldown: String,
    /// Sent when the input matched the content filter.
    pub content_rejected: String,
    /// Sent when the model produced nothing printable.
    pub empty_reply: String,
    /// Prefix for inference failures; followed by the error text.
    pub error_prefix: String,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            cooldown: "Whoa, pace yourself ⏳".into(),
            content_rejected: "Nope. Not touching that one.".into(),
            empty_reply: "…brain buffering…".into(),
            error_prefix: "LLM error".into(),
        }
    }
}

impl Notices {
    /// Convert a pipeline error to the text shown in chat, capped at
    /// `max_chars`.
    pub fn render(&self, err: &AgentError, max_chars: usize) -> String {
        match err {
            AgentError::GateRejected { .. } => self.cooldown.clone(),
            AgentError::ContentRejected => self.content_rejected.clone(),
            other => truncate_chars(&format!("{}: {other}", self.error_prefix), max_chars),
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Produces sanitized replies for chat events.
#[derive(Debug, Clone)]
pub struct ReplyOrchestrator {
    gate: CooldownGate,
    prompts: PromptBuilder,
    client: InferenceClient,
    sanitizer: Sanitizer,
    filter_input: bool,
    notices: Notices,
}

impl ReplyOrchestrator {
    /// Create an orchestrator with the default gate window, persona and
    /// notices.  Input filtering is enabled.
    pub fn new(client: InferenceClient, sanitizer: Sanitizer) -> Self {
        Self {
            gate: CooldownGate::default(),
            prompts: PromptBuilder::default(),
            client,
            sanitizer,
            filter_input: true,
            notices: Notices::default(),
        }
    }

    pub fn with_gate(mut self, gate: CooldownGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_notices(mut self, notices: Notices) -> Self {
        self.notices = notices;
        self
    }

    /// Enable or disable rejecting banned input before inference.
    pub fn with_input_filter(mut self, enabled: bool) -> Self {
        self.filter_input = enabled;
        self
    }

    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    // -----------------------------------------------------------------------
    // Stages
    // -----------------------------------------------------------------------

    /// Run the admission checks: cooldown gate, then the input filter when
    /// enabled.  An admitted request has consumed the scope's window.
    pub fn admit(&self, scope: &Scope, user_text: &str) -> Result<()> {
        if self.gate.check_and_mark_now(scope) {
            return Err(AgentError::GateRejected {
                scope: scope.to_string(),
            });
        }

        if self.filter_input && !self.sanitizer.is_clean(user_text) {
            info!(scope = %scope, "input rejected by content filter");
            return Err(AgentError::ContentRejected);
        }

        Ok(())
    }

    /// Build the request, call the inference client and sanitize the reply.
    /// Does not consult the gate.
    pub async fn respond(&self, user_text: &str) -> Result<String> {
        let request = self.prompts.build(user_text);
        let raw = self.client.generate(&request).await?;
        Ok(self.sanitizer.sanitize(&raw))
    }

    /// [`admit`](Self::admit) followed by [`respond`](Self::respond).
    pub async fn try_reply(&self, scope: &Scope, user_text: &str) -> Result<String> {
        self.admit(scope, user_text)?;
        debug!(scope = %scope, chars = user_text.chars().count(), "request admitted");
        self.respond(user_text).await
    }

    // -----------------------------------------------------------------------
    // Boundary
    // -----------------------------------------------------------------------

    /// Reply to `user_text` in `scope`.  Never fails: rejections become short
    /// notices and inference failures become diagnostic text.
    pub async fn reply(&self, scope: &Scope, user_text: &str) -> String {
        let outcome = self.try_reply(scope, user_text).await;
        self.finish(scope, outcome)
    }

    /// Turn an outcome into the text sent to chat.
    pub fn finish(&self, scope: &Scope, outcome: Result<String>) -> String {
        match outcome {
            Ok(text) if text.is_empty() => self.notices.empty_reply.clone(),
            Ok(text) => text,
            Err(err) => {
                if !err.is_rejection() {
                    warn!(scope = %scope, error = %err, "reply failed");
                }
                self.render(&err)
            }
        }
    }

    /// Display text for `err`.
    pub fn render(&self, err: &AgentError) -> String {
        self.notices.render(err, self.sanitizer.max_chars())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
