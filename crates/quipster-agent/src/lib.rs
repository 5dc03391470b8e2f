//! Reply pipeline for Quipster.
//!
//! This crate turns a chat message into a sanitized model reply:
//!
//! ```text
//! text ─> CooldownGate ─> input filter ─> PromptBuilder ─> InferenceClient ─> Sanitizer ─> reply
//!                                                           (model fallback)
//! ```
//!
//! ## Modules
//!
//! - [`cooldown`] -- Per-scope rate gate.
//! - [`prompt`] -- Persona and style prompt assembly.
//! - [`llm`] -- Provider adapters and the inference client with fallback.
//! - [`sanitize`] -- Output word replacement, banned-content filter, length cap.
//! - [`orchestrator`] -- Composes the above; the error-to-text boundary.
//! - [`error`] -- Pipeline error types.

pub mod cooldown;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod sanitize;

// Re-export the most commonly used types at the crate root.
pub use cooldown::{CooldownGate, DEFAULT_COOLDOWN, Scope};
pub use error::{AgentError, Result};
pub use llm::{
    DEFAULT_FALLBACK_MODELS, DEFAULT_MODEL, DEFAULT_TIMEOUT, GenerationRequest, InferenceClient,
    InferenceConfig, Message, ProbeReport, Provider, Role, SamplingParams, candidate_models,
};
pub use orchestrator::{Notices, ReplyOrchestrator};
pub use prompt::{DEFAULT_PERSONA, DEFAULT_STYLE, PromptBuilder};
pub use sanitize::{Replacement, Sanitizer, SanitizerConfig, truncate_chars};
