//! Persona prompt assembly.
//!
//! [`PromptBuilder::build`] is pure: the same user text always yields the
//! same [`GenerationRequest`].  User text is never trimmed or truncated here;
//! the provider enforces its own input limits.

use crate::llm::types::{GenerationRequest, Message, SamplingParams};

/// Built-in persona instruction.
pub const DEFAULT_PERSONA: &str = "You are an unfiltered, darkly humorous assistant with a \
     roast-comedian vibe. You use sharp wit and mild profanity for comedic effect. Replies \
     should be punchy, surprising, and under ~180 words unless asked for more. End with one \
     short zinger when it fits.";

/// Built-in style preface placed between the persona and the user text.
pub const DEFAULT_STYLE: &str = "Give a witty, edgy answer. If the question is mundane, pretend \
     it's life-or-death for comedy. Add one short zinger at the end if natural.";

/// Composes persona, style preface and user text into a request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
    style: String,
    params: SamplingParams,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA, DEFAULT_STYLE, SamplingParams::default())
    }
}

impl PromptBuilder {
    pub fn new(
        persona: impl Into<String>,
        style: impl Into<String>,
        params: SamplingParams,
    ) -> Self {
        Self {
            persona: persona.into(),
            style: style.into(),
            params,
        }
    }

    /// Build the request for `user_text`.
    pub fn build(&self, user_text: &str) -> GenerationRequest {
        let prompt = format!(
            "{}\n\n{}\nUser: {user_text}\nAssistant:",
            self.persona, self.style
        );
        let system = format!("{}\n\n{}", self.persona, self.style);

        GenerationRequest {
            prompt,
            messages: vec![Message::system(system), Message::user(user_text)],
            params: self.params,
        }
    }
}
