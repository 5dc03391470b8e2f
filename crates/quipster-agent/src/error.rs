//! Agent error types.
//!
//! Every failure in the reply pipeline surfaces through [`AgentError`].  The
//! variants form a closed set; they are turned into user-visible text only at
//! the orchestrator boundary (see [`crate::orchestrator::Notices::render`]).

/// Unified error type for the reply pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- Admission -----------------------------------------------------------
    /// The scope made an accepted request less than one cooldown window ago.
    #[error("scope {scope} is on cooldown")]
    GateRejected { scope: String },

    /// The user text matched the banned-content filter.
    #[error("input rejected by content filter")]
    ContentRejected,

    // -- Inference -----------------------------------------------------------
    /// Connection failure or timeout while calling the provider.
    #[error("transport error calling {model}: {reason}")]
    TransportError { model: String, reason: String },

    /// The provider answered with a non-success HTTP status.
    #[error("provider error {status} for {model}: {body}")]
    ProviderError {
        model: String,
        status: u16,
        body: String,
    },

    /// The provider answered 2xx but the body matched no known shape.
    #[error("unrecognised response from {model}: {raw}")]
    ParseError { model: String, raw: String },

    /// Every candidate model was tried and none produced a reply.
    #[error("InferenceExhausted after {attempts} candidate(s): {last}")]
    InferenceExhausted {
        attempts: usize,
        last: Box<AgentError>,
    },

    // -- Configuration -------------------------------------------------------
    /// The API key is missing for a provider that requires one.
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },

    /// Configuration validation failed.
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    // -- Serialization -------------------------------------------------------
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Whether this failure will reproduce identically on every candidate
    /// model, so the fallback loop should stop instead of moving on.
    ///
    /// Only authorization-class provider statuses qualify: the credential is
    /// shared by all candidates.
    pub fn is_fatal_for_all_candidates(&self) -> bool {
        matches!(self, Self::ProviderError { status: 401 | 403, .. })
    }

    /// Whether this is an admission rejection (cooldown or content filter)
    /// rather than a failure of the inference step.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::GateRejected { .. } | Self::ContentRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(status: u16) -> AgentError {
        AgentError::ProviderError {
            model: "m".into(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn auth_statuses_are_fatal() {
        assert!(provider(401).is_fatal_for_all_candidates());
        assert!(provider(403).is_fatal_for_all_candidates());
    }

    #[test]
    fn other_statuses_move_on() {
        for status in [400, 404, 408, 429, 500, 502, 503] {
            assert!(!provider(status).is_fatal_for_all_candidates(), "{status}");
        }
        let transport = AgentError::TransportError {
            model: "m".into(),
            reason: "timed out".into(),
        };
        assert!(!transport.is_fatal_for_all_candidates());
    }

    #[test]
    fn exhausted_display_names_the_condition() {
        let err = AgentError::InferenceExhausted {
            attempts: 3,
            last: Box::new(provider(503)),
        };
        let text = err.to_string();
        assert!(text.contains("InferenceExhausted"));
        assert!(text.contains("503"));
    }
}
