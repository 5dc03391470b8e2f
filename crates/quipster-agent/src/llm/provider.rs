//! Provider adapters.
//!
//! A [`Provider`] knows the endpoint template, request body shape and
//! response shapes of one family of inference APIs.  The fallback algorithm
//! in [`super::client`] is shared by all of them.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::types::GenerationRequest;
use crate::sanitize::truncate_chars;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default Hugging Face serverless inference base URL.
pub const HUGGINGFACE_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Longest raw-response rendering returned when no known shape matches.
const RAW_FALLBACK_CHARS: usize = 1000;

/// Prefix of the soft-success text returned while a model is loading.
const QUEUE_PREFIX: &str = "[model/queue]";

// ---------------------------------------------------------------------------
// Provider enum
// ---------------------------------------------------------------------------

/// Identifies which inference API family the client should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Hugging Face text-generation inference (`POST {base}/models/{model}`).
    #[default]
    #[serde(alias = "hf")]
    HuggingFace,
    /// OpenAI Chat Completions API and compatible endpoints.
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

impl Provider {
    /// Short lowercase name, used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::OpenAi => "openai",
        }
    }

    /// Base URL used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::HuggingFace => HUGGINGFACE_BASE_URL,
            Self::OpenAi => OPENAI_BASE_URL,
        }
    }

    /// Full request URL for `model` under `base_url`.
    pub fn endpoint(self, base_url: &str, model: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Self::HuggingFace => format!("{base}/models/{model}"),
            Self::OpenAi => format!("{base}/chat/completions"),
        }
    }

    /// Build the JSON body for one call against `model`.
    pub fn request_body(self, model: &str, request: &GenerationRequest) -> Value {
        let params = &request.params;
        match self {
            Self::HuggingFace => json!({
                "inputs": request.prompt,
                "parameters": {
                    "max_new_tokens": params.max_new_tokens,
                    "temperature": params.temperature,
                    "top_p": params.top_p,
                    "return_full_text": false,
                },
                "stream": false,
            }),
            Self::OpenAi => json!({
                "model": model,
                "messages": request.messages,
                "max_tokens": params.max_new_tokens,
                "temperature": params.temperature,
                "top_p": params.top_p,
                "stream": false,
            }),
        }
    }

    /// Extract reply text from a successful response body.
    ///
    /// An `error` field on a 2xx body is a soft success: the model is usually
    /// still loading, so the error text is returned as the reply instead of
    /// moving to the next candidate.  Any unrecognised shape yields
    /// [`AgentError::ParseError`] carrying a truncated raw rendering.
    pub fn parse_response(self, model: &str, body: &Value) -> Result<String> {
        let generated = match self {
            Self::HuggingFace => body
                .get(0)
                .and_then(|first| first.get("generated_text"))
                .or_else(|| body.get("generated_text"))
                .and_then(Value::as_str),
            Self::OpenAi => body
                .pointer("/choices/0/message/content")
                .or_else(|| body.pointer("/choices/0/text"))
                .and_then(Value::as_str),
        };

        if let Some(text) = generated {
            return Ok(text.trim().to_owned());
        }

        if let Some(error) = body.get("error") {
            let detail = error
                .as_str()
                .map(str::to_owned)
                .or_else(|| {
                    error
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_owned)
                })
                .unwrap_or_else(|| error.to_string());
            return Ok(format!("{QUEUE_PREFIX} {}", detail.trim()));
        }

        Err(AgentError::ParseError {
            model: model.to_owned(),
            raw: truncate_chars(&body.to_string(), RAW_FALLBACK_CHARS),
        })
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Provider {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "openai" | "openai-compatible" => Ok(Self::OpenAi),
            other => Err(AgentError::ConfigError {
                reason: format!("unknown provider `{other}` (expected huggingface or openai)"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
