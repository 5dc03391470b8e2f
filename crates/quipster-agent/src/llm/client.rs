//! Inference client with ordered model fallback.
//!
//! [`InferenceClient::generate`] walks the candidate list (configured model
//! first, then the fallback chain) and returns the first usable reply.
//! Transport failures and non-authorization error statuses move on to the
//! next candidate; authorization failures stop immediately because the
//! credential is shared by every candidate.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{AgentError, Result};
use crate::llm::provider::Provider;
use crate::llm::types::{GenerationRequest, Message, ProbeReport, SamplingParams};
use crate::sanitize::truncate_chars;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Upper bound on a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(75);

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "HuggingFaceH4/zephyr-7b-beta";

/// Fallback chain tried after the configured model, in order.
pub const DEFAULT_FALLBACK_MODELS: &[&str] = &[
    "HuggingFaceH4/zephyr-7b-beta",
    "mistralai/Mistral-7B-Instruct-v0.2",
    "google/gemma-2b-it",
    "meta-llama/Llama-3.2-1B-Instruct",
];

/// Longest error-body excerpt kept in [`AgentError::ProviderError`].
const ERROR_BODY_CHARS: usize = 400;

/// Longest excerpt of a non-JSON 2xx body returned as a degraded reply.
const RAW_BODY_CHARS: usize = 1000;

/// Longest body excerpt in a [`ProbeReport`].
const PROBE_SNIPPET_CHARS: usize = 300;

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for one provider endpoint and its candidate models.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Which API family the endpoint speaks.
    pub provider: Provider,
    /// Bearer token sent with every call.
    pub api_key: String,
    /// Base URL; the per-model path is appended by the provider.
    pub base_url: String,
    /// Primary model identifier.
    pub model: String,
    /// Alternates tried after `model`, in order.
    pub fallback_models: Vec<String>,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl InferenceConfig {
    /// Create a configuration for the Hugging Face inference API with the
    /// default fallback chain.
    pub fn huggingface(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: Provider::HuggingFace,
            api_key: api_key.into(),
            base_url: Provider::HuggingFace.default_base_url().to_owned(),
            model: model.into(),
            fallback_models: DEFAULT_FALLBACK_MODELS
                .iter()
                .map(|m| (*m).to_owned())
                .collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a configuration for any OpenAI-compatible API.  No fallback
    /// models are set; add them with [`with_fallbacks`](Self::with_fallbacks).
    pub fn openai_compatible(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: Provider::OpenAi,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            fallback_models: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the fallback chain.
    pub fn with_fallbacks<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Point the configuration at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Ordered candidate list: `primary` first, then each fallback not already
/// present, preserving fallback order.
pub fn candidate_models(primary: &str, fallbacks: &[String]) -> Vec<String> {
    let mut models: Vec<String> = Vec::with_capacity(fallbacks.len() + 1);
    for model in std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)) {
        let model = model.trim();
        if model.is_empty() || models.iter().any(|m| m == model) {
            continue;
        }
        models.push(model.to_owned());
    }
    models
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Stateless inference client.  Cheap to clone; clones share the HTTP pool.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    config: Arc<InferenceConfig>,
    candidates: Arc<[String]>,
    headers: HeaderMap,
    http: reqwest::Client,
}

impl InferenceClient {
    /// Create a new client with the given configuration.
    pub fn new(config: InferenceConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: config.provider.name().into(),
            });
        }
        if config.model.trim().is_empty() {
            return Err(AgentError::ConfigError {
                reason: "no model configured".into(),
            });
        }

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|e| AgentError::ConfigError {
                reason: format!("invalid authorization header: {e}"),
            })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .user_agent(concat!("quipster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AgentError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let candidates = candidate_models(&config.model, &config.fallback_models).into();

        Ok(Self {
            config: Arc::new(config),
            candidates,
            headers,
            http,
        })
    }

    /// The configured primary model.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    /// Models tried by [`generate`](Self::generate), in order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Request URL for `model`.
    pub fn endpoint_for(&self, model: &str) -> String {
        self.config.provider.endpoint(&self.config.base_url, model)
    }

    // -----------------------------------------------------------------------
    // Public API
    // -----------------------------------------------------------------------

    /// Generate a reply, falling back through the candidate models.
    ///
    /// Returns the first usable reply.  Fails with the provider error on an
    /// authorization-class status, or with
    /// [`AgentError::InferenceExhausted`] once every candidate has failed.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let mut last_error: Option<AgentError> = None;

        for model in self.candidates.iter() {
            debug!(model = %model, provider = %self.config.provider, "trying candidate model");

            match self.generate_with_model(model, request).await {
                Ok(text) => {
                    info!(model = %model, chars = text.chars().count(), "generation succeeded");
                    return Ok(text);
                }
                Err(AgentError::ParseError { model, raw }) => {
                    warn!(model = %model, "unrecognised response shape, returning raw body");
                    return Ok(raw.trim().to_owned());
                }
                Err(err) if err.is_fatal_for_all_candidates() => {
                    warn!(model = %model, error = %err, "authorization failure, not trying other candidates");
                    return Err(err);
                }
                Err(err) => {
                    warn!(model = %model, error = %err, "candidate model failed");
                    last_error = Some(err);
                }
            }
        }

        let attempts = self.candidates.len();
        let last = last_error.unwrap_or_else(|| AgentError::ConfigError {
            reason: "no candidate models".into(),
        });
        error!(attempts, last_error = %last, "all candidate models failed");
        Err(AgentError::InferenceExhausted {
            attempts,
            last: Box::new(last),
        })
    }

    /// Issue one call against a single model, without fallback.
    pub async fn generate_with_model(
        &self,
        model: &str,
        request: &GenerationRequest,
    ) -> Result<String> {
        let provider = self.config.provider;
        let body = provider.request_body(model, request);
        let (status, text) = self.send(model, &body).await?;

        if !(200..300).contains(&status) {
            return Err(AgentError::ProviderError {
                model: model.to_owned(),
                status,
                body: truncate_chars(&text, ERROR_BODY_CHARS),
            });
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            debug!(model = %model, error = %e, "response body is not JSON");
            AgentError::ParseError {
                model: model.to_owned(),
                raw: truncate_chars(&text, RAW_BODY_CHARS),
            }
        })?;

        provider.parse_response(model, &value)
    }

    /// Send a tiny generation to the primary model and report what came back.
    ///
    /// Only transport failures are errors; any HTTP status is reported.
    pub async fn probe(&self) -> Result<ProbeReport> {
        let model = self.config.model.clone();
        let request = GenerationRequest {
            prompt: "ping".into(),
            messages: vec![Message::user("ping")],
            params: SamplingParams {
                max_new_tokens: 8,
                ..SamplingParams::default()
            },
        };
        let body = self.config.provider.request_body(&model, &request);
        let (status, text) = self.send(&model, &body).await?;

        Ok(ProbeReport {
            url: self.endpoint_for(&model),
            model,
            status,
            ok: (200..300).contains(&status),
            body_snippet: truncate_chars(&text, PROBE_SNIPPET_CHARS),
        })
    }

    // -----------------------------------------------------------------------
    // HTTP
    // -----------------------------------------------------------------------

    /// POST `body` to the endpoint for `model`, returning status and body
    /// text.  Connection errors, timeouts and body read failures are all
    /// [`AgentError::TransportError`].
    async fn send(&self, model: &str, body: &Value) -> Result<(u16, String)> {
        let url = self.endpoint_for(model);
        debug!(url = %url, model = %model, "sending inference request");

        let transport = |e: reqwest::Error| AgentError::TransportError {
            model: model.to_owned(),
            reason: if e.is_timeout() {
                format!("timed out after {}s", self.config.timeout.as_secs())
            } else {
                e.to_string()
            },
        };

        let resp = self
            .http
            .post(&url)
            .headers(self.headers.clone())
            .timeout(self.config.timeout)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(transport)?;
        Ok((status, text))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
