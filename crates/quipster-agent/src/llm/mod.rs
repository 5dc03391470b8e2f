//! Inference integration layer.
//!
//! - [`types`] -- Provider-agnostic request types.
//! - [`provider`] -- Endpoint templates, request bodies and response shapes
//!   per API family.
//! - [`client`] -- HTTP client with ordered model fallback.

pub mod client;
pub mod provider;
pub mod types;

pub use client::{
    DEFAULT_FALLBACK_MODELS, DEFAULT_MODEL, DEFAULT_TIMEOUT, InferenceClient, InferenceConfig,
    candidate_models,
};
pub use provider::Provider;
pub use types::{GenerationRequest, Message, ProbeReport, Role, SamplingParams};
