//! Shared application state for the web server.

use quipster_agent::InferenceClient;

/// Shared state accessible from every Axum handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client used by the diagnostic probe.
    pub client: InferenceClient,
}
