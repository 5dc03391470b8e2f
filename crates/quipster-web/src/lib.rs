//! Health and diagnostic HTTP server for Quipster.
//!
//! Hosting platforms poll `GET /health` for liveness.  Operators can hit
//! `GET /probe` to see how the inference provider answers a tiny request
//! without going through chat.

pub mod api;
pub mod server;
pub mod state;

pub use server::WebServer;
pub use state::AppState;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".into(),
            port: 8080,
        }
    }
}
