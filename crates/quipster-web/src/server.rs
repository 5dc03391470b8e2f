//! Web server setup and startup.
//!
//! [`WebServer`] composes the Axum router and runs the HTTP listener.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use quipster_agent::InferenceClient;

use crate::WebConfig;
use crate::api;
use crate::state::AppState;

/// The health/diagnostic web server.
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: WebConfig, client: InferenceClient) -> Self {
        Self {
            config,
            state: Arc::new(AppState { client }),
        }
    }

    /// Return the `host:port` string this server will bind to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.bind_addr, self.config.port)
    }

    /// Build the Axum router with all routes registered.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(api::health))
            .route("/probe", get(api::probe))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.state))
    }

    /// Bind the configured address and serve until shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot be bound.
    pub async fn start(self) -> std::io::Result<()> {
        let addr = self.addr();
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let router = self.router();
        tracing::info!(addr = ?listener.local_addr().ok(), "starting web server");
        axum::serve(listener, router).await
    }
}
