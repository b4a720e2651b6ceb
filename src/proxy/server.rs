use crate::core::{ChatError, ServerConfig};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    response::Response,
    routing::{get, post},
    Router,
};
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

use super::ProxyForwarder;

/// Routes: `POST {route}` forwards a chat turn, `GET /health` answers `OK`.
pub fn build_router(forwarder: Arc<ProxyForwarder>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(&config.route, post(forward_chat))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(forwarder)
}

async fn forward_chat(
    State(forwarder): State<Arc<ProxyForwarder>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match body {
        Ok(body) => forwarder.forward(&body).await,
        Err(rejection) => forwarder.error_response(ChatError::BodyRejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }),
    }
}

async fn health_check() -> &'static str {
    "OK"
}

/// HTTP front of the proxy
pub struct ProxyServer {
    config: ServerConfig,
    forwarder: Arc<ProxyForwarder>,
}

impl ProxyServer {
    pub fn new(config: ServerConfig, forwarder: ProxyForwarder) -> Self {
        Self {
            config,
            forwarder: Arc::new(forwarder),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.forwarder.clone(), &self.config)
    }

    /// Serves until ctrl-c.
    pub async fn run(&self) -> Result<(), ChatError> {
        let listener = TcpListener::bind(&self.config.bind).await.map_err(|e| {
            ChatError::ConfigError(format!("Failed to bind {}: {e}", self.config.bind))
        })?;
        info!(
            "Proxy listening on http://{}{}",
            listener.local_addr()?,
            self.config.route
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Proxy shutting down");
            })
            .await?;

        Ok(())
    }
}
