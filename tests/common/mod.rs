#![allow(dead_code)]

use axum::Router;
use claude_chat_proxy::core::{ClientConfig, ServerConfig, UpstreamConfig};
use claude_chat_proxy::proxy::build_router;
use claude_chat_proxy::{ProxyClient, ProxyForwarder};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const API_KEY: &str = "sk-ant-test-key";
pub const ROUTE: &str = "/api/claude";
pub const MODEL: &str = "claude-3-5-sonnet-20240620";

pub fn upstream_config(server_uri: &str) -> UpstreamConfig {
    UpstreamConfig {
        base_url: format!("{server_uri}/v1"),
        api_version: "2023-06-01".to_string(),
        max_tokens: 4096,
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        bind: "127.0.0.1:0".to_string(),
        route: ROUTE.to_string(),
        max_body_bytes: 1024 * 1024,
    }
}

pub fn router(server_uri: &str, api_key: Option<&str>) -> Router {
    let forwarder = ProxyForwarder::new(upstream_config(server_uri), api_key.map(str::to_string));
    build_router(Arc::new(forwarder), &server_config())
}

/// Starts the proxy on an ephemeral port and returns its chat endpoint.
pub async fn spawn_proxy(upstream_uri: &str, api_key: Option<&str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(upstream_uri, api_key);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}{ROUTE}")
}

/// An address nothing listens on.
pub async fn closed_port_uri() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn client(proxy_url: &str) -> ProxyClient {
    ProxyClient::new(&ClientConfig {
        proxy_url: proxy_url.to_string(),
        default_model: MODEL.to_string(),
        read_timeout_secs: Some(5),
    })
    .unwrap()
}

/// A Messages API event stream carrying `texts` as content deltas.
pub fn sse_body(texts: &[&str]) -> String {
    let mut body = String::from(
        "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n",
    );
    for text in texts {
        let frame = serde_json::json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": text},
        });
        body.push_str(&format!("event: content_block_delta\ndata: {frame}\n\n"));
    }
    body.push_str("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    body.push_str("data: [DONE]\n\n");
    body
}
