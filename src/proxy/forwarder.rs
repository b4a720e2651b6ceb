use crate::claude::{extract_error_message, ProxyRequest, UpstreamRequest};
use crate::core::{ChatError, UpstreamConfig};
use axum::{
    body::Body,
    http::{
        self,
        header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    Json,
};
use log::{debug, error, warn};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde_json::{json, Value};

const INVALID_REQUEST: &str = "Invalid request. Model and messages are required.";
const MISSING_API_KEY: &str =
    "API key not configured. Please add CLAUDE_API_KEY to your environment or .env file.";
const INTERNAL_FALLBACK: &str = "Internal server error";
const REDACTED: &str = "[redacted]";

/// Relays chat requests to the Messages API with a server-held credential.
///
/// The credential is fixed at construction and is never echoed back to
/// callers, not even inside error messages.
pub struct ProxyForwarder {
    client: Client,
    upstream: UpstreamConfig,
    api_key: Option<String>,
}

impl ProxyForwarder {
    /// An empty or whitespace-only `api_key` counts as no credential.
    pub fn new(upstream: UpstreamConfig, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            upstream,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub const fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Handles one raw request body. Every failure is turned into a
    /// `{"error": ..}` reply here.
    pub async fn forward(&self, body: &[u8]) -> Response {
        match self.try_forward(body).await {
            Ok(response) => response,
            Err(err) => self.error_response(err),
        }
    }

    async fn try_forward(&self, body: &[u8]) -> Result<Response, ChatError> {
        let value: Value = serde_json::from_slice(body)?;
        let request: ProxyRequest = serde_json::from_value(value)
            .map_err(|_| ChatError::InvalidRequest(INVALID_REQUEST.to_string()))?;

        let model = request
            .model
            .as_deref()
            .filter(|model| !model.is_empty())
            .ok_or_else(|| ChatError::InvalidRequest(INVALID_REQUEST.to_string()))?;
        let messages = request
            .messages
            .as_ref()
            .and_then(Value::as_array)
            .ok_or_else(|| ChatError::InvalidRequest(INVALID_REQUEST.to_string()))?;

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::ServerMisconfigured(MISSING_API_KEY.to_string()))?;

        let attachments = request
            .attachments
            .as_ref()
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let stream = request.stream.unwrap_or(false);

        let payload = UpstreamRequest::new(model, messages, self.upstream.max_tokens)
            .with_extended_thinking(request.extended_thinking.unwrap_or(false))
            .with_stream(stream)
            .with_attachments(attachments);

        debug!(
            "Forwarding request: model={model}, messages={}, attachments={}, stream={stream}",
            messages.len(),
            attachments.len()
        );
        let response = self.dispatch(api_key, &payload).await?;

        if stream {
            relay_stream(response)
        } else {
            relay_json(response).await
        }
    }

    fn build_headers(&self, api_key: &str) -> Result<HeaderMap, ChatError> {
        let api_key = HeaderValue::from_str(api_key).map_err(|_| {
            ChatError::InternalError("configured API key is not a valid header value".to_string())
        })?;
        let api_version = HeaderValue::from_str(&self.upstream.api_version).map_err(|e| {
            ChatError::InternalError(format!("invalid anthropic-version header: {e}"))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", api_key);
        headers.insert("anthropic-version", api_version);
        Ok(headers)
    }

    async fn dispatch(
        &self,
        api_key: &str,
        payload: &UpstreamRequest<'_>,
    ) -> Result<reqwest::Response, ChatError> {
        let url = format!("{}/messages", self.upstream.base_url.trim_end_matches('/'));
        self.client
            .post(url)
            .headers(self.build_headers(api_key)?)
            .json(payload)
            .send()
            .await
            .map_err(|e| ChatError::InternalError(e.to_string()))
    }

    /// Renders `err` as a `{"error": ..}` reply with the credential redacted.
    pub fn error_response(&self, err: ChatError) -> Response {
        let status = err.status();
        let mut message = err.client_message();
        if message.trim().is_empty() {
            message = INTERNAL_FALLBACK.to_string();
        }
        if let Some(key) = &self.api_key {
            message = message.replace(key.as_str(), REDACTED);
        }

        match err {
            ChatError::InvalidRequest(_)
            | ChatError::BodyRejected { .. }
            | ChatError::UpstreamError { .. } => {
                warn!("Rejected chat request ({status}): {message}");
            }
            ChatError::ServerMisconfigured(_) => {
                error!("Claude API key is not configured");
            }
            _ => error!("Error calling Claude API: {message}"),
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Hands the upstream body through untouched, with event-stream headers.
fn relay_stream(response: reqwest::Response) -> Result<Response, ChatError> {
    let status = response.status();
    http::Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .header(CONNECTION, "keep-alive")
        .body(Body::from_stream(response.bytes_stream()))
        .map_err(|e| ChatError::InternalError(e.to_string()))
}

async fn relay_json(response: reqwest::Response) -> Result<Response, ChatError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
        return Err(ChatError::upstream(status, message));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| ChatError::InternalError(e.to_string()))?;
    // The body must be JSON, but it is relayed as the exact upstream bytes.
    serde_json::from_slice::<Value>(&body)?;

    Ok((status, [(CONTENT_TYPE, "application/json")], body).into_response())
}
