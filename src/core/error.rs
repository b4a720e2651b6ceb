use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Client payload is malformed (missing model or messages)
    #[error("{0}")]
    InvalidRequest(String),
    /// The request body could not be read, e.g. it exceeds the size limit
    #[error("{message}")]
    BodyRejected { status: StatusCode, message: String },
    /// The proxy holds no upstream credential
    #[error("{0}")]
    ServerMisconfigured(String),
    /// Non-success status or error envelope from the upstream API
    #[error("Claude API error: {message}")]
    UpstreamError { status: StatusCode, message: String },
    /// The response violates the streaming contract
    #[error("Protocol error: {0}")]
    ProtocolError(String),
    /// A single unparseable stream line; logged and skipped by the consumer
    #[error("Malformed stream frame: {0}")]
    MalformedFrame(String),
    /// Unexpected failure inside the forwarder
    #[error("{0}")]
    InternalError(String),
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Attachment rejected or unreadable
    #[error("Attachment error: {0}")]
    AttachmentError(String),
    /// I/O error
    #[error("I/O error: {0}")]
    IOError(String),
}

impl ChatError {
    pub fn upstream(status: StatusCode, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            status,
            message: message.into(),
        }
    }

    /// HTTP status the proxy answers with for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::BodyRejected { status, .. } => *status,
            Self::UpstreamError { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message reported to proxy callers. Upstream errors carry the bare
    /// extracted message, without the display prefix.
    pub fn client_message(&self) -> String {
        match self {
            Self::UpstreamError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err)
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ChatError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ChatError::ServerMisconfigured("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ChatError::upstream(StatusCode::TOO_MANY_REQUESTS, "slow down").status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ChatError::InternalError("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_rejection_keeps_status() {
        let err = ChatError::BodyRejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.client_message(), "length limit exceeded");
    }

    #[test]
    fn test_upstream_client_message_is_bare() {
        let err = ChatError::upstream(StatusCode::UNAUTHORIZED, "invalid x-api-key");
        assert_eq!(err.client_message(), "invalid x-api-key");
        assert_eq!(err.to_string(), "Claude API error: invalid x-api-key");
    }
}
