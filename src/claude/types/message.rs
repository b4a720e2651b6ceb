use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// The subset of a non-streaming Messages API reply the client reads.
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

impl MessageResponse {
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::Other => None,
        })
    }
}

/// `{"error": ...}` as sent by the upstream (`{"type": .., "message": ..}`)
/// or by the proxy itself (a bare string).
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Detailed {
        #[serde(rename = "type", default)]
        error_type: Option<String>,
        message: String,
    },
    Plain(String),
}

impl ErrorEnvelope {
    pub fn message(&self) -> &str {
        match &self.error {
            ErrorBody::Detailed { message, .. } | ErrorBody::Plain(message) => message,
        }
    }
}

/// Pulls the error message out of an error body, if it is an envelope.
pub fn extract_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.message().to_string())
        .filter(|message| !message.is_empty())
}
