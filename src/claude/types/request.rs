use crate::attachments::Attachment;
use crate::core::ChatError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::supports_extended_thinking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat turn as the browser-side client sends it to the proxy.
///
/// Optional members are left off the wire when unset: no `attachments` key
/// for an empty list, no `extendedThinking`/`stream` key when false.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub extended_thinking: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            attachments: Vec::new(),
            extended_thinking: false,
            stream: false,
        }
    }

    /// Appends `prompt` as a user turn after the prior conversation.
    pub fn for_prompt(model: impl Into<String>, history: &[Message], prompt: &str) -> Self {
        let mut messages = history.to_vec();
        messages.push(Message::user(prompt));
        Self::new(model, messages)
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Requests extended thinking. Ignored for models that don't support it.
    pub fn with_extended_thinking(mut self, enabled: bool) -> Self {
        self.extended_thinking = enabled && supports_extended_thinking(&self.model);
        self
    }

    pub const fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.model.trim().is_empty() {
            return Err(ChatError::InvalidRequest("model must not be empty".to_string()));
        }
        if self.messages.is_empty() {
            return Err(ChatError::InvalidRequest(
                "messages must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// The proxy's lenient view of an incoming body. Every member is optional
/// so that validation, not deserialization, decides what is missing.
/// `messages` and `attachments` stay untyped and are forwarded as received.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub attachments: Option<Value>,
    #[serde(default)]
    pub extended_thinking: Option<bool>,
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Payload the proxy sends to `POST /v1/messages`.
#[derive(Debug, Serialize)]
pub struct UpstreamRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Value],
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_thinking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<&'a [Value]>,
}

impl<'a> UpstreamRequest<'a> {
    pub const fn new(model: &'a str, messages: &'a [Value], max_tokens: u32) -> Self {
        Self {
            model,
            messages,
            max_tokens,
            extended_thinking: None,
            stream: None,
            attachments: None,
        }
    }

    /// Sets the flag only when enabled. The upstream never sees `false`.
    pub const fn with_extended_thinking(mut self, enabled: bool) -> Self {
        if enabled {
            self.extended_thinking = Some(true);
        }
        self
    }

    pub const fn with_stream(mut self, stream: bool) -> Self {
        if stream {
            self.stream = Some(true);
        }
        self
    }

    pub fn with_attachments(mut self, attachments: &'a [Value]) -> Self {
        if !attachments.is_empty() {
            self.attachments = Some(attachments);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claude::types::model::{CLAUDE_3_5_SONNET, CLAUDE_3_7_SONNET};
    use serde_json::json;

    #[test]
    fn test_chat_request_omits_unset_fields() {
        let request = ChatRequest::for_prompt(CLAUDE_3_5_SONNET, &[], "hi");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": CLAUDE_3_5_SONNET,
                "messages": [{"role": "user", "content": "hi"}],
            })
        );
    }

    #[test]
    fn test_chat_request_camel_case_flags() {
        let request = ChatRequest::for_prompt(CLAUDE_3_7_SONNET, &[], "hi")
            .with_extended_thinking(true)
            .with_stream(true);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["extendedThinking"], json!(true));
        assert_eq!(value["stream"], json!(true));
    }

    #[test]
    fn test_extended_thinking_ignored_for_unsupported_model() {
        let request =
            ChatRequest::for_prompt(CLAUDE_3_5_SONNET, &[], "hi").with_extended_thinking(true);
        assert!(!request.extended_thinking);
    }

    #[test]
    fn test_for_prompt_appends_user_turn() {
        let history = vec![Message::user("hello"), Message::assistant("hi there")];
        let request = ChatRequest::for_prompt(CLAUDE_3_5_SONNET, &history, "how are you?");
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[2], Message::user("how are you?"));
    }

    #[test]
    fn test_validate() {
        assert!(ChatRequest::new(CLAUDE_3_5_SONNET, vec![]).validate().is_err());
        assert!(ChatRequest::new(" ", vec![Message::user("x")]).validate().is_err());
        assert!(ChatRequest::new(CLAUDE_3_5_SONNET, vec![Message::user("x")])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_upstream_request_minimal() {
        let messages = vec![json!({"role": "user", "content": "hi"})];
        let request = UpstreamRequest::new("m", &messages, 4096)
            .with_extended_thinking(false)
            .with_stream(false)
            .with_attachments(&[]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"model": "m", "messages": messages, "max_tokens": 4096})
        );
    }

    #[test]
    fn test_upstream_request_full() {
        let messages = vec![json!({"role": "user", "content": "hi"})];
        let attachments = vec![json!({"id": "file_1", "name": "a.txt"})];
        let request = UpstreamRequest::new("m", &messages, 4096)
            .with_extended_thinking(true)
            .with_stream(true)
            .with_attachments(&attachments);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["extended_thinking"], json!(true));
        assert_eq!(value["stream"], json!(true));
        assert_eq!(value["attachments"], json!(attachments));
    }
}
