use serde::Deserialize;

/// Payload of one `data:` frame. Only text deltas and errors are interpreted;
/// the remaining Messages API events parse to [`StreamEvent::Other`].
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta {
        #[serde(default)]
        index: usize,
        delta: Delta,
    },
    #[serde(rename = "error")]
    Error { error: StreamError },
    #[serde(other)]
    Other,
}

/// `delta` of a content block. Text deltas carry `text`; thinking and tool
/// argument deltas carry other members and leave it empty.
#[derive(Debug, Deserialize)]
pub struct Delta {
    #[serde(rename = "type", default)]
    pub delta_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StreamError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl StreamEvent {
    /// The non-empty text fragment of a content delta.
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            Self::ContentBlockDelta { delta, .. } => {
                delta.text.as_deref().filter(|text| !text.is_empty())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_delta() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        )
        .unwrap();
        assert_eq!(event.text_delta(), Some("Hi"));
    }

    #[test]
    fn test_delta_without_text() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"a\""}}"#,
        )
        .unwrap();
        assert_eq!(event.text_delta(), None);

        let empty: StreamEvent =
            serde_json::from_str(r#"{"type":"content_block_delta","delta":{"text":""}}"#).unwrap();
        assert_eq!(empty.text_delta(), None);
    }

    #[test]
    fn test_unknown_events_are_other() {
        for payload in [
            r#"{"type":"message_start","message":{"id":"msg_1"}}"#,
            r#"{"type":"ping"}"#,
            r#"{"type":"message_stop"}"#,
        ] {
            let event: StreamEvent = serde_json::from_str(payload).unwrap();
            assert!(matches!(event, StreamEvent::Other), "{payload}");
        }
    }

    #[test]
    fn test_error_event() {
        let event: StreamEvent = serde_json::from_str(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        )
        .unwrap();
        match event {
            StreamEvent::Error { error } => {
                assert_eq!(error.error_type.as_deref(), Some("overloaded_error"));
                assert_eq!(error.message, "Overloaded");
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }
}
