pub mod message;
pub mod model;
pub mod request;
pub mod stream;

pub use message::{extract_error_message, ContentBlock, ErrorBody, ErrorEnvelope, MessageResponse};
pub use model::{supports_extended_thinking, CLAUDE_3_5_SONNET, CLAUDE_3_7_SONNET};
pub use request::{ChatRequest, Message, ProxyRequest, Role, UpstreamRequest};
pub use stream::{Delta, StreamError, StreamEvent};
