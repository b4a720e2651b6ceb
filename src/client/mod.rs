//! Client side: sends chat turns to the proxy and reassembles streamed replies.

mod consumer;

pub use consumer::{connection_error_message, read_stream, ProxyClient};
