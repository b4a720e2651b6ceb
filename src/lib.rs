pub mod attachments;
pub mod claude;
pub mod cli;
pub mod client;
pub mod core;
pub mod eventsource;
pub mod proxy;

pub use attachments::Attachment;
pub use claude::{ChatRequest, Message, Role};
pub use client::ProxyClient;
pub use self::core::{ChatError, Config};
pub use proxy::{ProxyForwarder, ProxyServer};
