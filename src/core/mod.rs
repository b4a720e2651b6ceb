mod config;
pub mod error;

pub use self::config::{AttachmentPolicy, ClientConfig, Config, ServerConfig, UpstreamConfig};
pub use error::ChatError;
