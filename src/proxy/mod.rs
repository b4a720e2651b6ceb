//! Server side: receives chat turns from the browser and forwards them to
//! the Messages API with the credential attached.

mod forwarder;
mod server;

pub use forwarder::ProxyForwarder;
pub use server::{build_router, ProxyServer};
