//! Wire types shared by the proxy and the client.

pub mod types;

pub use types::*;
