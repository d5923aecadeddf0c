//! Upstream platform adapters.

mod http_client;

pub use http_client::HttpPlatformClient;
