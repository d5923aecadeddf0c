#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! API gateway: HTTP surface, correlation ids and the per-request
//! authentication context.
//!
//! Middleware execution order (outermost -> innermost):
//! discard unusable correlation id -> set correlation id -> propagate correlation id
//! -> trace -> push correlation id to extensions -> timeout -> body limit -> auth -> router
//!
//! The auth layer never contacts the upstream: it only extracts the delegated
//! credential and selects the mode. Handlers resolve identity on demand through
//! [`auth::resolve_scope`] or the identity resolver client.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod module;
pub mod routes;

pub use auth::{Auth, AuthState, extract_delegated_credential, resolve_scope};
pub use config::{ApiGatewayConfig, HeaderConfig};
pub use error::{ApiError, ErrorBody};
pub use middleware::correlation::CorrelationId;
pub use module::ApiGateway;
