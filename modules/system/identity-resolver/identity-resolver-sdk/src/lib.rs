#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Identity Resolver SDK
//!
//! This crate provides the public API for the `identity_resolver` module:
//!
//! - [`IdentityResolverClient`] - Public API trait for consumers (gateway, business modules)
//! - [`PlatformIdentityApi`] - Boundary trait for the upstream platform's "who am I" call
//! - [`ClientConfig`] / [`ClientAuth`] - Upstream client configuration with an explicit auth method
//! - [`AuthError`] / [`ErrorCode`] - Error taxonomy and the machine-readable codes callers see
//!
//! ## Usage
//!
//! ```ignore
//! use identity_resolver_sdk::IdentityResolverClient;
//!
//! let identity = resolver.resolve(&ctx).await?;
//! let scope = authgate_security::require_scope(&ctx)?;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod upstream_api;

// Re-export main types at crate root
pub use api::IdentityResolverClient;
pub use error::{AuthError, ErrorCode};
pub use models::{
    ApplicationCredential, AuthMethod, BreakerSnapshot, BreakerState, ClientAuth, ClientConfig,
};
pub use upstream_api::{PlatformIdentityApi, UpstreamError, UpstreamIdentity};
