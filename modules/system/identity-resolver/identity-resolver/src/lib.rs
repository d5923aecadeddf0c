//! Identity Resolver Module
//!
//! Decides per request whether upstream calls act on behalf of the user (OBO)
//! or as the application (service principal), resolves the caller identity
//! from the upstream "who am I" endpoint, and guards every upstream call with
//! a retry executor and a process-wide circuit breaker.
//!
//! Provides the `IdentityResolverClient` trait implementation consumed by the
//! gateway and business modules.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::IdentityResolverConfig;
pub use domain::{FailureClass, Resilience, ResilienceError, classify_upstream};
pub use infra::upstream::HttpPlatformClient;
pub use module::IdentityResolverModule;

#[cfg(test)]
mod test_support;
