//! Domain layer for the identity resolver.

pub mod breaker;
pub mod error;
pub mod local_client;
pub mod mode;
pub mod retry;
pub mod service;

pub use breaker::{CallPermit, CircuitBreaker};
pub use error::DomainError;
pub use local_client::IdentityResolverLocalClient;
pub use mode::ModeSelector;
pub use retry::{FailureClass, Resilience, ResilienceError, RetryPolicy};
pub use service::{Service, classify_upstream};

#[cfg(test)]
mod tests_resilience;
#[cfg(test)]
mod tests_resolution;
