//! Well-known header names and limits shared by the gateway and resolver.

/// Header carrying the delegated (on-behalf-of) access token, injected by the platform proxy.
pub const DELEGATED_CREDENTIAL_HEADER: &str = "x-forwarded-access-token";

/// Header carrying the per-request correlation id, echoed on every response.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Subject id used for process-level (service principal) work that is not tenant scoped.
pub const SYSTEM_SUBJECT_ID: &str = "system";

/// Upper bound for a resolved subject id accepted by the isolation guard.
pub const MAX_SUBJECT_ID_LEN: usize = 256;

/// Upper bound for an inbound correlation id reused verbatim.
pub const MAX_CORRELATION_ID_LEN: usize = 256;
