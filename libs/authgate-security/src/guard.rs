//! Data-isolation guard.
//!
//! Every tenant-scoped storage accessor calls [`require_identity`] (or
//! [`require_scope`]) before building a query. The subject id is taken from the
//! identity resolved for the request and nowhere else.

use thiserror::Error;

use crate::constants::MAX_SUBJECT_ID_LEN;
use crate::context::AuthenticationContext;
use crate::subject_scope::{SubjectId, SubjectScope};

/// Reasons the guard refuses a tenant-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsolationError {
    #[error("no resolved identity on the request context")]
    Unresolved,

    #[error("resolved subject id is empty")]
    EmptySubject,

    #[error("resolved subject id contains whitespace")]
    MalformedSubject,

    #[error("resolved subject id exceeds {max} bytes")]
    SubjectTooLong { max: usize },
}

/// Return the validated subject id for a tenant-scoped operation.
///
/// # Errors
/// Returns an [`IsolationError`] when the request has no resolved identity or
/// the resolved subject id fails the shape check.
pub fn require_identity(ctx: &AuthenticationContext) -> Result<SubjectId, IsolationError> {
    let result = validate(ctx);
    if let Err(err) = &result {
        tracing::warn!(
            correlation_id = %ctx.correlation_id(),
            mode = %ctx.mode(),
            reason = %err,
            "Tenant-scoped access rejected by isolation guard"
        );
    }
    result
}

/// Same as [`require_identity`], wrapped into the scope storage accepts.
///
/// # Errors
/// See [`require_identity`].
pub fn require_scope(ctx: &AuthenticationContext) -> Result<SubjectScope, IsolationError> {
    require_identity(ctx).map(SubjectScope::for_subject)
}

fn validate(ctx: &AuthenticationContext) -> Result<SubjectId, IsolationError> {
    let identity = ctx.resolved_identity().ok_or(IsolationError::Unresolved)?;
    let subject = identity.subject_id();

    if subject.is_empty() {
        return Err(IsolationError::EmptySubject);
    }
    if subject.len() > MAX_SUBJECT_ID_LEN {
        return Err(IsolationError::SubjectTooLong {
            max: MAX_SUBJECT_ID_LEN,
        });
    }
    if subject.chars().any(char::is_whitespace) {
        return Err(IsolationError::MalformedSubject);
    }

    Ok(SubjectId::new_unchecked(subject.to_owned()))
}
