use chrono::{DateTime, Utc};
use serde::Serialize;

/// The caller identity as reported by the upstream platform's "who am I" call.
///
/// Transient: lives on the request context only. Downstream storage copies the
/// `subject_id` into tenant-scoped records, never the identity as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    subject_id: String,
    display_name: String,
    is_active: bool,
    resolved_at: DateTime<Utc>,
}

impl UserIdentity {
    #[must_use]
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        is_active: bool,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            is_active,
            resolved_at,
        }
    }

    /// Stable identity string (e.g. an email-shaped user name) from the upstream.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn resolved_at(&self) -> DateTime<Utc> {
        self.resolved_at
    }
}
