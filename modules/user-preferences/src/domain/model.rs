use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stored preferences of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub owner_subject_id: String,
    pub theme: Option<String>,
    pub language: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Preferences {
    /// Preferences of a subject that has never saved any.
    #[must_use]
    pub fn empty(owner_subject_id: impl Into<String>) -> Self {
        Self {
            owner_subject_id: owner_subject_id.into(),
            theme: None,
            language: None,
            updated_at: None,
        }
    }
}

/// Full replacement of the caller's preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesUpdate {
    pub theme: Option<String>,
    pub language: Option<String>,
}

/// System-level aggregate over all subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesStats {
    pub total_records: usize,
}
