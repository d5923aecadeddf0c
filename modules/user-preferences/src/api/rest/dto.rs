use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::{Preferences, PreferencesUpdate};

/// REST DTO for the caller's preferences.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesDto {
    pub subject_id: String,
    pub theme: Option<String>,
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Preferences> for PreferencesDto {
    fn from(p: Preferences) -> Self {
        Self {
            subject_id: p.owner_subject_id,
            theme: p.theme,
            language: p.language,
            updated_at: p.updated_at,
        }
    }
}

/// REST DTO for a full preferences update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePreferencesRequest {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

impl From<UpdatePreferencesRequest> for PreferencesUpdate {
    fn from(r: UpdatePreferencesRequest) -> Self {
        Self {
            theme: r.theme,
            language: r.language,
        }
    }
}
