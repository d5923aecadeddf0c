use serde::{Deserialize, Serialize};

/// Preferences module configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreferencesConfig {
    /// Longest accepted value for any preference field, in bytes.
    pub max_field_length: usize,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            max_field_length: 100,
        }
    }
}
