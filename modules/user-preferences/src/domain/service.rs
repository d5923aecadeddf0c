use std::sync::Arc;

use authgate_security::SubjectScope;
use authgate_security::constants::SYSTEM_SUBJECT_ID;

use super::error::DomainError;
use super::model::{Preferences, PreferencesStats, PreferencesUpdate};
use super::repo::PreferencesRepository;

pub(crate) mod fields {
    pub const THEME: &str = "theme";
    pub const LANGUAGE: &str = "language";
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_field_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_field_length: 100,
        }
    }
}

pub struct Service<R: PreferencesRepository + ?Sized> {
    repo: Arc<R>,
    config: ServiceConfig,
}

impl<R: PreferencesRepository + ?Sized> Service<R> {
    #[must_use]
    pub fn new(repo: Arc<R>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// The caller's preferences, or empty ones if nothing was saved yet.
    ///
    /// # Errors
    /// Returns a [`DomainError`] if the repository fails.
    #[tracing::instrument(skip_all, fields(subject = %scope.subject()))]
    pub async fn get_preferences(&self, scope: &SubjectScope) -> Result<Preferences, DomainError> {
        let found = self.repo.find(scope).await?;
        tracing::debug!(found = found.is_some(), "Preferences loaded");
        Ok(found.unwrap_or_else(|| Preferences::empty(scope.subject().as_str())))
    }

    /// Replace the caller's preferences.
    ///
    /// # Errors
    /// Returns [`DomainError::Validation`] for oversized fields, or the
    /// repository's error.
    #[tracing::instrument(skip_all, fields(subject = %scope.subject()))]
    pub async fn update_preferences(
        &self,
        scope: &SubjectScope,
        update: PreferencesUpdate,
    ) -> Result<Preferences, DomainError> {
        self.validate_field(fields::THEME, update.theme.as_deref())?;
        self.validate_field(fields::LANGUAGE, update.language.as_deref())?;

        let saved = self.repo.upsert(scope, update).await?;
        tracing::info!("Preferences updated");
        Ok(saved)
    }

    /// Aggregate over all subjects. System-level: no subject scope involved.
    ///
    /// # Errors
    /// Returns a [`DomainError`] if the repository fails.
    pub async fn stats(&self) -> Result<PreferencesStats, DomainError> {
        let total_records = self.repo.count_all().await?;
        tracing::debug!(actor = SYSTEM_SUBJECT_ID, total_records, "Preferences stats computed");
        Ok(PreferencesStats { total_records })
    }

    fn validate_field(&self, field: &str, value: Option<&str>) -> Result<(), DomainError> {
        match value {
            Some(v) if v.len() > self.config.max_field_length => Err(DomainError::validation(
                field,
                format!("exceeds maximum length of {}", self.config.max_field_length),
            )),
            _ => Ok(()),
        }
    }
}
