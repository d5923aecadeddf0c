//! Process-local preferences store.

use async_trait::async_trait;
use authgate_security::SubjectScope;
use chrono::Utc;
use dashmap::DashMap;

use crate::domain::error::DomainError;
use crate::domain::model::{Preferences, PreferencesUpdate};
use crate::domain::repo::PreferencesRepository;

/// Records keyed by owner subject id.
///
/// Every tenant-scoped lookup goes through the scope's owner filter, and a
/// record whose stored owner does not pass the filter is never returned.
#[derive(Debug, Default)]
pub struct InMemoryPreferencesRepository {
    records: DashMap<String, Preferences>,
}

impl InMemoryPreferencesRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferencesRepository for InMemoryPreferencesRepository {
    async fn find(&self, scope: &SubjectScope) -> Result<Option<Preferences>, DomainError> {
        let filter = scope.filter();
        let Some(record) = self.records.get(filter.value()) else {
            return Ok(None);
        };
        if !scope.permits(&record.owner_subject_id) {
            return Err(DomainError::isolation(format!(
                "record under {} failed the owner filter",
                filter.property()
            )));
        }
        Ok(Some(record.clone()))
    }

    async fn upsert(
        &self,
        scope: &SubjectScope,
        update: PreferencesUpdate,
    ) -> Result<Preferences, DomainError> {
        let owner = scope.filter().value().to_owned();
        let mut entry = self
            .records
            .entry(owner.clone())
            .or_insert_with(|| Preferences::empty(owner));
        if !scope.permits(&entry.owner_subject_id) {
            return Err(DomainError::isolation(format!(
                "record under {} failed the owner filter",
                scope.filter().property()
            )));
        }

        entry.theme = update.theme;
        entry.language = update.language;
        entry.updated_at = Some(Utc::now());
        Ok(entry.clone())
    }

    async fn count_all(&self) -> Result<usize, DomainError> {
        Ok(self.records.len())
    }
}
