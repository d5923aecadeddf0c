use async_trait::async_trait;
use authgate_security::SubjectScope;

use super::error::DomainError;
use super::model::{Preferences, PreferencesUpdate};

/// Preferences storage.
///
/// Tenant-scoped methods take a [`SubjectScope`] and must apply its owner
/// filter; there is no tenant-scoped method without one. System-level
/// methods take no scope and never return per-subject data.
#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    async fn find(&self, scope: &SubjectScope) -> Result<Option<Preferences>, DomainError>;

    async fn upsert(
        &self,
        scope: &SubjectScope,
        update: PreferencesUpdate,
    ) -> Result<Preferences, DomainError>;

    /// Number of stored records across all subjects.
    async fn count_all(&self) -> Result<usize, DomainError>;
}
