use std::fmt;

/// Well-known scope property names.
///
/// Storage adapters map these to concrete columns or record fields.
pub mod scope_properties {
    /// Owning subject. Typically maps to an `owner_subject_id` column.
    pub const OWNER_SUBJECT_ID: &str = "owner_subject_id";
}

/// A subject id that passed the isolation guard.
///
/// There is no public constructor: the only way to obtain one is
/// [`crate::guard::require_identity`], which reads the identity resolved for
/// the request. Values from headers, query strings or bodies cannot be turned
/// into a `SubjectId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubjectId(String);

impl SubjectId {
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SubjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Equality scope filter: `property = value`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EqScopeFilter {
    property: &'static str,
    value: String,
}

impl EqScopeFilter {
    /// The scope property name (e.g., `scope_properties::OWNER_SUBJECT_ID`).
    #[inline]
    #[must_use]
    pub fn property(&self) -> &'static str {
        self.property
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` if a record whose property holds `candidate` passes the filter.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.value == candidate
    }
}

/// The data a tenant-scoped storage operation is allowed to touch.
///
/// A `SubjectScope` always carries exactly one equality filter on the owning
/// subject. Tenant-scoped repository methods take a `&SubjectScope`, so a
/// tenant-scoped query without the subject filter cannot be expressed.
///
/// # Examples
///
/// ```ignore
/// let scope = authgate_security::require_scope(&ctx)?;
/// let rows = repo.find(&scope).await?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectScope {
    subject: SubjectId,
    filter: EqScopeFilter,
}

impl SubjectScope {
    #[must_use]
    pub fn for_subject(subject: SubjectId) -> Self {
        let filter = EqScopeFilter {
            property: scope_properties::OWNER_SUBJECT_ID,
            value: subject.as_str().to_owned(),
        };
        Self { subject, filter }
    }

    #[must_use]
    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    /// The mandatory owner filter every query built from this scope must apply.
    #[must_use]
    pub fn filter(&self) -> &EqScopeFilter {
        &self.filter
    }

    /// Returns `true` if a record owned by `owner_subject_id` is visible in this scope.
    #[must_use]
    pub fn permits(&self, owner_subject_id: &str) -> bool {
        self.filter.matches(owner_subject_id)
    }
}
