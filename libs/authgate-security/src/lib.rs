#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod constants;
pub mod context;
pub mod guard;
pub mod identity;
pub mod issuer;
pub mod subject_scope;

pub use context::{AuthMode, AuthenticationContext};
pub use guard::{IsolationError, require_identity, require_scope};
pub use identity::UserIdentity;
pub use issuer::IdentityIssuer;
pub use subject_scope::{EqScopeFilter, SubjectId, SubjectScope, scope_properties};

/// The issuer shared by this crate's unit tests.
#[cfg(test)]
pub(crate) fn test_issuer() -> &'static IdentityIssuer {
    static ISSUER: std::sync::LazyLock<IdentityIssuer> = std::sync::LazyLock::new(|| {
        IdentityIssuer::claim().expect("no other claimant in the unit test binary")
    });
    &ISSUER
}
