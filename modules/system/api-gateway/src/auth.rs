use std::sync::Arc;

use authgate_security::{AuthenticationContext, SubjectScope, require_scope};
use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::request::Parts;
use http::{HeaderMap, HeaderName};
use identity_resolver_sdk::{AuthError, IdentityResolverClient};
use secrecy::SecretString;

use crate::error::ApiError;
use crate::middleware::correlation::CorrelationId;

/// Shortest delegated credential accepted as structurally valid.
pub const MIN_CREDENTIAL_LEN: usize = 8;
/// Longest delegated credential accepted as structurally valid.
pub const MAX_CREDENTIAL_LEN: usize = 8192;

/// Why a present credential header was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Malformed {
    NotText,
    TooShort,
    TooLong,
    BadCharacters,
}

impl Malformed {
    fn as_str(self) -> &'static str {
        match self {
            Self::NotText => "not_text",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::BadCharacters => "bad_characters",
        }
    }
}

fn check_structure(raw: &[u8]) -> Result<&str, Malformed> {
    let text = std::str::from_utf8(raw).map_err(|_| Malformed::NotText)?;
    if text.len() < MIN_CREDENTIAL_LEN {
        return Err(Malformed::TooShort);
    }
    if text.len() > MAX_CREDENTIAL_LEN {
        return Err(Malformed::TooLong);
    }
    if !text.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(Malformed::BadCharacters);
    }
    Ok(text)
}

/// Extract the delegated credential from the request headers.
///
/// Absent or empty header: `None`, the normal trigger for service-principal
/// mode. Present but structurally invalid: `None` plus a warning. Never fails
/// and never logs the value.
#[must_use]
pub fn extract_delegated_credential(
    headers: &HeaderMap,
    header: &HeaderName,
) -> Option<SecretString> {
    let Some(value) = headers.get(header) else {
        tracing::debug!(credential_present = false, "No delegated credential on request");
        return None;
    };

    let raw = value.as_bytes();
    if raw.iter().all(u8::is_ascii_whitespace) {
        tracing::debug!(credential_present = false, "Delegated credential header is empty");
        return None;
    }

    match check_structure(raw) {
        Ok(text) => {
            tracing::debug!(credential_present = true, "Delegated credential extracted");
            Some(SecretString::from(text.to_owned()))
        }
        Err(reason) => {
            tracing::warn!(
                credential_present = true,
                reason = reason.as_str(),
                length = raw.len(),
                "Malformed delegated credential ignored; treating request as unauthenticated"
            );
            None
        }
    }
}

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub credential_header: HeaderName,
}

/// Builds the per-request [`AuthenticationContext`].
///
/// For each request:
/// 1. Extracts the delegated credential (never fails)
/// 2. Selects the mode from its presence
/// 3. Inserts an `Arc<AuthenticationContext>` carrying the correlation id
///
/// The upstream is not contacted here; identity is resolved lazily by the
/// handlers that need it.
pub async fn auth_context_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let credential = extract_delegated_credential(req.headers(), &state.credential_header);

    let mut builder = AuthenticationContext::builder().maybe_delegated_credential(credential);
    if let Some(CorrelationId(id)) = req.extensions().get::<CorrelationId>() {
        builder = builder.correlation_id(id.clone());
    }
    let ctx = builder.build();

    tracing::debug!(
        mode = %ctx.mode(),
        credential_present = ctx.has_delegated_credential(),
        "Authentication mode selected"
    );

    req.extensions_mut().insert(Arc::new(ctx));
    next.run(req).await
}

/// Extractor for the request's authentication context.
///
/// ```ignore
/// async fn handler(Auth(ctx): Auth) -> impl IntoResponse { ... }
/// ```
#[derive(Clone)]
pub struct Auth(pub Arc<AuthenticationContext>);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<AuthenticationContext>>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| {
                ApiError::from(AuthError::Internal(
                    "authentication context middleware is not installed".to_owned(),
                ))
            })
    }
}

/// Resolve the caller identity and return the subject scope for tenant-scoped storage.
///
/// Every tenant-scoped handler goes through this: there is no other way to
/// obtain a [`SubjectScope`].
///
/// # Errors
/// Returns the resolver's error, or `Unauthorized` if the guard rejects the identity.
pub async fn resolve_scope(
    resolver: &dyn IdentityResolverClient,
    ctx: &AuthenticationContext,
) -> Result<SubjectScope, ApiError> {
    resolver.resolve(ctx).await?;
    require_scope(ctx).map_err(ApiError::from)
}
