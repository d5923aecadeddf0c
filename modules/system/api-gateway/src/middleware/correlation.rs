//! Correlation id handling.
//!
//! An inbound correlation id is reused verbatim when it is usable; otherwise a
//! UUID v4 is generated. The id is echoed on the response, recorded on the
//! `http_request` span and made available to handlers as [`CorrelationId`].

use authgate_security::constants::MAX_CORRELATION_ID_LEN;
use axum::{extract::Request, middleware::Next, response::Response};
use http::{HeaderMap, HeaderName, HeaderValue};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Correlation id of the current request, stored in request extensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrelationId(pub String);

/// Generates a UUID v4 when the request carries no correlation id.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _req: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Whether an inbound value can be reused as the correlation id.
///
/// Any non-empty, visible-ASCII value up to the length limit is accepted, so
/// ids minted by upstream proxies in other formats survive unchanged.
#[must_use]
pub fn is_usable(value: &HeaderValue) -> bool {
    let bytes = value.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= MAX_CORRELATION_ID_LEN
        && bytes.iter().all(|b| b.is_ascii_graphic())
}

/// Read the correlation id from `headers`, if present.
#[must_use]
pub fn read(headers: &HeaderMap, header: &HeaderName) -> Option<String> {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Drop an unusable inbound correlation header so a fresh id is generated.
///
/// Runs outermost, before `SetRequestIdLayer`.
pub async fn discard_unusable(header: HeaderName, mut req: Request, next: Next) -> Response {
    let unusable = req.headers().get(&header).is_some_and(|v| !is_usable(v));
    if unusable {
        req.headers_mut().remove(&header);
    }
    next.run(req).await
}

/// Store the correlation id in request extensions for handlers and the auth middleware.
///
/// Must run inside the trace layer, after the id has been set on the request.
pub async fn push_correlation_id_to_extensions(
    header: HeaderName,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(id) = read(req.headers(), &header) {
        tracing::Span::current().record("correlation_id", id.as_str());
        req.extensions_mut().insert(CorrelationId(id));
    }
    next.run(req).await
}
