//! Requester-identity extraction.
//!
//! Authentication middleware proper (sessions, tokens, password hashing) is
//! out of scope for this service; an upstream gateway is expected to resolve
//! the caller and pass the opaque identity in the `x-user-id` header. This
//! module only reads that header.

use axum::http::HeaderMap;
use fable_core::UserId;

/// Header carrying the resolved caller identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracts the requester identity from the request headers, if present.
///
/// Returns `None` when the header is absent, empty, or not valid UTF-8 —
/// the caller is then treated as anonymous (or rejected, on auth-required
/// routes).
pub fn requester_from_headers(headers: &HeaderMap) -> Option<UserId> {
    let value = headers.get(USER_ID_HEADER)?;
    let text = value.to_str().ok()?;
    UserId::new(text).ok()
}
