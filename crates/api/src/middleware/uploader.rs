//! Uploader identity supplied by the authenticating reverse proxy.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header set by the fronting proxy after it authenticates staff.
pub const FORWARDED_USER_HEADER: &str = "x-forwarded-user";

/// The staff member behind a request, if the proxy identified one.
#[derive(Debug, Clone, Default)]
pub struct Uploader(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for Uploader {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(FORWARDED_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        Ok(Uploader(user))
    }
}
