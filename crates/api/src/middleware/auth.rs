//! HTTP Basic authentication for the automation client.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pload_core::error::CoreError;

use crate::config::AutomationCredentials;
use crate::error::AppError;
use crate::state::AppState;

/// Marker extractor proving the request carried the automation credentials.
///
/// ```ignore
/// async fn next_track(_client: AutomationClient) -> AppResult<Response> { .. }
/// ```
#[derive(Debug, Clone)]
pub struct AutomationClient {
    pub username: String,
}

impl FromRequestParts<AppState> for AutomationClient {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.station.automation.as_ref() else {
            return Err(unauthorized("Automation access is not configured"));
        };

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let (username, password) =
            parse_basic(header).ok_or_else(|| unauthorized("Invalid Basic credentials"))?;

        if !credentials_match(expected, &username, &password) {
            tracing::warn!(username = %username, "Rejected automation credentials");
            return Err(unauthorized("Invalid Basic credentials"));
        }

        Ok(AutomationClient { username })
    }
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

/// Decode `Basic <base64(user:pass)>`. The scheme is case-insensitive.
fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn credentials_match(expected: &AutomationCredentials, username: &str, password: &str) -> bool {
    // Both fields are always compared.
    let user_ok = constant_time_eq(expected.username.as_bytes(), username.as_bytes());
    let pass_ok = constant_time_eq(expected.password.as_bytes(), password.as_bytes());
    user_ok & pass_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_header() {
        let header = format!("Basic {}", STANDARD.encode("liquidsoap:hackme"));
        assert_eq!(
            parse_basic(&header),
            Some(("liquidsoap".to_string(), "hackme".to_string()))
        );
    }

    #[test]
    fn password_may_contain_colons() {
        let header = format!("basic {}", STANDARD.encode("user:a:b"));
        assert_eq!(parse_basic(&header), Some(("user".into(), "a:b".into())));
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert_eq!(parse_basic("Bearer abc"), None);
        assert_eq!(parse_basic("Basic !!!"), None);
        assert_eq!(parse_basic(&format!("Basic {}", STANDARD.encode("nocolon"))), None);
    }

    #[test]
    fn credentials_must_match_exactly() {
        let expected = AutomationCredentials {
            username: "auto".into(),
            password: "secret".into(),
        };
        assert!(credentials_match(&expected, "auto", "secret"));
        assert!(!credentials_match(&expected, "auto", "secret2"));
        assert!(!credentials_match(&expected, "Auto", "secret"));
    }
}
