//! HTTP clients for services the scheduler talks to but does not own.
//!
//! Every client degrades gracefully: a failing collaborator never fails the
//! request that consulted it, except for the reachability probe, whose
//! failure is the validation result.

pub mod probe;
pub mod roster;
pub mod search;

pub use probe::HttpUrlProbe;
pub use roster::{Dj, RosterClient};
pub use search::SearchClient;

/// Error type for collaborator requests.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Remote returned HTTP {0}")]
    HttpStatus(u16),

    /// The collaborator is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Build a client with the given per-request timeout.
pub(crate) fn build_http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, ClientError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("pload/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
