//! Reachability probe used when validating uploaded track URLs.

use std::time::Duration;

use async_trait::async_trait;
use pload_core::url_normalizer::UrlProbe;
use reqwest::StatusCode;

use super::{build_http_client, ClientError};

/// Probes a URL with `HEAD`, falling back to `GET` for servers that reject
/// `HEAD`. Any 2xx response counts as reachable; nothing is retried.
pub struct HttpUrlProbe {
    client: reqwest::Client,
}

impl HttpUrlProbe {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }

    async fn check(&self, url: &str) -> Result<(), ClientError> {
        let response = self.client.head(url).send().await?;
        let status = match response.status() {
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED => {
                self.client.get(url).send().await?.status()
            }
            status => status,
        };
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::HttpStatus(status.as_u16()))
        }
    }
}

#[async_trait]
impl UrlProbe for HttpUrlProbe {
    async fn probe(&self, url: &str) -> Result<(), String> {
        self.check(url).await.map_err(|e| {
            tracing::debug!(url, error = %e, "Track URL probe failed");
            e.to_string()
        })
    }
}
