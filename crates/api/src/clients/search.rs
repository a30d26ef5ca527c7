//! Track metadata search against the station's Elasticsearch index.

use std::time::Duration;

use serde_json::{json, Value};

use super::{build_http_client, ClientError};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Queries `{base}/{index}/_search`.
pub struct SearchClient {
    client: reqwest::Client,
    base_url: Option<String>,
    index: String,
}

impl SearchClient {
    pub fn new(base_url: Option<String>, index: String) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(SEARCH_TIMEOUT)?,
            base_url,
            index,
        })
    }

    /// Free-text search; returns the raw `hits` object of the response.
    pub async fn search(&self, q: &str) -> Result<Value, ClientError> {
        let url = self.search_url()?;
        let response = self.client.get(&url).query(&[("q", q)]).send().await?;
        Ok(hits(check(response).await?))
    }

    /// Metadata stored for the document whose `url` field is exactly `url`.
    ///
    /// Returns `Ok(None)` when the index has no such document.
    pub async fn lookup_url(&self, url: &str) -> Result<Option<Value>, ClientError> {
        let endpoint = self.search_url()?;
        let body = json!({
            "size": 1,
            "query": { "match_phrase": { "url": url } },
        });
        let response = self.client.post(&endpoint).json(&body).send().await?;
        let first = hits(check(response).await?)
            .get_mut("hits")
            .and_then(|h| h.as_array_mut())
            .and_then(|h| h.first_mut())
            .and_then(|h| h.get_mut("_source"))
            .map(Value::take);
        Ok(first)
    }

    fn search_url(&self) -> Result<String, ClientError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(ClientError::NotConfigured("ELASTICSEARCH_URL"))?;
        Ok(format!("{}/{}/_search", base.trim_end_matches('/'), self.index))
    }
}

async fn check(response: reqwest::Response) -> Result<Value, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::HttpStatus(status.as_u16()));
    }
    Ok(response.json::<Value>().await?)
}

fn hits(mut body: Value) -> Value {
    body.get_mut("hits").map(Value::take).unwrap_or(Value::Null)
}
