//! DJ roster lookups against the station's logging service.

use std::time::Duration;

use pload_core::types::{DbId, AUTOMATION_DJ_ID, AUTOMATION_DJ_NAME};
use serde::{Deserialize, Serialize};

use super::{build_http_client, ClientError};

/// Roster lookups are for display only, so they give up quickly.
const ROSTER_TIMEOUT: Duration = Duration::from_secs(5);

/// A DJ as listed by the roster service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dj {
    pub id: DbId,
    pub airname: String,
}

#[derive(Debug, Deserialize)]
struct RosterResponse {
    djs: Vec<Dj>,
}

/// Fetches `{id, airname}` pairs from `GET {base}/api/djs`.
pub struct RosterClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl RosterClient {
    pub fn new(base_url: Option<String>) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(ROSTER_TIMEOUT)?,
            base_url,
        })
    }

    /// The roster with automation always listed first.
    ///
    /// A failed lookup is logged and yields only the automation entry.
    pub async fn list(&self) -> Vec<Dj> {
        let mut djs = vec![Dj {
            id: AUTOMATION_DJ_ID,
            airname: AUTOMATION_DJ_NAME.to_string(),
        }];
        match self.fetch().await {
            Ok(remote) => djs.extend(remote.into_iter().filter(|dj| dj.id != AUTOMATION_DJ_ID)),
            Err(e) => tracing::warn!(error = %e, "DJ roster lookup failed"),
        }
        djs
    }

    async fn fetch(&self) -> Result<Vec<Dj>, ClientError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(ClientError::NotConfigured("TRACKMAN_URL"))?;
        let url = format!("{}/api/djs", base.trim_end_matches('/'));

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::HttpStatus(status.as_u16()));
        }
        Ok(response.json::<RosterResponse>().await?.djs)
    }
}

/// Display name for a playlist's DJ.
///
/// Playlists without a DJ belong to automation; ids missing from the roster
/// render as `[DJ #<id>]`.
pub fn dj_display_name(djs: &[Dj], dj_id: Option<DbId>) -> String {
    let id = dj_id.unwrap_or(AUTOMATION_DJ_ID);
    if id == AUTOMATION_DJ_ID {
        return AUTOMATION_DJ_NAME.to_string();
    }
    djs.iter()
        .find(|dj| dj.id == id)
        .map(|dj| dj.airname.clone())
        .unwrap_or_else(|| format!("[DJ #{id}]"))
}
