use std::sync::Arc;
use std::time::Duration;

use pload_core::url_normalizer::{UrlNormalizer, UrlProbe};

use crate::clients::{ClientError, HttpUrlProbe, RosterClient, SearchClient};
use crate::config::ServerConfig;
use crate::scheduling::PlaylistScheduler;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: pload_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Playlist lifecycle and dispense service.
    pub scheduler: Arc<PlaylistScheduler>,
    /// DJ roster lookups.
    pub roster: Arc<RosterClient>,
    /// Track metadata search.
    pub search: Arc<SearchClient>,
}

impl AppState {
    /// Wire every service from configuration.
    ///
    /// The reachability probe is only installed when
    /// `station.check_exists` is set. Fails if an HTTP client cannot be
    /// built with its configured timeout.
    pub fn new(pool: pload_db::DbPool, config: ServerConfig) -> Result<Self, ClientError> {
        let station = &config.station;
        let probe: Option<Arc<dyn UrlProbe>> = if station.check_exists {
            let timeout = Duration::from_secs(station.probe_timeout_secs);
            Some(Arc::new(HttpUrlProbe::new(timeout)?))
        } else {
            None
        };
        let normalizer = UrlNormalizer::new(station.url_rewrites.clone(), probe);

        Self::with_normalizer(pool, config, normalizer)
    }

    /// Like [`new`](Self::new) but with a caller-supplied normalizer.
    pub fn with_normalizer(
        pool: pload_db::DbPool,
        config: ServerConfig,
        normalizer: UrlNormalizer,
    ) -> Result<Self, ClientError> {
        let station = &config.station;
        let roster = Arc::new(RosterClient::new(station.trackman_url.clone())?);
        let search = Arc::new(SearchClient::new(
            station.elasticsearch_url.clone(),
            station.search_index.clone(),
        )?);
        let scheduler = Arc::new(PlaylistScheduler::new(pool.clone(), normalizer));

        Ok(Self {
            pool,
            config: Arc::new(config),
            scheduler,
            roster,
            search,
        })
    }
}
