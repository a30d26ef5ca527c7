use chrono_tz::Tz;
use pload_core::timeslot::TimeSlotTable;
use pload_core::url_normalizer::RewriteRule;

/// Default upload rewrite: public files host to the internal archive host.
const DEFAULT_URL_REWRITES: &str =
    r"https://files\.apps\.wuvt\.vt\.edu=>http://alexandria.wuvt.vt.edu";

/// Default display rewrites: internal hosts back to the public files host.
const DEFAULT_DISPLAY_REWRITES: &str = r"http://alexandria\.wuvt\.vt\.edu=>https://files.apps.wuvt.vt.edu;http://192\.168\.0\.25=>https://files.apps.wuvt.vt.edu";

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Station scheduling settings.
    pub station: StationConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    ///
    /// Station settings are documented on [`StationConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            station: StationConfig::from_env(),
        }
    }
}

/// Basic-auth credentials accepted on the dispense endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationCredentials {
    pub username: String,
    pub password: String,
}

/// Scheduling, validation, and collaborator settings for the station.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Timezone the time-slot table and upload dates are expressed in.
    pub timezone: Tz,
    /// Named daily slots.
    pub time_slots: TimeSlotTable,
    /// Whether uploads probe each URL for reachability.
    pub check_exists: bool,
    /// Rewrites applied to uploaded URLs before validation.
    pub url_rewrites: Vec<RewriteRule>,
    /// Rewrites applied to stored URLs when shown to staff.
    pub display_rewrites: Vec<RewriteRule>,
    /// Timeout for a single reachability probe.
    pub probe_timeout_secs: u64,
    /// Base URL of the DJ roster service.
    pub trackman_url: Option<String>,
    /// Base URL of the search index.
    pub elasticsearch_url: Option<String>,
    /// Search index holding track metadata.
    pub search_index: String,
    /// `None` rejects every dispense request.
    pub automation: Option<AutomationCredentials>,
}

impl StationConfig {
    /// Load station settings from environment variables.
    ///
    /// | Env Var                       | Default                        |
    /// |-------------------------------|--------------------------------|
    /// | `TIME_SLOT_TZ`                | `America/New_York`             |
    /// | `TIME_SLOTS`                  | station weekday table          |
    /// | `TRACK_VALIDATE_CHECK_EXISTS` | `true`                         |
    /// | `TRACK_URL_REWRITES`          | files host -> archive host     |
    /// | `TRACK_URL_DISPLAY_REWRITES`  | archive hosts -> files host    |
    /// | `PROBE_TIMEOUT_SECS`          | `10`                           |
    /// | `TRACKMAN_URL`                | unset                          |
    /// | `ELASTICSEARCH_URL`           | unset                          |
    /// | `SEARCH_INDEX`                | `songs`                        |
    /// | `AUTOMATION_USERNAME`         | unset                          |
    /// | `AUTOMATION_PASSWORD`         | unset                          |
    pub fn from_env() -> Self {
        let timezone: Tz = std::env::var("TIME_SLOT_TZ")
            .unwrap_or_else(|_| "America/New_York".into())
            .parse()
            .expect("TIME_SLOT_TZ must be an IANA timezone name");

        let time_slots = match std::env::var("TIME_SLOTS") {
            Ok(spec) => TimeSlotTable::parse(&spec).expect("TIME_SLOTS is malformed"),
            Err(_) => TimeSlotTable::station_default(),
        };

        let check_exists = std::env::var("TRACK_VALIDATE_CHECK_EXISTS")
            .map(|v| parse_bool(&v).expect("TRACK_VALIDATE_CHECK_EXISTS must be a boolean"))
            .unwrap_or(true);

        let url_rewrites = RewriteRule::parse_list(
            &std::env::var("TRACK_URL_REWRITES").unwrap_or_else(|_| DEFAULT_URL_REWRITES.into()),
        )
        .expect("TRACK_URL_REWRITES is malformed");

        let display_rewrites = RewriteRule::parse_list(
            &std::env::var("TRACK_URL_DISPLAY_REWRITES")
                .unwrap_or_else(|_| DEFAULT_DISPLAY_REWRITES.into()),
        )
        .expect("TRACK_URL_DISPLAY_REWRITES is malformed");

        let probe_timeout_secs: u64 = std::env::var("PROBE_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("PROBE_TIMEOUT_SECS must be a valid u64");

        let trackman_url = non_empty_var("TRACKMAN_URL");
        let elasticsearch_url = non_empty_var("ELASTICSEARCH_URL");
        let search_index = std::env::var("SEARCH_INDEX").unwrap_or_else(|_| "songs".into());

        let automation = match (
            non_empty_var("AUTOMATION_USERNAME"),
            non_empty_var("AUTOMATION_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(AutomationCredentials { username, password }),
            _ => None,
        };

        Self {
            timezone,
            time_slots,
            check_exists,
            url_rewrites,
            display_rewrites,
            probe_timeout_secs,
            trackman_url,
            elasticsearch_url,
            search_index,
            automation,
        }
    }
}

impl Default for StationConfig {
    /// Station defaults with every external collaborator and the reachability
    /// probe disabled.
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
            time_slots: TimeSlotTable::station_default(),
            check_exists: false,
            url_rewrites: Vec::new(),
            display_rewrites: Vec::new(),
            probe_timeout_secs: 10,
            trackman_url: None,
            elasticsearch_url: None,
            search_index: "songs".into(),
            automation: None,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
