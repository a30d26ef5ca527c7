/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Roster id reserved for unattended automation. Always available, even when
/// the roster service is unreachable.
pub const AUTOMATION_DJ_ID: DbId = 1;

/// Display name for [`AUTOMATION_DJ_ID`].
pub const AUTOMATION_DJ_NAME: &str = "Automation";

/// Queue selector for prerecorded shows (station IDs and PSAs are already
/// part of the playlist).
pub const PRERECORDED_QUEUE: &str = "prerecorded";

/// Maximum stored length of a track URL (matches the `tracks.url` column).
pub const MAX_TRACK_URL_LEN: usize = 2048;
