use std::time::Duration;

/// Run the consistency checks once an hour unless `SYNC_INTERVAL_SECS` says otherwise
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);
