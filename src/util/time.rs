use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 string with millisecond precision, e.g.
/// `2025-03-01T12:00:00.000Z`, the format the web client writes timestamps in.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
