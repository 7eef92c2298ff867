use time::OffsetDateTime;
use time::macros::format_description;

/// Render epoch seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Returns `None` when the value is outside the range `time` can represent.
pub fn format_epoch(secs: i64) -> Option<String> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()?
        .format(&format)
        .ok()
}

/// Parse a call-log payload as epoch seconds. Surrounding ASCII whitespace
/// is ignored.
pub fn parse_epoch(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}
