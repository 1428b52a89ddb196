pub mod calendar;
pub mod table;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Renders `instant` as wall-clock time in `tz`.
pub fn format_instant(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}
