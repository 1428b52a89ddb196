use anyhow::{anyhow, Result};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a user-facing instant: RFC 3339, `YYYY-MM-DD HH:MM` in `tz`, a bare
/// date (midnight in `tz`), or an English expression such as "tomorrow 9am".
pub fn parse_datetime(input: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return localize(naive, tz);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return localize(date.and_time(NaiveTime::MIN), tz);
    }

    parse_date_string(input, Utc::now().with_timezone(&tz), Dialect::Uk)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

/// Like [`parse_datetime`], but a bare date covers the whole day.
pub fn parse_end_date(input: &str, tz: Tz) -> Result<DateTime<Utc>> {
    match NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        Ok(date) => {
            let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
            localize(date.and_time(end_of_day), tz)
        }
        Err(_) => parse_datetime(input, tz),
    }
}

/// `YYYY-MM` into a (year, month) pair.
pub fn parse_month(input: &str) -> Result<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", input.trim()), "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid month '{}'. Use YYYY-MM", input))?;
    Ok((chrono::Datelike::year(&date), chrono::Datelike::month(&date)))
}

fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(anyhow!("{} does not exist in {}", naive, tz)),
    }
}
