//! Occurrence arithmetic for recurring reminders.
//!
//! Everything here is pure: the functions take an instant and a
//! [`RecurrencePattern`] and compute later instants without touching storage.
//! Pattern strings are validated once, when they enter the system, through
//! [`parse_pattern`]; past that point the closed enum makes an unknown pattern
//! unrepresentable.

use chrono::{DateTime, Days, Months, Utc};

use crate::calendar::Locale;
use crate::error::CoreError;
use crate::models::RecurrencePattern;

/// Default number of instants returned by an occurrence preview.
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;
/// Upper bound accepted for an occurrence preview.
pub const MAX_PREVIEW_LIMIT: usize = 100;

/// Validates a user-supplied pattern string.
pub fn parse_pattern(raw: &str) -> Result<RecurrencePattern, CoreError> {
    Ok(raw.parse::<RecurrencePattern>()?)
}

/// Next instant after `instant`, or `None` when it would leave chrono's range.
///
/// Monthly and yearly steps keep the day of month when it exists in the
/// target month and clamp to the month's last day otherwise (Jan 31 → Feb 28/29,
/// Feb 29 → Feb 28 of a common year). Wall-clock time is always preserved.
pub fn checked_next_occurrence(
    instant: DateTime<Utc>,
    pattern: RecurrencePattern,
) -> Option<DateTime<Utc>> {
    match pattern {
        RecurrencePattern::Daily => instant.checked_add_days(Days::new(1)),
        RecurrencePattern::Weekly => instant.checked_add_days(Days::new(7)),
        RecurrencePattern::Monthly => instant.checked_add_months(Months::new(1)),
        RecurrencePattern::Yearly => instant.checked_add_months(Months::new(12)),
    }
}

/// Next instant for `pattern`; always strictly later than `instant`.
pub fn next_occurrence(
    instant: DateTime<Utc>,
    pattern: RecurrencePattern,
) -> Result<DateTime<Utc>, CoreError> {
    checked_next_occurrence(instant, pattern).ok_or_else(|| {
        CoreError::Validation(format!(
            "Next {} occurrence after {} is out of range",
            pattern, instant
        ))
    })
}

/// Up to `count` instants following `start`, stopping early at the first
/// instant later than `end_date`. `start` itself is not included.
pub fn generate_occurrences(
    start: DateTime<Utc>,
    pattern: RecurrencePattern,
    count: usize,
    end_date: Option<DateTime<Utc>>,
) -> Vec<DateTime<Utc>> {
    Occurrences::new(start, pattern, end_date).take(count).collect()
}

/// Restartable walk over the instants following a start instant.
///
/// Cloning the iterator restarts from the clone point; the source reminder is
/// never touched. Without an end date the walk is unbounded, so callers bound
/// it with `take` or a comparison.
#[derive(Debug, Clone)]
pub struct Occurrences {
    current: DateTime<Utc>,
    pattern: RecurrencePattern,
    end_date: Option<DateTime<Utc>>,
    exhausted: bool,
}

impl Occurrences {
    pub fn new(
        start: DateTime<Utc>,
        pattern: RecurrencePattern,
        end_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            current: start,
            pattern,
            end_date,
            exhausted: false,
        }
    }
}

impl Iterator for Occurrences {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let next = match checked_next_occurrence(self.current, self.pattern) {
            Some(next) => next,
            None => {
                self.exhausted = true;
                return None;
            }
        };
        if self.end_date.is_some_and(|end| next > end) {
            self.exhausted = true;
            return None;
        }
        self.current = next;
        Some(next)
    }
}

impl std::iter::FusedIterator for Occurrences {}

impl RecurrencePattern {
    /// Human label for the pattern.
    pub fn label(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (RecurrencePattern::Daily, Locale::En) => "Daily",
            (RecurrencePattern::Weekly, Locale::En) => "Weekly",
            (RecurrencePattern::Monthly, Locale::En) => "Monthly",
            (RecurrencePattern::Yearly, Locale::En) => "Yearly",
            (RecurrencePattern::Daily, Locale::Es) => "Diaria",
            (RecurrencePattern::Weekly, Locale::Es) => "Semanal",
            (RecurrencePattern::Monthly, Locale::Es) => "Mensual",
            (RecurrencePattern::Yearly, Locale::Es) => "Anual",
        }
    }
}

/// Clamps a requested preview size into `1..=MAX_PREVIEW_LIMIT`.
pub fn clamp_preview_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_PREVIEW_LIMIT)
        .clamp(1, MAX_PREVIEW_LIMIT)
}
