//! Calendar expansion: turns the visible reminder set into concrete, dated
//! occurrences for a bounded window, and lays them out on a month grid.
//!
//! Occurrences are recomputed on every render and never written back.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;
use crate::models::{RecurrencePattern, Reminder};
use crate::recurrence::checked_next_occurrence;

/// Hour at which dateless (location-only) recurring reminders are anchored.
pub const LOCATION_ANCHOR_HOUR: u32 = 9;
/// Months rendered before the displayed month.
pub const MONTHS_BEFORE: u32 = 3;
/// Months rendered after the displayed month.
pub const MONTHS_AFTER: u32 = 4;
/// How far past the window end a single reminder walk may run.
const SAFETY_HORIZON: Months = Months::new(12);
const GRID_CELLS: usize = 42;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub fn month_name(self, month: u32) -> &'static str {
        const EN: [&str; 12] = [
            "January", "February", "March", "April", "May", "June", "July", "August",
            "September", "October", "November", "December",
        ];
        const ES: [&str; 12] = [
            "Enero", "Febrero", "Marzo", "Abril", "Mayo", "Junio", "Julio", "Agosto",
            "Septiembre", "Octubre", "Noviembre", "Diciembre",
        ];
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            Locale::En => EN[idx],
            Locale::Es => ES[idx],
        }
    }

    /// Monday-first weekday labels.
    pub fn weekday_labels(self) -> [&'static str; 7] {
        match self {
            Locale::En => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            Locale::Es => ["Lun", "Mar", "Mié", "Jue", "Vie", "Sáb", "Dom"],
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid locale: {0}. Use en or es")]
pub struct ParseLocaleError(String);

impl FromStr for Locale {
    type Err = ParseLocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(Locale::En),
            "es" | "es-es" | "spanish" | "español" => Ok(Locale::Es),
            _ => Err(ParseLocaleError(s.to_string())),
        }
    }
}

/// Inclusive instant range the expander renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::Validation(
                "Calendar window ends before it starts".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Three months before through four months after the given month.
    pub fn around_month(year: i32, month: u32) -> Result<Self, CoreError> {
        let first = first_of_month(year, month)?;
        let start_day = first
            .checked_sub_months(Months::new(MONTHS_BEFORE))
            .ok_or_else(|| out_of_range(year, month))?;
        let after_last = first
            .checked_add_months(Months::new(MONTHS_AFTER + 1))
            .ok_or_else(|| out_of_range(year, month))?;

        let start = start_day.and_time(NaiveTime::MIN).and_utc();
        let end = after_last.and_time(NaiveTime::MIN).and_utc() - Duration::seconds(1);
        Self::new(start, end)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// One concrete, dated instance of a reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence<'a> {
    pub reminder: &'a Reminder,
    pub datetime: DateTime<Utc>,
    pub is_recurring_occurrence: bool,
    /// Synthesized at the 09:00 anchor for a reminder with no stored instant.
    pub is_location_marker: bool,
}

/// Every occurrence of `reminders` inside `window`, ordered by instant.
///
/// `today` anchors the synthesized occurrences of dateless recurring
/// reminders at 09:00 wall-clock time in `tz`.
pub fn expand<'a, I, Tz>(reminders: I, window: &CalendarWindow, today: NaiveDate, tz: &Tz) -> Vec<Occurrence<'a>>
where
    I: IntoIterator<Item = &'a Reminder>,
    Tz: TimeZone,
{
    let mut occurrences = Vec::new();

    for reminder in reminders {
        match (reminder.active_pattern(), reminder.datetime) {
            (None, Some(datetime)) => {
                if window.contains(datetime) {
                    occurrences.push(Occurrence {
                        reminder,
                        datetime,
                        is_recurring_occurrence: false,
                        is_location_marker: false,
                    });
                }
            }
            (Some(pattern), Some(datetime)) => {
                walk(reminder, pattern, datetime, window, false, &mut occurrences);
            }
            (Some(pattern), None) if reminder.reminder_type.requires_location() => {
                let anchor = today
                    .and_hms_opt(LOCATION_ANCHOR_HOUR, 0, 0)
                    .and_then(|naive| tz.from_local_datetime(&naive).earliest())
                    .map(|local| local.with_timezone(&Utc));
                if let Some(anchor) = anchor {
                    walk(reminder, pattern, anchor, window, true, &mut occurrences);
                }
            }
            _ => {}
        }
    }

    occurrences.sort_by(|a, b| {
        a.datetime
            .cmp(&b.datetime)
            .then_with(|| a.reminder.id.cmp(&b.reminder.id))
    });
    occurrences
}

fn walk<'a>(
    reminder: &'a Reminder,
    pattern: RecurrencePattern,
    from: DateTime<Utc>,
    window: &CalendarWindow,
    is_location_marker: bool,
    out: &mut Vec<Occurrence<'a>>,
) {
    let limit = match reminder.recurrence_end_date {
        Some(end_date) if end_date < window.end => end_date,
        _ => window.end,
    };
    let horizon = window.end.checked_add_months(SAFETY_HORIZON).unwrap_or(window.end);

    let mut current = fast_forward(from, pattern, window.start);
    while current <= limit && current <= horizon {
        if current >= window.start {
            out.push(Occurrence {
                reminder,
                datetime: current,
                is_recurring_occurrence: true,
                is_location_marker,
            });
        }
        current = match checked_next_occurrence(current, pattern) {
            Some(next) => next,
            None => break,
        };
    }
}

/// Skips whole fixed-length periods that end before `target`.
///
/// Monthly and yearly steps have variable length (and clamp), so they are
/// walked one by one from the stored instant.
fn fast_forward(from: DateTime<Utc>, pattern: RecurrencePattern, target: DateTime<Utc>) -> DateTime<Utc> {
    let period = match pattern {
        RecurrencePattern::Daily => Duration::days(1),
        RecurrencePattern::Weekly => Duration::days(7),
        RecurrencePattern::Monthly | RecurrencePattern::Yearly => return from,
    };
    if from >= target {
        return from;
    }
    let periods = (target - from).num_seconds() / period.num_seconds();
    from.checked_add_signed(period * periods as i32).unwrap_or(from)
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, CoreError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| out_of_range(year, month))
}

fn out_of_range(year: i32, month: u32) -> CoreError {
    CoreError::Validation(format!("Invalid calendar month: {}-{:02}", year, month))
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell<'a> {
    pub date: NaiveDate,
    /// False for the leading/trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub is_today: bool,
    pub occurrences: Vec<Occurrence<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthView<'a> {
    pub title: String,
    pub weekday_labels: [&'static str; 7],
    /// Six Monday-first weeks.
    pub days: Vec<DayCell<'a>>,
}

/// The displayed month and locale of a calendar screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarView {
    first: NaiveDate,
    locale: Locale,
}

impl CalendarView {
    pub fn new(year: i32, month: u32, locale: Locale) -> Result<Self, CoreError> {
        Ok(Self {
            first: first_of_month(year, month)?,
            locale,
        })
    }

    pub fn containing(date: NaiveDate, locale: Locale) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
            locale,
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn next_month(&mut self) {
        if let Some(next) = self.first.checked_add_months(Months::new(1)) {
            self.first = next;
        }
    }

    pub fn previous_month(&mut self) {
        if let Some(previous) = self.first.checked_sub_months(Months::new(1)) {
            self.first = previous;
        }
    }

    /// Only labels depend on the locale; the occurrence set does not.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    pub fn window(&self) -> Result<CalendarWindow, CoreError> {
        CalendarWindow::around_month(self.year(), self.month())
    }

    pub fn title(&self) -> String {
        format!("{} {}", self.locale.month_name(self.month()), self.year())
    }

    /// Lays the window's occurrences out on the grid, assigning each to its
    /// calendar day in `tz`.
    pub fn render<'a, I, Tz>(&self, reminders: I, today: NaiveDate, tz: &Tz) -> Result<MonthView<'a>, CoreError>
    where
        I: IntoIterator<Item = &'a Reminder>,
        Tz: TimeZone,
    {
        let occurrences = expand(reminders, &self.window()?, today, tz);

        let lead = self.first.weekday().num_days_from_monday() as u64;
        let grid_start = self
            .first
            .checked_sub_days(chrono::Days::new(lead))
            .ok_or_else(|| out_of_range(self.year(), self.month()))?;

        let days = grid_start
            .iter_days()
            .take(GRID_CELLS)
            .map(|date| {
                let in_month = date.month() == self.month() && date.year() == self.year();
                let occurrences = if in_month {
                    occurrences_on(&occurrences, date, tz)
                        .into_iter()
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                DayCell {
                    date,
                    in_month,
                    is_today: date == today,
                    occurrences,
                }
            })
            .collect();

        Ok(MonthView {
            title: self.title(),
            weekday_labels: self.locale.weekday_labels(),
            days,
        })
    }
}

/// Occurrences falling on `date` as seen in `tz`.
pub fn occurrences_on<'a, 'b, Tz: TimeZone>(
    occurrences: &'b [Occurrence<'a>],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<&'b Occurrence<'a>> {
    occurrences
        .iter()
        .filter(|o| o.datetime.with_timezone(tz).date_naive() == date)
        .collect()
}
