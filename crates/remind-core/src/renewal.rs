//! Completion handling for recurring reminders.
//!
//! A recurring reminder is never marked completed while it still has an
//! occurrence ahead of it: completing it advances the stored instant by one
//! period and reopens it. Only when the next occurrence would fall past the
//! recurrence end date does the reminder complete for good.

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::Reminder;
use crate::recurrence::next_occurrence;

/// Lifecycle of a single reminder with respect to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalState {
    Pending,
    /// Between the completion request and the write of the next instant.
    Renewing,
    Completed,
}

impl RenewalState {
    pub fn of(reminder: &Reminder) -> Self {
        if reminder.is_completed {
            RenewalState::Completed
        } else {
            RenewalState::Pending
        }
    }
}

/// What completing a reminder does to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalPlan {
    /// Stay open, move to `next`, clear `is_notified`.
    Renew { next: DateTime<Utc> },
    /// Final occurrence of a recurring reminder; plain completion.
    Terminal,
    /// Not recurring, or nothing to advance; plain completion.
    NotRecurring,
}

impl RenewalPlan {
    /// States a completed reminder passes through under this plan.
    pub fn transitions(&self) -> &'static [RenewalState] {
        match self {
            RenewalPlan::Renew { .. } => &[RenewalState::Renewing, RenewalState::Pending],
            RenewalPlan::Terminal | RenewalPlan::NotRecurring => &[RenewalState::Completed],
        }
    }
}

/// Decides how a completion request on `reminder` is applied.
///
/// Renewal happens when the reminder is recurring, has a stored instant and
/// the next occurrence does not pass `recurrence_end_date`.
pub fn plan_renewal(reminder: &Reminder) -> Result<RenewalPlan, CoreError> {
    let (pattern, datetime) = match (reminder.active_pattern(), reminder.datetime) {
        (Some(pattern), Some(datetime)) => (pattern, datetime),
        _ => return Ok(RenewalPlan::NotRecurring),
    };

    let next = next_occurrence(datetime, pattern)?;
    match reminder.recurrence_end_date {
        Some(end) if next > end => Ok(RenewalPlan::Terminal),
        _ => Ok(RenewalPlan::Renew { next }),
    }
}
