use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;

pub type UserId = i64;
pub type ReminderId = i64;
pub type GroupId = i64;

/// What fires a reminder: a point in time, proximity to a place, or both.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReminderType {
    #[default]
    Datetime,
    Location,
    Both,
}

impl ReminderType {
    pub fn requires_datetime(self) -> bool {
        matches!(self, ReminderType::Datetime | ReminderType::Both)
    }

    pub fn requires_location(self) -> bool {
        matches!(self, ReminderType::Location | ReminderType::Both)
    }
}

impl std::fmt::Display for ReminderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderType::Datetime => write!(f, "datetime"),
            ReminderType::Location => write!(f, "location"),
            ReminderType::Both => write!(f, "both"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid reminder type: {0}. Use datetime, location or both")]
pub struct ParseReminderTypeError(String);

impl FromStr for ReminderType {
    type Err = ParseReminderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "datetime" => Ok(ReminderType::Datetime),
            "location" => Ok(ReminderType::Location),
            "both" => Ok(ReminderType::Both),
            _ => Err(ParseReminderTypeError(s.to_string())),
        }
    }
}

impl From<ParseReminderTypeError> for CoreError {
    fn from(err: ParseReminderTypeError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

/// Spacing between consecutive occurrences of a recurring reminder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    pub const ALL: [RecurrencePattern; 4] = [
        RecurrencePattern::Daily,
        RecurrencePattern::Weekly,
        RecurrencePattern::Monthly,
        RecurrencePattern::Yearly,
    ];
}

impl std::fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecurrencePattern::Daily => write!(f, "daily"),
            RecurrencePattern::Weekly => write!(f, "weekly"),
            RecurrencePattern::Monthly => write!(f, "monthly"),
            RecurrencePattern::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence pattern: {0}")]
pub struct ParseRecurrencePatternError(pub String);

impl FromStr for RecurrencePattern {
    type Err = ParseRecurrencePatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            "yearly" => Ok(RecurrencePattern::Yearly),
            _ => Err(ParseRecurrencePatternError(s.to_string())),
        }
    }
}

impl From<ParseRecurrencePatternError> for CoreError {
    fn from(err: ParseRecurrencePatternError) -> Self {
        CoreError::InvalidPattern(err.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Reminder {
    pub id: ReminderId,
    /// Owner of the row.
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub reminder_type: ReminderType,
    /// Required iff `reminder_type` is `datetime` or `both`.
    pub datetime: Option<DateTime<Utc>>,
    /// Required iff `reminder_type` is `location` or `both`.
    pub address: Option<String>,
    pub location_id: Option<String>,
    pub is_completed: bool,
    /// Owner-scoped acknowledgement flag.
    pub is_notified: bool,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    /// Renewal never advances past this instant.
    pub recurrence_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// The pattern in effect, only when the reminder is flagged recurring.
    pub fn active_pattern(&self) -> Option<RecurrencePattern> {
        if self.is_recurring {
            self.recurrence_pattern
        } else {
            None
        }
    }

    /// True once the stored instant has been reached and the reminder is open.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.datetime.is_some_and(|dt| dt <= now)
    }
}

impl Default for Reminder {
    fn default() -> Self {
        Self {
            id: 0,
            user_id: 0,
            title: String::new(),
            description: None,
            reminder_type: ReminderType::Datetime,
            datetime: None,
            address: None,
            location_id: None,
            is_completed: false,
            is_notified: false,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Friendship {
    pub id: i64,
    pub requester_id: UserId,
    pub addressee_id: UserId,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

/// How a non-owned reminder reached the viewer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ShareKind {
    /// Direct grant from a friend.
    Friend,
    /// Grant through a group the viewer belongs to.
    Group,
}

/// Someone (or some group) an owned reminder is shared with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Recipient {
    pub reminder_id: ReminderId,
    pub kind: ShareKind,
    /// User id for friend grants, group id for group grants.
    pub recipient_id: i64,
    pub name: String,
    pub can_edit: bool,
}

/// A reminder as seen by one user, annotated with ownership and rights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisibleReminder {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub is_owner: bool,
    pub can_edit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_via: Option<ShareKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Filled for owned reminders only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with: Vec<Recipient>,
}

impl VisibleReminder {
    pub fn owned(reminder: Reminder) -> Self {
        Self {
            reminder,
            is_owner: true,
            can_edit: true,
            shared_via: None,
            shared_by: None,
            shared_by_name: None,
            group_id: None,
            group_name: None,
            shared_with: Vec::new(),
        }
    }

    pub fn id(&self) -> ReminderId {
        self.reminder.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A geocoded point persisted by the location store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LocationRecord {
    pub id: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
}

impl LocationRecord {
    pub fn point(&self) -> GeoPoint {
        GeoPoint { lat: self.lat, lng: self.lng }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewReminderData {
    pub title: String,
    pub description: Option<String>,
    pub reminder_type: ReminderType,
    pub datetime: Option<DateTime<Utc>>,
    pub address: Option<String>,
    /// When present the reminder is created recurring.
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<DateTime<Utc>>,
}

/// Partial update accepted by the reminder mutation entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateReminderData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        with = "::serde_with::rust::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_notified: Option<bool>,
}

impl UpdateReminderData {
    pub fn is_empty(&self) -> bool {
        !self.touches_content() && self.is_completed.is_none() && self.is_notified.is_none()
    }

    /// Title, description, instant or place.
    pub fn touches_content(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.datetime.is_some()
            || self.address.is_some()
    }
}

/// Result of the mutation entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Reminder),
    /// Completion of a recurring reminder advanced it in place.
    Renewed {
        reminder: Reminder,
        next_occurrence: DateTime<Utc>,
    },
}

impl UpdateOutcome {
    pub fn reminder(&self) -> &Reminder {
        match self {
            UpdateOutcome::Updated(reminder) => reminder,
            UpdateOutcome::Renewed { reminder, .. } => reminder,
        }
    }

    pub fn into_reminder(self) -> Reminder {
        match self {
            UpdateOutcome::Updated(reminder) => reminder,
            UpdateOutcome::Renewed { reminder, .. } => reminder,
        }
    }

    pub fn next_occurrence(&self) -> Option<DateTime<Utc>> {
        match self {
            UpdateOutcome::Updated(_) => None,
            UpdateOutcome::Renewed { next_occurrence, .. } => Some(*next_occurrence),
        }
    }
}
