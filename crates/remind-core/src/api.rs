//! Wire contracts of the reminder endpoints and an in-process client.
//!
//! The response types serialize to the JSON bodies the HTTP endpoints return;
//! [`LocalReminderApi`] serves the same contract straight from a repository,
//! which is how the CLI drives the notification poller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::CoreError;
use crate::models::{
    GeoPoint, RecurrencePattern, Reminder, ReminderId, UpdateOutcome, UpdateReminderData, UserId,
    VisibleReminder,
};
use crate::notify::ReminderApi;
use crate::repository::{LocationStore, ReminderRepository, Repository, VisibilityRepository};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListRemindersResponse {
    pub success: bool,
    pub reminders: Vec<VisibleReminder>,
}

impl ListRemindersResponse {
    pub fn new(reminders: Vec<VisibleReminder>) -> Self {
        Self { success: true, reminders }
    }
}

/// Body of the mutation endpoint. `renewed` and `next_occurrence` appear
/// only when the completion advanced a recurring reminder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateReminderResponse {
    pub success: bool,
    pub reminder: Reminder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_occurrence: Option<DateTime<Utc>>,
}

impl From<UpdateOutcome> for UpdateReminderResponse {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Updated(reminder) => Self {
                success: true,
                reminder,
                renewed: None,
                next_occurrence: None,
            },
            UpdateOutcome::Renewed { reminder, next_occurrence } => Self {
                success: true,
                reminder,
                renewed: Some(true),
                next_occurrence: Some(next_occurrence),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccurrencesResponse {
    pub success: bool,
    pub reminder_id: ReminderId,
    pub pattern: RecurrencePattern,
    pub occurrences: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    /// HTTP status and body for `err`. Internal failures get a generic message.
    pub fn from_error(err: &CoreError) -> (u16, Self) {
        let (status, message) = match err {
            CoreError::Validation(_) | CoreError::InvalidPattern(_) => (400, err.to_string()),
            CoreError::Forbidden(_) => (403, err.to_string()),
            CoreError::NotFound(_) => (404, err.to_string()),
            CoreError::Upstream(_) => (502, err.to_string()),
            CoreError::Database(_) | CoreError::Migration(_) | CoreError::Io(_) => {
                error!(error = ?err, "internal error");
                (500, "Internal server error".to_string())
            }
        };
        (status, Self { success: false, message })
    }
}

/// [`ReminderApi`] served directly from a repository for one user.
pub struct LocalReminderApi<R> {
    repo: Arc<R>,
    locations: Arc<dyn LocationStore>,
    user_id: UserId,
}

impl<R: Repository> LocalReminderApi<R> {
    pub fn new(repo: Arc<R>, locations: Arc<dyn LocationStore>, user_id: UserId) -> Self {
        Self { repo, locations, user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub async fn list(&self) -> Result<ListRemindersResponse, CoreError> {
        Ok(ListRemindersResponse::new(self.repo.list_reminders(self.user_id).await?))
    }

    pub async fn occurrences(&self, id: ReminderId, limit: Option<usize>) -> Result<OccurrencesResponse, CoreError> {
        let visible = self.repo.find_visible_reminder(self.user_id, id).await?;
        let occurrences = self.repo.preview_occurrences(self.user_id, id, limit).await?;
        let pattern = visible
            .reminder
            .active_pattern()
            .ok_or_else(|| CoreError::Validation("Reminder is not recurring".to_string()))?;
        Ok(OccurrencesResponse {
            success: true,
            reminder_id: id,
            pattern,
            occurrences,
        })
    }
}

#[async_trait]
impl<R: Repository + 'static> ReminderApi for LocalReminderApi<R> {
    async fn list_reminders(&self) -> Result<Vec<VisibleReminder>, CoreError> {
        Ok(self.list().await?.reminders)
    }

    async fn update_reminder(&self, id: ReminderId, data: UpdateReminderData) -> Result<UpdateReminderResponse, CoreError> {
        let outcome = self.repo.update_reminder(self.user_id, id, data).await?;
        Ok(outcome.into())
    }

    async fn delete_reminder(&self, id: ReminderId) -> Result<SuccessResponse, CoreError> {
        self.repo.delete_reminder(self.user_id, id).await?;
        Ok(SuccessResponse::ok())
    }

    async fn location(&self, location_id: &str) -> Result<Option<GeoPoint>, CoreError> {
        Ok(self
            .locations
            .find_location(location_id)
            .await?
            .map(|record| record.point()))
    }
}
