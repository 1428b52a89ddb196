use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, info, instrument, warn};

use crate::error::CoreError;
use crate::models::{
    LocationRecord, NewReminderData, RecurrencePattern, Reminder, ReminderId, UpdateOutcome,
    UpdateReminderData, UserId, VisibleReminder,
};
use crate::recurrence::{clamp_preview_limit, generate_occurrences};
use crate::renewal::{plan_renewal, RenewalPlan, RenewalState};
use crate::repository::{ReminderRepository, SocialRepository, SqliteRepository};
use crate::visibility::{check_update, AccessLevel};

#[async_trait]
impl ReminderRepository for SqliteRepository {
    #[instrument(skip(self, data), fields(title = %data.title))]
    async fn add_reminder(&self, user_id: UserId, data: NewReminderData) -> Result<Reminder, CoreError> {
        let data = validate_new_reminder(data)?;

        if self.find_user_by_id(user_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("User {}", user_id)));
        }

        // Geocoding failure aborts the create before anything is written.
        let location = match &data.address {
            Some(address) if data.reminder_type.requires_location() => {
                Some(self.store_address(address).await?)
            }
            _ => None,
        };

        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO reminders (
                user_id, title, description, reminder_type, datetime, address, location_id,
                is_completed, is_notified, is_recurring, recurrence_pattern, recurrence_end_date,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, FALSE, FALSE, ?, ?, ?, ?, ?)"#,
        )
        .bind(user_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.reminder_type)
        .bind(data.datetime)
        .bind(&data.address)
        .bind(location.as_ref().map(|l| l.id.clone()))
        .bind(data.recurrence_pattern.is_some())
        .bind(data.recurrence_pattern)
        .bind(data.recurrence_end_date)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        let reminder = self.fetch_reminder(result.last_insert_rowid()).await?;
        info!(reminder_id = reminder.id, user_id, recurring = reminder.is_recurring, "reminder created");
        Ok(reminder)
    }

    async fn find_reminder_by_id(&self, id: ReminderId) -> Result<Option<Reminder>, CoreError> {
        let reminder = sqlx::query_as("SELECT * FROM reminders WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(reminder)
    }

    async fn find_visible_reminder(&self, user_id: UserId, id: ReminderId) -> Result<VisibleReminder, CoreError> {
        let owned = self.owned_rows(user_id, Some(id)).await?;
        if !owned.is_empty() {
            let mut visible = self.with_recipients(user_id, owned).await?;
            if let Some(reminder) = visible.pop() {
                return Ok(reminder);
            }
        }

        if let Some(shared) = self.friend_rows(user_id, Some(id)).await?.into_iter().next() {
            return Ok(shared);
        }
        if let Some(shared) = self.group_rows(user_id, Some(id)).await?.into_iter().next() {
            return Ok(shared);
        }

        Err(not_found(id))
    }

    #[instrument(skip(self, data))]
    async fn update_reminder(
        &self,
        user_id: UserId,
        id: ReminderId,
        data: UpdateReminderData,
    ) -> Result<UpdateOutcome, CoreError> {
        if data.is_empty() {
            return Err(CoreError::Validation("No fields to update".to_string()));
        }
        if data.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(CoreError::Validation("Title cannot be empty".to_string()));
        }

        let visible = self.find_visible_reminder(user_id, id).await?;
        check_update(AccessLevel::of(&visible), &data)?;
        let current = visible.reminder;

        if data.datetime.is_some() && !current.reminder_type.requires_datetime() {
            return Err(CoreError::Validation(format!(
                "A {} reminder has no date to change",
                current.reminder_type
            )));
        }
        if let Some(address) = &data.address {
            if !current.reminder_type.requires_location() {
                return Err(CoreError::Validation(format!(
                    "A {} reminder has no address to change",
                    current.reminder_type
                )));
            }
            if address.trim().is_empty() {
                return Err(CoreError::Validation("Address cannot be empty".to_string()));
            }
        }

        let plan = if data.is_completed == Some(true) {
            let effective = Reminder {
                datetime: data.datetime.or(current.datetime),
                ..current.clone()
            };
            let plan = plan_renewal(&effective)?;
            debug!(
                reminder_id = id,
                from = ?RenewalState::of(&current),
                transitions = ?plan.transitions(),
                "completion requested"
            );
            plan
        } else {
            RenewalPlan::NotRecurring
        };

        let new_location = match &data.address {
            Some(address) if current.address.as_deref() != Some(address.as_str()) => {
                Some(self.store_address(address).await?)
            }
            _ => None,
        };

        let mut tx = self.pool().begin().await?;
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE reminders SET updated_at = ");
        qb.push_bind(Utc::now());

        if let Some(title) = &data.title {
            qb.push(", title = ");
            qb.push_bind(title.trim().to_string());
        }
        if let Some(description) = &data.description {
            qb.push(", description = ");
            qb.push_bind(description.clone());
        }
        if let Some(address) = &data.address {
            qb.push(", address = ");
            qb.push_bind(address.clone());
        }
        if let Some(location) = &new_location {
            qb.push(", location_id = ");
            qb.push_bind(location.id.clone());
        }

        match plan {
            RenewalPlan::Renew { next } => {
                qb.push(", datetime = ");
                qb.push_bind(next);
                qb.push(", is_completed = FALSE, is_notified = FALSE");
            }
            RenewalPlan::Terminal | RenewalPlan::NotRecurring => {
                if let Some(datetime) = data.datetime {
                    qb.push(", datetime = ");
                    qb.push_bind(datetime);
                }
                if let Some(is_completed) = data.is_completed {
                    qb.push(", is_completed = ");
                    qb.push_bind(is_completed);
                }
                if let Some(is_notified) = data.is_notified {
                    qb.push(", is_notified = ");
                    qb.push_bind(is_notified);
                }
            }
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);
        let result = qb.build().execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        let updated: Reminder = sqlx::query_as("SELECT * FROM reminders WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        if new_location.is_some() {
            if let Some(old) = &current.location_id {
                self.discard_location(old).await;
            }
        }

        match plan {
            RenewalPlan::Renew { next } => {
                info!(reminder_id = id, next = %next, "recurring reminder renewed");
                Ok(UpdateOutcome::Renewed {
                    reminder: updated,
                    next_occurrence: next,
                })
            }
            RenewalPlan::Terminal => {
                info!(
                    reminder_id = id,
                    end_date = ?current.recurrence_end_date,
                    "renewal refused by recurrence end date"
                );
                Ok(UpdateOutcome::Updated(updated))
            }
            RenewalPlan::NotRecurring => Ok(UpdateOutcome::Updated(updated)),
        }
    }

    #[instrument(skip(self))]
    async fn delete_reminder(&self, user_id: UserId, id: ReminderId) -> Result<(), CoreError> {
        let reminder: Reminder = sqlx::query_as("SELECT * FROM reminders WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| not_found(id))?;

        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM shared_reminders WHERE reminder_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM group_reminders WHERE reminder_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM reminders WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if let Some(location_id) = &reminder.location_id {
            self.discard_location(location_id).await;
        }

        info!(reminder_id = id, "reminder deleted");
        Ok(())
    }

    async fn set_recurrence(
        &self,
        user_id: UserId,
        id: ReminderId,
        pattern: RecurrencePattern,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Reminder, CoreError> {
        let reminder = self.require_owner(user_id, id).await?;
        if let (Some(end), Some(datetime)) = (end_date, reminder.datetime) {
            if end < datetime {
                return Err(CoreError::Validation(
                    "Recurrence end date cannot be before the reminder date".to_string(),
                ));
            }
        }

        sqlx::query(
            r#"UPDATE reminders
            SET is_recurring = TRUE, recurrence_pattern = ?, recurrence_end_date = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(pattern)
        .bind(end_date)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;

        debug!(reminder_id = id, %pattern, "recurrence set");
        self.fetch_reminder(id).await
    }

    async fn remove_recurrence(&self, user_id: UserId, id: ReminderId) -> Result<Reminder, CoreError> {
        self.require_owner(user_id, id).await?;

        sqlx::query(
            r#"UPDATE reminders
            SET is_recurring = FALSE, recurrence_pattern = NULL, recurrence_end_date = NULL, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool())
        .await?;

        debug!(reminder_id = id, "recurrence removed");
        self.fetch_reminder(id).await
    }

    async fn preview_occurrences(
        &self,
        user_id: UserId,
        id: ReminderId,
        limit: Option<usize>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        let reminder = self.find_visible_reminder(user_id, id).await?.reminder;
        let pattern = reminder
            .active_pattern()
            .ok_or_else(|| CoreError::Validation("Reminder is not recurring".to_string()))?;
        let start = reminder
            .datetime
            .ok_or_else(|| CoreError::Validation("Reminder has no date to recur from".to_string()))?;

        Ok(generate_occurrences(
            start,
            pattern,
            clamp_preview_limit(limit),
            reminder.recurrence_end_date,
        ))
    }
}

impl SqliteRepository {
    async fn fetch_reminder(&self, id: ReminderId) -> Result<Reminder, CoreError> {
        sqlx::query_as("SELECT * FROM reminders WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// The reminder when `user_id` owns it; `Forbidden` when it is only shared
    /// with them, `NotFound` when they cannot see it at all.
    pub(crate) async fn require_owner(&self, user_id: UserId, id: ReminderId) -> Result<Reminder, CoreError> {
        let visible = self.find_visible_reminder(user_id, id).await?;
        if !AccessLevel::of(&visible).can_manage() {
            return Err(CoreError::Forbidden(
                "Only the owner can change recurrence or sharing".to_string(),
            ));
        }
        Ok(visible.reminder)
    }

    async fn store_address(&self, address: &str) -> Result<LocationRecord, CoreError> {
        let geocoded = self.geocoder().geocode(address).await?;
        self.locations().save_location(address, geocoded.point).await
    }

    /// Best effort: the reminder row is the source of truth.
    async fn discard_location(&self, location_id: &str) {
        match self.locations().delete_location(location_id).await {
            Ok(()) => debug!(location_id, "location record deleted"),
            Err(CoreError::NotFound(_)) => debug!(location_id, "location record already gone"),
            Err(e) => warn!(location_id, error = %e, "failed to delete location record"),
        }
    }
}

fn not_found(id: ReminderId) -> CoreError {
    CoreError::NotFound(format!("Reminder {}", id))
}

/// Trims text fields, checks the type/field pairing and drops fields the type
/// does not use.
fn validate_new_reminder(mut data: NewReminderData) -> Result<NewReminderData, CoreError> {
    data.title = data.title.trim().to_string();
    if data.title.is_empty() {
        return Err(CoreError::Validation("Title is required".to_string()));
    }
    data.address = data
        .address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let kind = data.reminder_type;
    if kind.requires_datetime() && data.datetime.is_none() {
        return Err(CoreError::Validation(format!("A {} reminder needs a date", kind)));
    }
    if kind.requires_location() && data.address.is_none() {
        return Err(CoreError::Validation(format!("A {} reminder needs an address", kind)));
    }
    if !kind.requires_datetime() {
        data.datetime = None;
    }
    if !kind.requires_location() {
        data.address = None;
    }

    if data.recurrence_pattern.is_none() && data.recurrence_end_date.is_some() {
        return Err(CoreError::Validation(
            "A recurrence end date needs a recurrence pattern".to_string(),
        ));
    }
    if let (Some(end), Some(datetime)) = (data.recurrence_end_date, data.datetime) {
        if end < datetime {
            return Err(CoreError::Validation(
                "Recurrence end date cannot be before the reminder date".to_string(),
            ));
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReminderType;
    use chrono::TimeZone;

    fn base() -> NewReminderData {
        NewReminderData {
            title: "  Dentist ".to_string(),
            datetime: Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_title_is_trimmed_and_required() {
        assert_eq!(validate_new_reminder(base()).unwrap().title, "Dentist");
        let blank = NewReminderData { title: "   ".to_string(), ..base() };
        assert!(matches!(validate_new_reminder(blank), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_type_field_pairing() {
        let missing_date = NewReminderData { datetime: None, ..base() };
        assert!(validate_new_reminder(missing_date).is_err());

        let missing_address = NewReminderData { reminder_type: ReminderType::Both, ..base() };
        assert!(validate_new_reminder(missing_address).is_err());

        let location = NewReminderData {
            reminder_type: ReminderType::Location,
            address: Some("Gran Via 1".to_string()),
            ..base()
        };
        let normalized = validate_new_reminder(location).unwrap();
        assert!(normalized.datetime.is_none());
        assert_eq!(normalized.address.as_deref(), Some("Gran Via 1"));
    }

    #[test]
    fn test_end_date_rules() {
        let orphan_end = NewReminderData {
            recurrence_end_date: Some(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()),
            ..base()
        };
        assert!(validate_new_reminder(orphan_end).is_err());

        let backwards = NewReminderData {
            recurrence_pattern: Some(RecurrencePattern::Daily),
            recurrence_end_date: Some(Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap()),
            ..base()
        };
        assert!(validate_new_reminder(backwards).is_err());
    }
}
