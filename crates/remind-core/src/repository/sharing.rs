use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::error::CoreError;
use crate::models::{GroupId, ReminderId, UserId};
use crate::repository::{SharingRepository, SocialRepository, SqliteRepository};

#[async_trait]
impl SharingRepository for SqliteRepository {
    async fn share_with_friend(
        &self,
        owner_id: UserId,
        reminder_id: ReminderId,
        friend_id: UserId,
        can_edit: bool,
    ) -> Result<(), CoreError> {
        if owner_id == friend_id {
            return Err(CoreError::Validation(
                "Cannot share a reminder with yourself".to_string(),
            ));
        }
        self.require_owner(owner_id, reminder_id).await?;
        if !self.are_friends(owner_id, friend_id).await? {
            return Err(CoreError::Forbidden(
                "Reminders can only be shared with accepted friends".to_string(),
            ));
        }

        sqlx::query(
            r#"INSERT INTO shared_reminders (reminder_id, owner_id, shared_with_id, can_edit, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (reminder_id, shared_with_id) DO UPDATE SET can_edit = excluded.can_edit"#,
        )
        .bind(reminder_id)
        .bind(owner_id)
        .bind(friend_id)
        .bind(can_edit)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        info!(reminder_id, friend_id, can_edit, "reminder shared with friend");
        Ok(())
    }

    async fn unshare_with_friend(
        &self,
        owner_id: UserId,
        reminder_id: ReminderId,
        friend_id: UserId,
    ) -> Result<(), CoreError> {
        self.require_owner(owner_id, reminder_id).await?;

        let result = sqlx::query(
            "DELETE FROM shared_reminders WHERE reminder_id = ? AND owner_id = ? AND shared_with_id = ?",
        )
        .bind(reminder_id)
        .bind(owner_id)
        .bind(friend_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Reminder {} is not shared with user {}",
                reminder_id, friend_id
            )));
        }
        Ok(())
    }

    async fn share_with_group(
        &self,
        owner_id: UserId,
        reminder_id: ReminderId,
        group_id: GroupId,
    ) -> Result<(), CoreError> {
        self.require_owner(owner_id, reminder_id).await?;
        if !self.is_group_member(group_id, owner_id).await? {
            return Err(CoreError::Forbidden(format!(
                "You are not a member of group {}",
                group_id
            )));
        }

        sqlx::query(
            r#"INSERT INTO group_reminders (reminder_id, group_id, shared_by, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (reminder_id, group_id) DO NOTHING"#,
        )
        .bind(reminder_id)
        .bind(group_id)
        .bind(owner_id)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        info!(reminder_id, group_id, "reminder shared with group");
        Ok(())
    }

    async fn unshare_with_group(
        &self,
        owner_id: UserId,
        reminder_id: ReminderId,
        group_id: GroupId,
    ) -> Result<(), CoreError> {
        self.require_owner(owner_id, reminder_id).await?;

        let result = sqlx::query("DELETE FROM group_reminders WHERE reminder_id = ? AND group_id = ?")
            .bind(reminder_id)
            .bind(group_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Reminder {} is not shared with group {}",
                reminder_id, group_id
            )));
        }
        Ok(())
    }
}
