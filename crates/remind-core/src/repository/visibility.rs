use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Sqlite};
use tracing::debug;

use crate::error::CoreError;
use crate::models::{
    GroupId, Recipient, Reminder, ReminderId, ShareKind, UserId, VisibleReminder,
};
use crate::repository::{SqliteRepository, VisibilityRepository};
use crate::visibility::merge_visibility;

/// A non-owned reminder row together with how it reached the viewer.
#[derive(Debug, FromRow)]
struct SharedRow {
    #[sqlx(flatten)]
    reminder: Reminder,
    can_edit: bool,
    shared_by: UserId,
    shared_by_name: String,
    group_id: Option<GroupId>,
    group_name: Option<String>,
}

impl SharedRow {
    fn into_visible(self, via: ShareKind) -> VisibleReminder {
        VisibleReminder {
            is_owner: false,
            can_edit: self.can_edit,
            shared_via: Some(via),
            shared_by: Some(self.shared_by),
            shared_by_name: Some(self.shared_by_name),
            group_id: self.group_id,
            group_name: self.group_name,
            ..VisibleReminder::owned(self.reminder)
        }
    }
}

fn push_only(qb: &mut QueryBuilder<'_, Sqlite>, only: Option<ReminderId>) {
    if let Some(id) = only {
        qb.push(" AND r.id = ");
        qb.push_bind(id);
    }
}

impl SqliteRepository {
    pub(crate) async fn owned_rows(
        &self,
        user_id: UserId,
        only: Option<ReminderId>,
    ) -> Result<Vec<Reminder>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT r.* FROM reminders r WHERE r.user_id = ");
        qb.push_bind(user_id);
        push_only(&mut qb, only);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC");

        let rows = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows)
    }

    pub(crate) async fn friend_rows(
        &self,
        user_id: UserId,
        only: Option<ReminderId>,
    ) -> Result<Vec<VisibleReminder>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"SELECT r.*,
                sr.can_edit AS can_edit,
                sr.owner_id AS shared_by,
                u.name AS shared_by_name,
                NULL AS group_id,
                NULL AS group_name
            FROM reminders r
            JOIN shared_reminders sr ON sr.reminder_id = r.id
            JOIN users u ON u.id = sr.owner_id
            WHERE sr.shared_with_id = "#,
        );
        qb.push_bind(user_id);
        qb.push(" AND r.user_id != ");
        qb.push_bind(user_id);
        push_only(&mut qb, only);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC");

        let rows: Vec<SharedRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_visible(ShareKind::Friend))
            .collect())
    }

    pub(crate) async fn group_rows(
        &self,
        user_id: UserId,
        only: Option<ReminderId>,
    ) -> Result<Vec<VisibleReminder>, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"SELECT r.*,
                FALSE AS can_edit,
                gr.shared_by AS shared_by,
                u.name AS shared_by_name,
                g.id AS group_id,
                g.name AS group_name
            FROM reminders r
            JOIN group_reminders gr ON gr.reminder_id = r.id
            JOIN group_members gm ON gm.group_id = gr.group_id
            JOIN user_groups g ON g.id = gr.group_id
            JOIN users u ON u.id = gr.shared_by
            WHERE gm.user_id = "#,
        );
        qb.push_bind(user_id);
        qb.push(" AND r.user_id != ");
        qb.push_bind(user_id);
        push_only(&mut qb, only);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC, g.id ASC");

        let rows: Vec<SharedRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_visible(ShareKind::Group))
            .collect())
    }

    /// Attaches the recipient lists to owned reminders.
    pub(crate) async fn with_recipients(
        &self,
        owner_id: UserId,
        reminders: Vec<Reminder>,
    ) -> Result<Vec<VisibleReminder>, CoreError> {
        if reminders.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_reminder: HashMap<ReminderId, Vec<Recipient>> = HashMap::new();
        for recipient in self.find_recipients(owner_id).await? {
            by_reminder
                .entry(recipient.reminder_id)
                .or_default()
                .push(recipient);
        }

        Ok(reminders
            .into_iter()
            .map(|reminder| {
                let shared_with = by_reminder.remove(&reminder.id).unwrap_or_default();
                VisibleReminder {
                    shared_with,
                    ..VisibleReminder::owned(reminder)
                }
            })
            .collect())
    }
}

#[async_trait]
impl VisibilityRepository for SqliteRepository {
    async fn find_owned(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError> {
        let owned = self.owned_rows(user_id, None).await?;
        self.with_recipients(user_id, owned).await
    }

    async fn find_shared_by_friends(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError> {
        self.friend_rows(user_id, None).await
    }

    async fn find_shared_via_groups(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError> {
        self.group_rows(user_id, None).await
    }

    async fn find_recipients(&self, owner_id: UserId) -> Result<Vec<Recipient>, CoreError> {
        let direct: Vec<(ReminderId, UserId, String, bool)> = sqlx::query_as(
            r#"SELECT sr.reminder_id, sr.shared_with_id, u.name, sr.can_edit
            FROM shared_reminders sr
            JOIN users u ON u.id = sr.shared_with_id
            WHERE sr.owner_id = ?
            ORDER BY sr.created_at, u.name"#,
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        let groups: Vec<(ReminderId, GroupId, String)> = sqlx::query_as(
            r#"SELECT gr.reminder_id, g.id, g.name
            FROM group_reminders gr
            JOIN reminders r ON r.id = gr.reminder_id
            JOIN user_groups g ON g.id = gr.group_id
            WHERE r.user_id = ?
            ORDER BY gr.created_at, g.name"#,
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await?;

        let direct = direct
            .into_iter()
            .map(|(reminder_id, recipient_id, name, can_edit)| Recipient {
                reminder_id,
                kind: ShareKind::Friend,
                recipient_id,
                name,
                can_edit,
            });
        let groups = groups
            .into_iter()
            .map(|(reminder_id, recipient_id, name)| Recipient {
                reminder_id,
                kind: ShareKind::Group,
                recipient_id,
                name,
                can_edit: false,
            });

        Ok(direct.chain(groups).collect())
    }

    async fn list_reminders(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError> {
        let owned = self.find_owned(user_id).await?;
        let friends = self.find_shared_by_friends(user_id).await?;
        let groups = self.find_shared_via_groups(user_id).await?;
        debug!(
            user_id,
            owned = owned.len(),
            friends = friends.len(),
            groups = groups.len(),
            "resolved visibility sources"
        );
        Ok(merge_visibility(user_id, owned, friends, groups))
    }

    async fn list_shared_with_me(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError> {
        let friends = self.find_shared_by_friends(user_id).await?;
        let groups = self.find_shared_via_groups(user_id).await?;
        Ok(merge_visibility(user_id, Vec::new(), friends, groups))
    }
}
