use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::DbPool;
use crate::error::CoreError;
use crate::geocoding::Geocoder;
use crate::models::{
    Friendship, Group, GroupId, GroupMember, NewReminderData, RecurrencePattern, Recipient,
    Reminder, ReminderId, UpdateOutcome, UpdateReminderData, User, UserId, VisibleReminder,
};

pub mod locations;
pub mod reminders;
pub mod sharing;
pub mod social;
pub mod visibility;

pub use locations::{LocationStore, SqliteLocationStore};

/// Reminder lifecycle: create, read, mutate (including renewal), delete.
#[async_trait]
pub trait ReminderRepository {
    async fn add_reminder(&self, user_id: UserId, data: NewReminderData) -> Result<Reminder, CoreError>;
    async fn find_reminder_by_id(&self, id: ReminderId) -> Result<Option<Reminder>, CoreError>;
    /// The reminder as `user_id` sees it; `NotFound` when it is not visible.
    async fn find_visible_reminder(&self, user_id: UserId, id: ReminderId) -> Result<VisibleReminder, CoreError>;
    async fn update_reminder(&self, user_id: UserId, id: ReminderId, data: UpdateReminderData) -> Result<UpdateOutcome, CoreError>;
    async fn delete_reminder(&self, user_id: UserId, id: ReminderId) -> Result<(), CoreError>;
    async fn set_recurrence(&self, user_id: UserId, id: ReminderId, pattern: RecurrencePattern, end_date: Option<DateTime<Utc>>) -> Result<Reminder, CoreError>;
    async fn remove_recurrence(&self, user_id: UserId, id: ReminderId) -> Result<Reminder, CoreError>;
    async fn preview_occurrences(&self, user_id: UserId, id: ReminderId, limit: Option<usize>) -> Result<Vec<DateTime<Utc>>, CoreError>;
}

/// The three visibility sources and their union.
#[async_trait]
pub trait VisibilityRepository {
    async fn find_owned(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError>;
    async fn find_shared_by_friends(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError>;
    async fn find_shared_via_groups(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError>;
    /// Direct and group recipients of every reminder owned by `owner_id`.
    async fn find_recipients(&self, owner_id: UserId) -> Result<Vec<Recipient>, CoreError>;
    async fn list_reminders(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError>;
    async fn list_shared_with_me(&self, user_id: UserId) -> Result<Vec<VisibleReminder>, CoreError>;
}

/// Owner-only management of sharing edges.
#[async_trait]
pub trait SharingRepository {
    async fn share_with_friend(&self, owner_id: UserId, reminder_id: ReminderId, friend_id: UserId, can_edit: bool) -> Result<(), CoreError>;
    async fn unshare_with_friend(&self, owner_id: UserId, reminder_id: ReminderId, friend_id: UserId) -> Result<(), CoreError>;
    async fn share_with_group(&self, owner_id: UserId, reminder_id: ReminderId, group_id: GroupId) -> Result<(), CoreError>;
    async fn unshare_with_group(&self, owner_id: UserId, reminder_id: ReminderId, group_id: GroupId) -> Result<(), CoreError>;
}

/// Users, friendships and groups.
#[async_trait]
pub trait SocialRepository {
    async fn add_user(&self, name: String, email: String) -> Result<User, CoreError>;
    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, CoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, CoreError>;
    async fn send_friend_request(&self, requester_id: UserId, addressee_id: UserId) -> Result<Friendship, CoreError>;
    async fn respond_friend_request(&self, addressee_id: UserId, friendship_id: i64, accept: bool) -> Result<Friendship, CoreError>;
    async fn list_friends(&self, user_id: UserId) -> Result<Vec<User>, CoreError>;
    async fn list_pending_requests(&self, user_id: UserId) -> Result<Vec<Friendship>, CoreError>;
    async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, CoreError>;
    async fn create_group(&self, owner_id: UserId, name: String, description: Option<String>) -> Result<Group, CoreError>;
    async fn add_group_member(&self, admin_id: UserId, group_id: GroupId, user_id: UserId) -> Result<(), CoreError>;
    async fn remove_group_member(&self, actor_id: UserId, group_id: GroupId, user_id: UserId) -> Result<(), CoreError>;
    async fn list_groups(&self, user_id: UserId) -> Result<Vec<Group>, CoreError>;
    async fn list_group_members(&self, user_id: UserId, group_id: GroupId) -> Result<Vec<GroupMember>, CoreError>;
    async fn is_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    ReminderRepository + VisibilityRepository + SharingRepository + SocialRepository + Send + Sync
{
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    locations: Arc<dyn LocationStore>,
    geocoder: Arc<dyn Geocoder>,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, locations: Arc<dyn LocationStore>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { pool, locations, geocoder }
    }

    /// Keeps location records in the same database as the reminders.
    pub fn with_local_locations(pool: DbPool, geocoder: Arc<dyn Geocoder>) -> Self {
        let locations = Arc::new(SqliteLocationStore::new(pool.clone()));
        Self::new(pool, locations, geocoder)
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn locations(&self) -> &dyn LocationStore {
        self.locations.as_ref()
    }

    pub(crate) fn geocoder(&self) -> &dyn Geocoder {
        self.geocoder.as_ref()
    }

    pub fn location_store(&self) -> Arc<dyn LocationStore> {
        Arc::clone(&self.locations)
    }
}

impl Repository for SqliteRepository {}
