use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use remind_core::api::{ErrorResponse, LocalReminderApi, SuccessResponse};
use remind_core::db::establish_connection;
use remind_core::error::CoreError;
use remind_core::geocoding::{GeocodedAddress, Geocoder};
use remind_core::models::*;
use remind_core::notify::{
    Notification, NotificationAction, NotificationDispatcher, NotificationPresenter,
    NotificationSession, ReminderApi,
};
use remind_core::recurrence::MAX_PREVIEW_LIMIT;
use remind_core::renewal::RenewalState;
use remind_core::repository::{
    LocationStore, ReminderRepository, SharingRepository, SocialRepository, SqliteLocationStore,
    SqliteRepository, VisibilityRepository,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const MADRID: GeoPoint = GeoPoint { lat: 40.4168, lng: -3.7038 };

struct StubGeocoder {
    fail: bool,
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, CoreError> {
        if self.fail {
            return Err(CoreError::Upstream("geocoder unavailable".to_string()));
        }
        Ok(GeocodedAddress {
            point: MADRID,
            display_name: address.to_string(),
        })
    }

    async fn reverse_geocode(&self, _point: GeoPoint) -> Result<String, CoreError> {
        Ok("Madrid".to_string())
    }
}

/// Location store whose deletes always fail.
struct BrokenDeleteStore {
    inner: SqliteLocationStore,
}

#[async_trait]
impl LocationStore for BrokenDeleteStore {
    async fn save_location(&self, address: &str, point: GeoPoint) -> Result<LocationRecord, CoreError> {
        self.inner.save_location(address, point).await
    }

    async fn find_location(&self, id: &str) -> Result<Option<LocationRecord>, CoreError> {
        self.inner.find_location(id).await
    }

    async fn delete_location(&self, _id: &str) -> Result<(), CoreError> {
        Err(CoreError::Upstream("location store unreachable".to_string()))
    }
}

/// Helper function to create a test database
async fn setup_test_db() -> (Arc<SqliteRepository>, TempDir) {
    setup_with(false).await
}

async fn setup_with(failing_geocoder: bool) -> (Arc<SqliteRepository>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    let geocoder = Arc::new(StubGeocoder { fail: failing_geocoder });
    let repository = SqliteRepository::with_local_locations(pool, geocoder);
    (Arc::new(repository), temp_dir)
}

async fn create_user(repo: &SqliteRepository, name: &str) -> User {
    repo.add_user(name.to_string(), format!("{}@example.com", name.to_lowercase()))
        .await
        .expect("Failed to create test user")
}

async fn befriend(repo: &SqliteRepository, a: &User, b: &User) {
    let request = repo.send_friend_request(a.id, b.id).await.unwrap();
    repo.respond_friend_request(b.id, request.id, true).await.unwrap();
}

fn jan_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
}

async fn create_daily(repo: &SqliteRepository, owner: &User, end: Option<DateTime<Utc>>) -> Reminder {
    repo.add_reminder(
        owner.id,
        NewReminderData {
            title: "Standup".to_string(),
            datetime: Some(jan_first()),
            recurrence_pattern: Some(RecurrencePattern::Daily),
            recurrence_end_date: end,
            ..Default::default()
        },
    )
    .await
    .expect("Failed to create recurring reminder")
}

fn complete() -> UpdateReminderData {
    UpdateReminderData {
        is_completed: Some(true),
        ..Default::default()
    }
}

struct AnswerWith {
    action: NotificationAction,
    presented: Mutex<Vec<ReminderId>>,
}

impl AnswerWith {
    fn new(action: NotificationAction) -> Arc<Self> {
        Arc::new(Self {
            action,
            presented: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NotificationPresenter for AnswerWith {
    async fn present(&self, notification: &Notification) -> NotificationAction {
        self.presented.lock().unwrap().push(notification.reminder.id());
        self.action
    }

    async fn renewed(&self, _reminder: &Reminder, _next_occurrence: DateTime<Utc>) {}

    async fn close(&self, _reminder_id: ReminderId) {}
}

#[tokio::test]
async fn test_completion_renews_daily_reminder() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let reminder = create_daily(&repo, &ana, None).await;

    let api = LocalReminderApi::new(repo.clone(), repo.location_store(), ana.id);
    let response = api.update_reminder(reminder.id, complete()).await.unwrap();

    assert_eq!(response.renewed, Some(true));
    assert_eq!(response.next_occurrence, Some(Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap()));
    assert_eq!(response.reminder.datetime, response.next_occurrence);
    assert!(!response.reminder.is_completed);
    assert_eq!(RenewalState::of(&response.reminder), RenewalState::Pending);
    assert!(!response.reminder.is_notified);
    assert!(response.reminder.is_recurring);
    assert_eq!(response.reminder.recurrence_pattern, Some(RecurrencePattern::Daily));
}

#[tokio::test]
async fn test_completion_at_end_date_is_terminal() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let reminder = create_daily(&repo, &ana, Some(jan_first())).await;

    let outcome = repo.update_reminder(ana.id, reminder.id, complete()).await.unwrap();
    assert!(matches!(outcome, UpdateOutcome::Updated(_)));
    assert!(outcome.reminder().is_completed);
    assert_eq!(outcome.reminder().datetime, Some(jan_first()));

    // Stays completed on a later read.
    let stored = repo.find_reminder_by_id(reminder.id).await.unwrap().unwrap();
    assert!(stored.is_completed);
    assert_eq!(RenewalState::of(&stored), RenewalState::Completed);
}

#[tokio::test]
async fn test_completion_renews_when_next_equals_end() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let end = jan_first() + Duration::days(1);
    let reminder = create_daily(&repo, &ana, Some(end)).await;

    let outcome = repo.update_reminder(ana.id, reminder.id, complete()).await.unwrap();
    assert_eq!(outcome.next_occurrence(), Some(end));

    let outcome = repo.update_reminder(ana.id, reminder.id, complete()).await.unwrap();
    assert!(outcome.next_occurrence().is_none());
    assert!(outcome.reminder().is_completed);
}

#[tokio::test]
async fn test_visibility_dedups_friend_and_group_share() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let ben = create_user(&repo, "Ben").await;
    befriend(&repo, &ana, &ben).await;

    let group = repo.create_group(ana.id, "Family".to_string(), None).await.unwrap();
    repo.add_group_member(ana.id, group.id, ben.id).await.unwrap();

    let reminder = create_daily(&repo, &ana, None).await;
    repo.share_with_friend(ana.id, reminder.id, ben.id, false).await.unwrap();
    repo.share_with_group(ana.id, reminder.id, group.id).await.unwrap();

    let bens = repo.list_reminders(ben.id).await.unwrap();
    assert_eq!(bens.len(), 1);
    assert!(!bens[0].is_owner);
    assert_eq!(bens[0].shared_via, Some(ShareKind::Friend));
    assert_eq!(bens[0].shared_by_name.as_deref(), Some("Ana"));

    // The owner is also a member of the group but never sees it as shared.
    let anas = repo.list_reminders(ana.id).await.unwrap();
    assert_eq!(anas.len(), 1);
    assert!(anas[0].is_owner);
    assert_eq!(anas[0].shared_with.len(), 2);
    assert!(repo.find_shared_via_groups(ana.id).await.unwrap().is_empty());

    assert_eq!(repo.list_shared_with_me(ben.id).await.unwrap().len(), 1);
    assert!(repo.list_shared_with_me(ana.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_is_newest_first() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let first = create_daily(&repo, &ana, None).await;
    let second = create_daily(&repo, &ana, None).await;

    let ids: Vec<_> = repo.list_reminders(ana.id).await.unwrap().iter().map(|v| v.id()).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_mutation_rights() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let ben = create_user(&repo, "Ben").await;
    let eve = create_user(&repo, "Eve").await;
    befriend(&repo, &ana, &ben).await;
    let reminder = create_daily(&repo, &ana, None).await;
    repo.share_with_friend(ana.id, reminder.id, ben.id, false).await.unwrap();

    let rename = UpdateReminderData {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };

    // Viewer: flags only.
    let err = repo.update_reminder(ben.id, reminder.id, rename.clone()).await.unwrap_err();
    assert!(matches!(err, CoreError::Forbidden(_)));
    let notified = UpdateReminderData {
        is_notified: Some(true),
        ..Default::default()
    };
    assert!(repo.update_reminder(ben.id, reminder.id, notified).await.is_ok());

    // Editor: content too, but not recurrence or sharing.
    repo.share_with_friend(ana.id, reminder.id, ben.id, true).await.unwrap();
    let outcome = repo.update_reminder(ben.id, reminder.id, rename.clone()).await.unwrap();
    assert_eq!(outcome.reminder().title, "Renamed");
    assert!(matches!(
        repo.set_recurrence(ben.id, reminder.id, RecurrencePattern::Weekly, None).await,
        Err(CoreError::Forbidden(_))
    ));
    assert!(matches!(
        repo.share_with_friend(ben.id, reminder.id, ana.id, false).await,
        Err(CoreError::Forbidden(_))
    ));

    // Strangers cannot tell the reminder exists.
    assert!(matches!(
        repo.update_reminder(eve.id, reminder.id, rename).await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(repo.delete_reminder(eve.id, reminder.id).await, Err(CoreError::NotFound(_))));
    assert!(matches!(
        repo.remove_recurrence(eve.id, reminder.id).await,
        Err(CoreError::NotFound(_))
    ));

    // Only the owner deletes.
    assert!(matches!(repo.delete_reminder(ben.id, reminder.id).await, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn test_update_validation() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let reminder = create_daily(&repo, &ana, None).await;

    let empty = repo.update_reminder(ana.id, reminder.id, UpdateReminderData::default()).await;
    assert!(matches!(empty, Err(CoreError::Validation(_))));

    let blank_title = UpdateReminderData {
        title: Some("  ".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        repo.update_reminder(ana.id, reminder.id, blank_title).await,
        Err(CoreError::Validation(_))
    ));

    let address_on_datetime = UpdateReminderData {
        address: Some("Gran Via".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        repo.update_reminder(ana.id, reminder.id, address_on_datetime).await,
        Err(CoreError::Validation(_))
    ));

    let clear_description = UpdateReminderData {
        description: Some(None),
        ..Default::default()
    };
    let outcome = repo.update_reminder(ana.id, reminder.id, clear_description).await.unwrap();
    assert!(outcome.reminder().description.is_none());
}

#[tokio::test]
async fn test_create_validation() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;

    let missing_date = NewReminderData {
        title: "No date".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        repo.add_reminder(ana.id, missing_date).await,
        Err(CoreError::Validation(_))
    ));

    let pattern = remind_core::recurrence::parse_pattern("fortnightly");
    assert!(matches!(pattern, Err(CoreError::InvalidPattern(_))));
}

#[tokio::test]
async fn test_location_reminder_lifecycle() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let locations = repo.location_store();

    let reminder = repo
        .add_reminder(
            ana.id,
            NewReminderData {
                title: "Buy bread".to_string(),
                reminder_type: ReminderType::Location,
                address: Some("Plaza Mayor, Madrid".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let first_location = reminder.location_id.clone().expect("location id stored");
    assert!(reminder.datetime.is_none());
    assert_eq!(
        locations.find_location(&first_location).await.unwrap().unwrap().point(),
        MADRID
    );

    let moved = UpdateReminderData {
        address: Some("Puerta del Sol, Madrid".to_string()),
        ..Default::default()
    };
    let outcome = repo.update_reminder(ana.id, reminder.id, moved).await.unwrap();
    let second_location = outcome.reminder().location_id.clone().unwrap();
    assert_ne!(first_location, second_location);
    assert!(locations.find_location(&first_location).await.unwrap().is_none());

    repo.delete_reminder(ana.id, reminder.id).await.unwrap();
    assert!(repo.find_reminder_by_id(reminder.id).await.unwrap().is_none());
    assert!(locations.find_location(&second_location).await.unwrap().is_none());
}

#[tokio::test]
async fn test_geocoding_failure_aborts_create() {
    let (repo, _temp_dir) = setup_with(true).await;
    let ana = create_user(&repo, "Ana").await;

    let result = repo
        .add_reminder(
            ana.id,
            NewReminderData {
                title: "Pick up parcel".to_string(),
                reminder_type: ReminderType::Both,
                datetime: Some(jan_first()),
                address: Some("Unknown street".to_string()),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(CoreError::Upstream(_))));
    assert!(repo.list_reminders(ana.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_location_delete_failure_is_swallowed() {
    let temp_dir = tempfile::tempdir().unwrap();
    let pool = establish_connection(&temp_dir.path().join("test.db").to_string_lossy())
        .await
        .unwrap();
    let store = Arc::new(BrokenDeleteStore {
        inner: SqliteLocationStore::new(pool.clone()),
    });
    let repo = SqliteRepository::new(pool, store, Arc::new(StubGeocoder { fail: false }));
    let ana = create_user(&repo, "Ana").await;

    let reminder = repo
        .add_reminder(
            ana.id,
            NewReminderData {
                title: "Library".to_string(),
                reminder_type: ReminderType::Location,
                address: Some("Biblioteca Nacional".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    repo.delete_reminder(ana.id, reminder.id).await.unwrap();
    assert!(repo.find_reminder_by_id(reminder.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_removes_sharing_edges() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let ben = create_user(&repo, "Ben").await;
    befriend(&repo, &ana, &ben).await;
    let reminder = create_daily(&repo, &ana, None).await;
    repo.share_with_friend(ana.id, reminder.id, ben.id, true).await.unwrap();

    repo.delete_reminder(ana.id, reminder.id).await.unwrap();
    assert!(repo.list_reminders(ben.id).await.unwrap().is_empty());
    assert!(repo.find_recipients(ana.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recurrence_management_and_preview() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let reminder = repo
        .add_reminder(
            ana.id,
            NewReminderData {
                title: "Rent".to_string(),
                datetime: Some(Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        repo.preview_occurrences(ana.id, reminder.id, None).await,
        Err(CoreError::Validation(_))
    ));

    let updated = repo
        .set_recurrence(ana.id, reminder.id, RecurrencePattern::Monthly, None)
        .await
        .unwrap();
    assert!(updated.is_recurring);

    let preview = repo.preview_occurrences(ana.id, reminder.id, Some(3)).await.unwrap();
    assert_eq!(
        preview,
        vec![
            Utc.with_ymd_and_hms(2024, 2, 29, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 29, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 29, 10, 0, 0).unwrap(),
        ]
    );
    assert_eq!(repo.preview_occurrences(ana.id, reminder.id, None).await.unwrap().len(), 10);
    assert_eq!(
        repo.preview_occurrences(ana.id, reminder.id, Some(10_000)).await.unwrap().len(),
        MAX_PREVIEW_LIMIT
    );

    let bounded = repo
        .set_recurrence(
            ana.id,
            reminder.id,
            RecurrencePattern::Monthly,
            Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
        )
        .await
        .unwrap();
    assert!(bounded.recurrence_end_date.is_some());
    assert_eq!(repo.preview_occurrences(ana.id, reminder.id, None).await.unwrap().len(), 2);

    let cleared = repo.remove_recurrence(ana.id, reminder.id).await.unwrap();
    assert!(!cleared.is_recurring);
    assert!(cleared.recurrence_pattern.is_none());

    // Completion of a reminder that no longer recurs is plain.
    let outcome = repo.update_reminder(ana.id, reminder.id, complete()).await.unwrap();
    assert!(outcome.reminder().is_completed);
}

#[tokio::test]
async fn test_shared_notification_shown_once_per_session() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let ben = create_user(&repo, "Ben").await;
    befriend(&repo, &ana, &ben).await;
    let reminder = create_daily(&repo, &ana, None).await;
    repo.share_with_friend(ana.id, reminder.id, ben.id, false).await.unwrap();

    let api = Arc::new(LocalReminderApi::new(repo.clone(), repo.location_store(), ben.id));
    let presenter = AnswerWith::new(NotificationAction::Acknowledge);
    let dispatcher = NotificationDispatcher::new(api, presenter.clone(), Arc::new(NotificationSession::new()));
    let cancel = CancellationToken::new();
    let now = jan_first() + Duration::minutes(1);

    assert_eq!(dispatcher.check_due(now, &cancel).await.unwrap(), 1);
    assert_eq!(dispatcher.check_due(now, &cancel).await.unwrap(), 0);
    assert_eq!(*presenter.presented.lock().unwrap(), vec![reminder.id]);

    let stored = repo.find_reminder_by_id(reminder.id).await.unwrap().unwrap();
    assert!(!stored.is_notified);
}

#[tokio::test]
async fn test_discarding_recurring_notification_deletes_reminder() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let reminder = create_daily(&repo, &ana, None).await;

    let api = Arc::new(LocalReminderApi::new(repo.clone(), repo.location_store(), ana.id));
    let dispatcher = NotificationDispatcher::new(
        api.clone(),
        AnswerWith::new(NotificationAction::Discard),
        Arc::new(NotificationSession::new()),
    );

    let shown = dispatcher
        .check_due(jan_first() + Duration::minutes(1), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(shown, 1);
    assert!(api.list_reminders().await.unwrap().is_empty());
    assert!(repo.find_reminder_by_id(reminder.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_api_delete_envelopes() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let eve = create_user(&repo, "Eve").await;
    let reminder = create_daily(&repo, &ana, None).await;

    let as_eve = LocalReminderApi::new(repo.clone(), repo.location_store(), eve.id);
    let err = as_eve.delete_reminder(reminder.id).await.unwrap_err();
    let (status, body) = ErrorResponse::from_error(&err);
    assert_eq!(status, 404);
    assert!(!body.success);

    let as_ana = LocalReminderApi::new(repo.clone(), repo.location_store(), ana.id);
    assert_eq!(as_ana.delete_reminder(reminder.id).await.unwrap(), SuccessResponse::ok());
}

#[tokio::test]
async fn test_accepting_recurring_notification_renews() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let reminder = create_daily(&repo, &ana, None).await;

    let api = Arc::new(LocalReminderApi::new(repo.clone(), repo.location_store(), ana.id));
    let dispatcher = NotificationDispatcher::new(
        api,
        AnswerWith::new(NotificationAction::Accept),
        Arc::new(NotificationSession::new()),
    );

    let now = jan_first() + Duration::minutes(1);
    dispatcher.check_due(now, &CancellationToken::new()).await.unwrap();
    assert!(!dispatcher.session().due.contains(reminder.id));

    let stored = repo.find_reminder_by_id(reminder.id).await.unwrap().unwrap();
    assert_eq!(stored.datetime, Some(jan_first() + Duration::days(1)));
    assert!(!stored.is_completed);

    // Not due again until the next day.
    assert_eq!(dispatcher.check_due(now, &CancellationToken::new()).await.unwrap(), 0);
    assert_eq!(
        dispatcher
            .check_due(now + Duration::days(1), &CancellationToken::new())
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_sharing_rules() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let ben = create_user(&repo, "Ben").await;
    let reminder = create_daily(&repo, &ana, None).await;

    assert!(matches!(
        repo.share_with_friend(ana.id, reminder.id, ana.id, false).await,
        Err(CoreError::Validation(_))
    ));
    assert!(matches!(
        repo.share_with_friend(ana.id, reminder.id, ben.id, false).await,
        Err(CoreError::Forbidden(_))
    ));

    befriend(&repo, &ana, &ben).await;
    repo.share_with_friend(ana.id, reminder.id, ben.id, false).await.unwrap();
    repo.share_with_friend(ana.id, reminder.id, ben.id, true).await.unwrap();
    let recipients = repo.find_recipients(ana.id).await.unwrap();
    assert_eq!(recipients.len(), 1);
    assert!(recipients[0].can_edit);

    repo.unshare_with_friend(ana.id, reminder.id, ben.id).await.unwrap();
    assert!(matches!(
        repo.unshare_with_friend(ana.id, reminder.id, ben.id).await,
        Err(CoreError::NotFound(_))
    ));

    let group = repo.create_group(ben.id, "Club".to_string(), None).await.unwrap();
    assert!(matches!(
        repo.share_with_group(ana.id, reminder.id, group.id).await,
        Err(CoreError::Forbidden(_))
    ));
    repo.add_group_member(ben.id, group.id, ana.id).await.unwrap();
    repo.share_with_group(ana.id, reminder.id, group.id).await.unwrap();
    repo.share_with_group(ana.id, reminder.id, group.id).await.unwrap();
    assert_eq!(repo.find_shared_via_groups(ben.id).await.unwrap().len(), 1);

    repo.unshare_with_group(ana.id, reminder.id, group.id).await.unwrap();
    assert!(repo.list_reminders(ben.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_group_membership_rules() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let ben = create_user(&repo, "Ben").await;
    let eve = create_user(&repo, "Eve").await;
    befriend(&repo, &ana, &ben).await;

    let group = repo.create_group(ana.id, "Team".to_string(), Some("Work".to_string())).await.unwrap();
    assert!(matches!(
        repo.add_group_member(ana.id, group.id, eve.id).await,
        Err(CoreError::Forbidden(_))
    ));
    repo.add_group_member(ana.id, group.id, ben.id).await.unwrap();
    assert!(matches!(
        repo.add_group_member(ben.id, group.id, eve.id).await,
        Err(CoreError::Forbidden(_))
    ));

    let members = repo.list_group_members(ben.id, group.id).await.unwrap();
    assert_eq!(members.len(), 2);
    assert!(matches!(
        repo.list_group_members(eve.id, group.id).await,
        Err(CoreError::NotFound(_))
    ));

    assert!(matches!(
        repo.remove_group_member(ana.id, group.id, ana.id).await,
        Err(CoreError::Validation(_))
    ));
    repo.remove_group_member(ben.id, group.id, ben.id).await.unwrap();
    assert!(repo.list_groups(ben.id).await.unwrap().is_empty());
    assert_eq!(repo.list_groups(ana.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_friend_requests() {
    let (repo, _temp_dir) = setup_test_db().await;
    let ana = create_user(&repo, "Ana").await;
    let ben = create_user(&repo, "Ben").await;

    assert!(matches!(
        repo.send_friend_request(ana.id, ana.id).await,
        Err(CoreError::Validation(_))
    ));

    let request = repo.send_friend_request(ana.id, ben.id).await.unwrap();
    assert_eq!(request.status, FriendshipStatus::Pending);
    assert!(repo.send_friend_request(ben.id, ana.id).await.is_err());
    assert_eq!(repo.list_pending_requests(ben.id).await.unwrap().len(), 1);

    // Only the addressee answers.
    assert!(matches!(
        repo.respond_friend_request(ana.id, request.id, true).await,
        Err(CoreError::NotFound(_))
    ));
    let rejected = repo.respond_friend_request(ben.id, request.id, false).await.unwrap();
    assert_eq!(rejected.status, FriendshipStatus::Rejected);
    assert!(!repo.are_friends(ana.id, ben.id).await.unwrap());

    let again = repo.send_friend_request(ana.id, ben.id).await.unwrap();
    repo.respond_friend_request(ben.id, again.id, true).await.unwrap();
    assert!(repo.are_friends(ben.id, ana.id).await.unwrap());
    assert_eq!(repo.list_friends(ana.id).await.unwrap()[0].id, ben.id);
}
