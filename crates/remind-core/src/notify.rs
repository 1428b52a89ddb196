//! In-session notification delivery.
//!
//! A [`NotificationPoller`] owns a background task that periodically asks the
//! [`ReminderApi`] for the visible reminder set, surfaces every due reminder
//! exactly once per session through a [`NotificationPresenter`], and applies
//! the action the user picked. A second pass, when a [`PositionSource`] is
//! configured, does the same for location-bearing reminders near the device.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use remind_core::notify::{NotificationPoller, NotificationPreferences, PollerConfig};
//! # use remind_core::notify::{NotificationPresenter, ReminderApi};
//!
//! # async fn example(api: Arc<dyn ReminderApi>, presenter: Arc<dyn NotificationPresenter>) -> Result<(), remind_core::notify::PollerError> {
//! let preferences = Arc::new(NotificationPreferences::default());
//! let mut poller = NotificationPoller::new(api, presenter, preferences, PollerConfig::default());
//!
//! poller.start()?;
//! // ... session runs ...
//! poller.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::api::{SuccessResponse, UpdateReminderResponse};
use crate::error::CoreError;
use crate::models::{GeoPoint, Reminder, ReminderId, UpdateReminderData, VisibleReminder};
use crate::proximity::within_radius;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_LOCATION_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_GEOFENCING_RADIUS_KM: f64 = 2.0;

/// The reminder endpoints the poller talks to, scoped to the session's user.
#[async_trait]
pub trait ReminderApi: Send + Sync {
    async fn list_reminders(&self) -> Result<Vec<VisibleReminder>, CoreError>;
    async fn update_reminder(&self, id: ReminderId, data: UpdateReminderData) -> Result<UpdateReminderResponse, CoreError>;
    async fn delete_reminder(&self, id: ReminderId) -> Result<SuccessResponse, CoreError>;
    /// Coordinates of a stored location record.
    async fn location(&self, location_id: &str) -> Result<Option<GeoPoint>, CoreError>;
}

/// What the user chose on a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Accept,
    Discard,
    /// The only choice offered on reminders shared with the user.
    Acknowledge,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    Due,
    Nearby { distance_km: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub reminder: VisibleReminder,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn actions(&self) -> &'static [NotificationAction] {
        if self.reminder.is_owner {
            &[NotificationAction::Accept, NotificationAction::Discard]
        } else {
            &[NotificationAction::Acknowledge]
        }
    }
}

/// Renders notifications and collects the user's choice.
#[async_trait]
pub trait NotificationPresenter: Send + Sync {
    async fn present(&self, notification: &Notification) -> NotificationAction;
    /// Feedback after an accepted recurring reminder moved to its next occurrence.
    async fn renewed(&self, reminder: &Reminder, next_occurrence: DateTime<Utc>);
    /// Dismisses the notification; called after every action, failed or not.
    async fn close(&self, reminder_id: ReminderId);
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Option<GeoPoint>;
}

/// User preferences read by the poller on start and on every tick.
#[derive(Debug)]
pub struct NotificationPreferences {
    enabled: AtomicBool,
    radius_km_bits: AtomicU64,
}

impl NotificationPreferences {
    pub fn new(enabled: bool, geofencing_radius_km: f64) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            radius_km_bits: AtomicU64::new(geofencing_radius_km.to_bits()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn geofencing_radius_km(&self) -> f64 {
        f64::from_bits(self.radius_km_bits.load(Ordering::SeqCst))
    }

    pub fn set_geofencing_radius_km(&self, radius_km: f64) {
        self.radius_km_bits.store(radius_km.to_bits(), Ordering::SeqCst);
    }
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self::new(true, DEFAULT_GEOFENCING_RADIUS_KM)
    }
}

/// Reminder ids already surfaced in this session.
///
/// Entries leave only through [`ShownNotifications::remove`]; time never
/// expires them.
#[derive(Debug, Default)]
pub struct ShownNotifications {
    ids: Mutex<HashSet<ReminderId>>,
}

impl ShownNotifications {
    fn ids(&self) -> std::sync::MutexGuard<'_, HashSet<ReminderId>> {
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `id`; false when it was already present.
    pub fn insert(&self, id: ReminderId) -> bool {
        self.ids().insert(id)
    }

    pub fn contains(&self, id: ReminderId) -> bool {
        self.ids().contains(&id)
    }

    pub fn remove(&self, id: ReminderId) -> bool {
        self.ids().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

/// Session-scoped state shared by the poller passes.
#[derive(Debug, Default)]
pub struct NotificationSession {
    pub due: ShownNotifications,
    pub nearby: ShownNotifications,
}

impl NotificationSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn shown(&self, kind: &NotificationKind) -> &ShownNotifications {
        match kind {
            NotificationKind::Due => &self.due,
            NotificationKind::Nearby { .. } => &self.nearby,
        }
    }
}

/// Owners are additionally silenced by their persisted `is_notified` flag;
/// for viewers that flag belongs to someone else and is ignored.
fn passes_ownership_rule(visible: &VisibleReminder) -> bool {
    !visible.is_owner || !visible.reminder.is_notified
}

/// True when `visible` should produce a due notification at `now`.
pub fn is_due_for_notification(
    visible: &VisibleReminder,
    now: DateTime<Utc>,
    shown: &ShownNotifications,
) -> bool {
    visible.reminder.is_due_at(now) && passes_ownership_rule(visible) && !shown.contains(visible.id())
}

/// True when `visible` is a candidate for a proximity notification.
pub fn is_nearby_candidate(visible: &VisibleReminder, shown: &ShownNotifications) -> bool {
    let reminder = &visible.reminder;
    reminder.reminder_type.requires_location()
        && reminder.location_id.is_some()
        && !reminder.is_completed
        && passes_ownership_rule(visible)
        && !shown.contains(visible.id())
}

/// Selects, presents and resolves notifications for one session.
pub struct NotificationDispatcher {
    api: Arc<dyn ReminderApi>,
    presenter: Arc<dyn NotificationPresenter>,
    session: Arc<NotificationSession>,
}

impl NotificationDispatcher {
    pub fn new(
        api: Arc<dyn ReminderApi>,
        presenter: Arc<dyn NotificationPresenter>,
        session: Arc<NotificationSession>,
    ) -> Self {
        Self { api, presenter, session }
    }

    pub fn session(&self) -> &NotificationSession {
        &self.session
    }

    /// One tick of the due pass; returns how many notifications were shown.
    ///
    /// Results are dropped when `cancel` fired while the listing was in flight.
    pub async fn check_due(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> Result<usize, CoreError> {
        let reminders = self.api.list_reminders().await?;
        if cancel.is_cancelled() {
            debug!("session ended during fetch, ignoring due reminders");
            return Ok(0);
        }

        let mut shown = 0;
        for visible in reminders {
            if !is_due_for_notification(&visible, now, &self.session.due) {
                continue;
            }
            self.surface(Notification {
                reminder: visible,
                kind: NotificationKind::Due,
            })
            .await;
            shown += 1;
        }
        Ok(shown)
    }

    /// One tick of the proximity pass around `position`.
    pub async fn check_nearby(
        &self,
        position: GeoPoint,
        radius_km: f64,
        cancel: &CancellationToken,
    ) -> Result<usize, CoreError> {
        let reminders = self.api.list_reminders().await?;
        if cancel.is_cancelled() {
            debug!("session ended during fetch, ignoring nearby reminders");
            return Ok(0);
        }

        let mut shown = 0;
        for visible in reminders {
            if !is_nearby_candidate(&visible, &self.session.nearby) {
                continue;
            }
            let Some(location_id) = visible.reminder.location_id.as_deref() else {
                continue;
            };
            let point = match self.api.location(location_id).await {
                Ok(Some(point)) => point,
                Ok(None) => {
                    debug!(reminder_id = visible.id(), location_id, "location record missing");
                    continue;
                }
                Err(e) => {
                    warn!(reminder_id = visible.id(), error = %e, "failed to load reminder location");
                    continue;
                }
            };
            if let Some(distance_km) = within_radius(position, point, radius_km) {
                self.surface(Notification {
                    reminder: visible,
                    kind: NotificationKind::Nearby { distance_km },
                })
                .await;
                shown += 1;
            }
        }
        Ok(shown)
    }

    async fn surface(&self, notification: Notification) {
        let id = notification.reminder.id();
        if !self.session.shown(&notification.kind).insert(id) {
            return;
        }
        info!(
            reminder_id = id,
            is_owner = notification.reminder.is_owner,
            kind = ?notification.kind,
            "notification surfaced"
        );

        let action = self.presenter.present(&notification).await;
        self.resolve(&notification, action).await;
        self.presenter.close(id).await;
    }

    /// Applies `action`; failures are logged and leave the shown set as is.
    pub async fn resolve(&self, notification: &Notification, action: NotificationAction) {
        let visible = &notification.reminder;
        let id = visible.id();
        let shown = self.session.shown(&notification.kind);

        if !visible.is_owner || action == NotificationAction::Acknowledge {
            debug!(reminder_id = id, "notification acknowledged");
            return;
        }

        match action {
            NotificationAction::Accept if visible.reminder.active_pattern().is_some() => {
                let data = UpdateReminderData {
                    is_completed: Some(true),
                    is_notified: Some(true),
                    ..Default::default()
                };
                match self.api.update_reminder(id, data).await {
                    Ok(response) => {
                        shown.remove(id);
                        if let (Some(true), Some(next)) = (response.renewed, response.next_occurrence) {
                            self.presenter.renewed(&response.reminder, next).await;
                        }
                    }
                    Err(e) => error!(reminder_id = id, error = %e, "failed to complete recurring reminder"),
                }
            }
            NotificationAction::Accept => {
                let data = UpdateReminderData {
                    is_notified: Some(true),
                    ..Default::default()
                };
                if let Err(e) = self.api.update_reminder(id, data).await {
                    error!(reminder_id = id, error = %e, "failed to mark reminder as notified");
                }
            }
            NotificationAction::Discard => match self.api.delete_reminder(id).await {
                Ok(_) => {
                    shown.remove(id);
                }
                Err(e) => error!(reminder_id = id, error = %e, "failed to discard reminder"),
            },
            NotificationAction::Acknowledge => {}
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PollerError {
    #[error("Notification poller already running")]
    AlreadyRunning,
    #[error("Notification poller not running")]
    NotRunning,
    #[error("Notifications are disabled")]
    Disabled,
    #[error("Notification poller task panicked")]
    Panicked,
    #[error("Notification poller did not stop in time")]
    JoinTimeout,
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between due passes
    pub poll_interval: Duration,
    /// Interval between proximity passes
    pub location_poll_interval: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            location_poll_interval: DEFAULT_LOCATION_POLL_INTERVAL,
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Notification poller with explicit lifecycle management.
pub struct NotificationPoller {
    dispatcher: Arc<NotificationDispatcher>,
    preferences: Arc<NotificationPreferences>,
    position: Option<Arc<dyn PositionSource>>,
    config: PollerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl NotificationPoller {
    pub fn new(
        api: Arc<dyn ReminderApi>,
        presenter: Arc<dyn NotificationPresenter>,
        preferences: Arc<NotificationPreferences>,
        config: PollerConfig,
    ) -> Self {
        let session = Arc::new(NotificationSession::new());
        Self {
            dispatcher: Arc::new(NotificationDispatcher::new(api, presenter, session)),
            preferences,
            position: None,
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Enables the proximity pass.
    pub fn with_position_source(mut self, position: Arc<dyn PositionSource>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn session(&self) -> &NotificationSession {
        self.dispatcher.session()
    }

    /// Spawns the background task.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<(), PollerError> {
        if self.is_running() {
            return Err(PollerError::AlreadyRunning);
        }
        if !self.preferences.is_enabled() {
            info!("notifications disabled by preference, poller not started");
            return Err(PollerError::Disabled);
        }

        self.cancellation = CancellationToken::new();
        let dispatcher = Arc::clone(&self.dispatcher);
        let preferences = Arc::clone(&self.preferences);
        let position = self.position.clone();
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::poll_loop(dispatcher, preferences, position, config, cancel).await;
        });

        self.task_handle = Some(handle);
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            geofencing = self.position.is_some(),
            "notification poller started"
        );
        Ok(())
    }

    /// Cancels the background task and waits for it to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<(), PollerError> {
        let Some(mut handle) = self.task_handle.take() else {
            return Err(PollerError::NotRunning);
        };

        self.cancellation.cancel();
        let result = match tokio::time::timeout(self.config.join_timeout, &mut handle).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("poller task panicked: {}", e);
                Err(PollerError::Panicked)
            }
            Err(_) => {
                warn!("poller task did not complete within timeout");
                handle.abort();
                Err(PollerError::JoinTimeout)
            }
        };

        self.cancellation = CancellationToken::new();
        info!("notification poller stopped");
        result
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    async fn poll_loop(
        dispatcher: Arc<NotificationDispatcher>,
        preferences: Arc<NotificationPreferences>,
        position: Option<Arc<dyn PositionSource>>,
        config: PollerConfig,
        cancel: CancellationToken,
    ) {
        let mut due_ticker = tokio::time::interval(config.poll_interval);
        due_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut location_ticker = tokio::time::interval(config.location_poll_interval);
        location_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("notification poll loop cancelled");
                    break;
                }
                _ = due_ticker.tick() => {
                    if !preferences.is_enabled() {
                        debug!("notifications disabled, skipping due pass");
                        continue;
                    }
                    match dispatcher.check_due(Utc::now(), &cancel).await {
                        Ok(0) => {}
                        Ok(count) => debug!(count, "due notifications shown"),
                        Err(e) => warn!(error = %e, "failed to fetch reminders"),
                    }
                }
                _ = location_ticker.tick(), if position.is_some() => {
                    if !preferences.is_enabled() {
                        continue;
                    }
                    let Some(source) = position.as_ref() else { continue };
                    let Some(here) = source.current_position().await else {
                        debug!("no position available, skipping proximity pass");
                        continue;
                    };
                    let radius_km = preferences.geofencing_radius_km();
                    if let Err(e) = dispatcher.check_nearby(here, radius_km, &cancel).await {
                        warn!(error = %e, "failed to check nearby reminders");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecurrencePattern, ReminderType, ShareKind};
    use chrono::{Duration as ChronoDuration, TimeZone};
    use std::sync::atomic::AtomicUsize;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn due(id: ReminderId) -> Reminder {
        Reminder {
            id,
            user_id: 1,
            title: format!("due {}", id),
            datetime: Some(now() - ChronoDuration::minutes(5)),
            ..Default::default()
        }
    }

    fn shared(reminder: Reminder) -> VisibleReminder {
        VisibleReminder {
            is_owner: false,
            can_edit: false,
            shared_via: Some(ShareKind::Friend),
            shared_by: Some(reminder.user_id),
            ..VisibleReminder::owned(reminder)
        }
    }

    #[derive(Default)]
    struct FakeApi {
        reminders: Mutex<Vec<VisibleReminder>>,
        locations: Mutex<Vec<(String, GeoPoint)>>,
        updates: Mutex<Vec<(ReminderId, UpdateReminderData)>>,
        deletes: Mutex<Vec<ReminderId>>,
        list_calls: AtomicUsize,
        fail_mutations: AtomicBool,
        renew_to: Mutex<Option<DateTime<Utc>>>,
    }

    impl FakeApi {
        fn with(reminders: Vec<VisibleReminder>) -> Arc<Self> {
            let api = Self::default();
            *api.reminders.lock().unwrap() = reminders;
            Arc::new(api)
        }
    }

    #[async_trait]
    impl ReminderApi for FakeApi {
        async fn list_reminders(&self) -> Result<Vec<VisibleReminder>, CoreError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reminders.lock().unwrap().clone())
        }

        async fn update_reminder(&self, id: ReminderId, data: UpdateReminderData) -> Result<UpdateReminderResponse, CoreError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(CoreError::Upstream("connection reset".to_string()));
            }
            self.updates.lock().unwrap().push((id, data));
            let reminder = self
                .reminders
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.id() == id)
                .map(|v| v.reminder.clone())
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            let next = *self.renew_to.lock().unwrap();
            Ok(UpdateReminderResponse {
                success: true,
                reminder,
                renewed: next.map(|_| true),
                next_occurrence: next,
            })
        }

        async fn delete_reminder(&self, id: ReminderId) -> Result<SuccessResponse, CoreError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(CoreError::Upstream("connection reset".to_string()));
            }
            self.deletes.lock().unwrap().push(id);
            self.reminders.lock().unwrap().retain(|v| v.id() != id);
            Ok(SuccessResponse::ok())
        }

        async fn location(&self, location_id: &str) -> Result<Option<GeoPoint>, CoreError> {
            Ok(self
                .locations
                .lock()
                .unwrap()
                .iter()
                .find(|(id, _)| id == location_id)
                .map(|(_, point)| *point))
        }
    }

    struct ScriptedPresenter {
        action: NotificationAction,
        presented: Mutex<Vec<Notification>>,
        renewed: Mutex<Vec<DateTime<Utc>>>,
        closed: Mutex<Vec<ReminderId>>,
    }

    impl ScriptedPresenter {
        fn answering(action: NotificationAction) -> Arc<Self> {
            Arc::new(Self {
                action,
                presented: Mutex::new(Vec::new()),
                renewed: Mutex::new(Vec::new()),
                closed: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NotificationPresenter for ScriptedPresenter {
        async fn present(&self, notification: &Notification) -> NotificationAction {
            self.presented.lock().unwrap().push(notification.clone());
            self.action
        }

        async fn renewed(&self, _reminder: &Reminder, next_occurrence: DateTime<Utc>) {
            self.renewed.lock().unwrap().push(next_occurrence);
        }

        async fn close(&self, reminder_id: ReminderId) {
            self.closed.lock().unwrap().push(reminder_id);
        }
    }

    fn dispatcher(api: &Arc<FakeApi>, presenter: &Arc<ScriptedPresenter>) -> NotificationDispatcher {
        NotificationDispatcher::new(
            api.clone(),
            presenter.clone(),
            Arc::new(NotificationSession::new()),
        )
    }

    mod selection_tests {
        use super::*;

        #[test]
        fn test_owner_flag_suppresses_owned_only() {
            let shown = ShownNotifications::default();
            let mut reminder = due(1);
            reminder.is_notified = true;

            assert!(!is_due_for_notification(&VisibleReminder::owned(reminder.clone()), now(), &shown));
            assert!(is_due_for_notification(&shared(reminder), now(), &shown));
        }

        #[test]
        fn test_future_completed_and_dateless_are_skipped() {
            let shown = ShownNotifications::default();
            let mut future = due(1);
            future.datetime = Some(now() + ChronoDuration::minutes(1));
            let mut completed = due(2);
            completed.is_completed = true;
            let mut dateless = due(3);
            dateless.datetime = None;

            for r in [future, completed, dateless] {
                assert!(!is_due_for_notification(&VisibleReminder::owned(r), now(), &shown));
            }
        }

        #[test]
        fn test_shown_set_suppresses() {
            let shown = ShownNotifications::default();
            assert!(shown.insert(1));
            assert!(!shown.insert(1));
            assert!(!is_due_for_notification(&VisibleReminder::owned(due(1)), now(), &shown));
        }
    }

    mod dispatch_tests {
        use super::*;

        #[tokio::test]
        async fn test_shared_reminder_shown_once_per_session() {
            let api = FakeApi::with(vec![shared(due(1))]);
            let presenter = ScriptedPresenter::answering(NotificationAction::Acknowledge);
            let dispatcher = dispatcher(&api, &presenter);
            let cancel = CancellationToken::new();

            assert_eq!(dispatcher.check_due(now(), &cancel).await.unwrap(), 1);
            assert_eq!(dispatcher.check_due(now(), &cancel).await.unwrap(), 0);

            assert_eq!(presenter.presented.lock().unwrap().len(), 1);
            assert!(api.updates.lock().unwrap().is_empty());
            assert!(api.deletes.lock().unwrap().is_empty());
            assert_eq!(presenter.presented.lock().unwrap()[0].actions(), &[NotificationAction::Acknowledge]);
        }

        #[tokio::test]
        async fn test_viewer_accept_is_treated_as_acknowledge() {
            let api = FakeApi::with(vec![shared(due(1))]);
            let presenter = ScriptedPresenter::answering(NotificationAction::Accept);
            dispatcher(&api, &presenter)
                .check_due(now(), &CancellationToken::new())
                .await
                .unwrap();
            assert!(api.updates.lock().unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_owner_accept_one_off_sets_notified_only() {
            let api = FakeApi::with(vec![VisibleReminder::owned(due(1))]);
            let presenter = ScriptedPresenter::answering(NotificationAction::Accept);
            let dispatcher = dispatcher(&api, &presenter);
            dispatcher.check_due(now(), &CancellationToken::new()).await.unwrap();

            let updates = api.updates.lock().unwrap();
            assert_eq!(updates.len(), 1);
            assert_eq!(updates[0].1.is_notified, Some(true));
            assert_eq!(updates[0].1.is_completed, None);
            assert!(dispatcher.session().due.contains(1));
            assert_eq!(*presenter.closed.lock().unwrap(), vec![1]);
        }

        #[tokio::test]
        async fn test_owner_accept_recurring_renews_and_clears_shown() {
            let mut reminder = due(1);
            reminder.is_recurring = true;
            reminder.recurrence_pattern = Some(RecurrencePattern::Daily);
            let api = FakeApi::with(vec![VisibleReminder::owned(reminder)]);
            let next = now() + ChronoDuration::days(1);
            *api.renew_to.lock().unwrap() = Some(next);
            let presenter = ScriptedPresenter::answering(NotificationAction::Accept);
            let dispatcher = dispatcher(&api, &presenter);

            dispatcher.check_due(now(), &CancellationToken::new()).await.unwrap();

            assert_eq!(api.updates.lock().unwrap()[0].1.is_completed, Some(true));
            assert!(!dispatcher.session().due.contains(1));
            assert_eq!(*presenter.renewed.lock().unwrap(), vec![next]);
        }

        #[tokio::test]
        async fn test_owner_discard_deletes() {
            let mut reminder = due(1);
            reminder.is_recurring = true;
            reminder.recurrence_pattern = Some(RecurrencePattern::Weekly);
            let api = FakeApi::with(vec![VisibleReminder::owned(reminder)]);
            let presenter = ScriptedPresenter::answering(NotificationAction::Discard);
            let dispatcher = dispatcher(&api, &presenter);

            dispatcher.check_due(now(), &CancellationToken::new()).await.unwrap();

            assert_eq!(*api.deletes.lock().unwrap(), vec![1]);
            assert!(api.updates.lock().unwrap().is_empty());
            assert!(api.list_reminders().await.unwrap().is_empty());
            assert!(!dispatcher.session().due.contains(1));
        }

        #[tokio::test]
        async fn test_failed_mutation_still_closes_and_keeps_shown() {
            let mut reminder = due(1);
            reminder.is_recurring = true;
            reminder.recurrence_pattern = Some(RecurrencePattern::Daily);
            let api = FakeApi::with(vec![VisibleReminder::owned(reminder)]);
            api.fail_mutations.store(true, Ordering::SeqCst);
            let presenter = ScriptedPresenter::answering(NotificationAction::Accept);
            let dispatcher = dispatcher(&api, &presenter);

            dispatcher.check_due(now(), &CancellationToken::new()).await.unwrap();

            assert_eq!(*presenter.closed.lock().unwrap(), vec![1]);
            assert!(dispatcher.session().due.contains(1));
            assert_eq!(dispatcher.check_due(now(), &CancellationToken::new()).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_cancelled_session_ignores_results() {
            let api = FakeApi::with(vec![VisibleReminder::owned(due(1))]);
            let presenter = ScriptedPresenter::answering(NotificationAction::Accept);
            let cancel = CancellationToken::new();
            cancel.cancel();

            let shown = dispatcher(&api, &presenter).check_due(now(), &cancel).await.unwrap();
            assert_eq!(shown, 0);
            assert!(presenter.presented.lock().unwrap().is_empty());
        }
    }

    mod nearby_tests {
        use super::*;

        fn located(id: ReminderId, location_id: &str) -> Reminder {
            Reminder {
                id,
                user_id: 1,
                title: format!("place {}", id),
                reminder_type: ReminderType::Location,
                address: Some("Somewhere".to_string()),
                location_id: Some(location_id.to_string()),
                ..Default::default()
            }
        }

        #[tokio::test]
        async fn test_nearby_within_radius_only() {
            let api = FakeApi::with(vec![
                VisibleReminder::owned(located(1, "near")),
                VisibleReminder::owned(located(2, "far")),
            ]);
            api.locations.lock().unwrap().extend([
                ("near".to_string(), GeoPoint { lat: 40.4200, lng: -3.7000 }),
                ("far".to_string(), GeoPoint { lat: 41.3874, lng: 2.1686 }),
            ]);
            let presenter = ScriptedPresenter::answering(NotificationAction::Acknowledge);
            let dispatcher = dispatcher(&api, &presenter);
            let here = GeoPoint { lat: 40.4168, lng: -3.7038 };

            let cancel = CancellationToken::new();
            assert_eq!(dispatcher.check_nearby(here, 2.0, &cancel).await.unwrap(), 1);
            assert_eq!(dispatcher.check_nearby(here, 2.0, &cancel).await.unwrap(), 0);

            let presented = presenter.presented.lock().unwrap();
            assert_eq!(presented[0].reminder.id(), 1);
            assert!(matches!(presented[0].kind, NotificationKind::Nearby { distance_km } if distance_km < 1.0));
            assert!(dispatcher.session().due.is_empty());
        }
    }

    mod lifecycle_tests {
        use super::*;

        fn poller(api: &Arc<FakeApi>, prefs: Arc<NotificationPreferences>) -> NotificationPoller {
            NotificationPoller::new(
                api.clone(),
                ScriptedPresenter::answering(NotificationAction::Acknowledge),
                prefs,
                PollerConfig {
                    poll_interval: Duration::from_millis(10),
                    location_poll_interval: Duration::from_millis(10),
                    join_timeout: Duration::from_secs(1),
                },
            )
        }

        #[tokio::test]
        async fn test_disabled_preference_prevents_start() {
            let api = FakeApi::with(vec![]);
            let mut poller = poller(&api, Arc::new(NotificationPreferences::new(false, 2.0)));
            assert_eq!(poller.start(), Err(PollerError::Disabled));
            assert!(!poller.is_running());
        }

        #[tokio::test]
        async fn test_start_poll_stop() {
            let api = FakeApi::with(vec![]);
            let mut poller = poller(&api, Arc::new(NotificationPreferences::default()));

            poller.start().unwrap();
            assert!(poller.is_running());
            assert_eq!(poller.start(), Err(PollerError::AlreadyRunning));

            tokio::time::sleep(Duration::from_millis(50)).await;
            poller.stop().await.unwrap();
            assert!(!poller.is_running());
            assert!(api.list_calls.load(Ordering::SeqCst) >= 1);

            let calls = api.list_calls.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            assert_eq!(api.list_calls.load(Ordering::SeqCst), calls);
            assert_eq!(poller.stop().await, Err(PollerError::NotRunning));
        }

        #[tokio::test]
        async fn test_preference_checked_every_tick() {
            let api = FakeApi::with(vec![]);
            let prefs = Arc::new(NotificationPreferences::default());
            let mut poller = poller(&api, prefs.clone());

            poller.start().unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            prefs.set_enabled(false);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let calls = api.list_calls.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(40)).await;
            assert_eq!(api.list_calls.load(Ordering::SeqCst), calls);
            poller.stop().await.unwrap();
        }
    }
}
