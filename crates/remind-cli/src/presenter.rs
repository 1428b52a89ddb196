use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use dialoguer::Select;
use owo_colors::OwoColorize;
use remind_core::models::{GeoPoint, Reminder, ReminderId};
use remind_core::notify::{
    Notification, NotificationAction, NotificationKind, NotificationPresenter, PositionSource,
};
use tracing::debug;

use crate::views::format_instant;

/// Prints notifications and asks for an answer on the terminal.
pub struct TerminalPresenter {
    tz: Tz,
}

impl TerminalPresenter {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    fn headline(&self, notification: &Notification) -> String {
        let reminder = &notification.reminder.reminder;
        match notification.kind {
            NotificationKind::Due => {
                let at = reminder
                    .datetime
                    .map(|at| format_instant(at, self.tz))
                    .unwrap_or_default();
                format!("🔔 {} ({})", reminder.title, at)
            }
            NotificationKind::Nearby { distance_km } => {
                let place = reminder.address.as_deref().unwrap_or("saved place");
                format!("📍 {} near {} ({:.1} km)", reminder.title, place, distance_km)
            }
        }
    }
}

fn action_label(action: NotificationAction) -> &'static str {
    match action {
        NotificationAction::Accept => "Done",
        NotificationAction::Discard => "Delete reminder",
        NotificationAction::Acknowledge => "OK",
    }
}

#[async_trait]
impl NotificationPresenter for TerminalPresenter {
    async fn present(&self, notification: &Notification) -> NotificationAction {
        println!("{}", self.headline(notification).bold());
        if let Some(from) = &notification.reminder.shared_by_name {
            println!("  shared by {}", from);
        }

        let actions = notification.actions();
        let labels: Vec<&'static str> = actions.iter().map(|a| action_label(*a)).collect();
        let choice = tokio::task::spawn_blocking(move || {
            Select::new()
                .with_prompt("What now?")
                .items(&labels)
                .default(0)
                .interact()
        })
        .await;

        match choice {
            Ok(Ok(index)) => actions.get(index).copied().unwrap_or(NotificationAction::Acknowledge),
            Ok(Err(e)) => {
                debug!(error = %e, "no interactive answer, acknowledging");
                NotificationAction::Acknowledge
            }
            Err(e) => {
                debug!(error = %e, "prompt task failed, acknowledging");
                NotificationAction::Acknowledge
            }
        }
    }

    async fn renewed(&self, reminder: &Reminder, next_occurrence: DateTime<Utc>) {
        println!(
            "{} '{}' renewed for {}",
            "↻".blue(),
            reminder.title,
            format_instant(next_occurrence, self.tz).cyan()
        );
    }

    async fn close(&self, reminder_id: ReminderId) {
        debug!(reminder_id, "notification closed");
    }
}

/// Position given on the command line.
pub struct FixedPosition(pub GeoPoint);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Option<GeoPoint> {
        Some(self.0)
    }
}
