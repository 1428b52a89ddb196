//! Who may see a reminder, and what they may change on it.
//!
//! The three sources of a user's reminder set (owned, shared by a friend,
//! shared through a group) are produced independently by the repository;
//! [`merge_visibility`] is the single place where they are combined.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::models::{ReminderId, UpdateReminderData, UserId, VisibleReminder};

/// Rights a user holds over one reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    /// Non-owner without an edit grant: completion and notification flags only.
    Viewer,
    /// Non-owner with `can_edit`: content fields and flags.
    Editor,
    Owner,
}

impl AccessLevel {
    pub fn of(visible: &VisibleReminder) -> Self {
        if visible.is_owner {
            AccessLevel::Owner
        } else if visible.can_edit {
            AccessLevel::Editor
        } else {
            AccessLevel::Viewer
        }
    }

    pub fn is_owner(self) -> bool {
        self == AccessLevel::Owner
    }

    /// Recurrence and sharing stay with the owner regardless of grants.
    pub fn can_manage(self) -> bool {
        self.is_owner()
    }
}

/// Rejects `data` with `Forbidden` when it touches a field outside `access`.
pub fn check_update(access: AccessLevel, data: &UpdateReminderData) -> Result<(), CoreError> {
    match access {
        AccessLevel::Owner | AccessLevel::Editor => Ok(()),
        AccessLevel::Viewer if data.touches_content() => Err(CoreError::Forbidden(
            "Shared reminders without edit rights only accept completion and notification changes"
                .to_string(),
        )),
        AccessLevel::Viewer => Ok(()),
    }
}

/// Unions the three visibility sources for `viewer`.
///
/// Rows owned by `viewer` are dropped from the shared sources, duplicates are
/// resolved first-wins in the order owned, friend, group, and the result is
/// sorted newest first.
pub fn merge_visibility(
    viewer: UserId,
    owned: Vec<VisibleReminder>,
    shared_by_friends: Vec<VisibleReminder>,
    shared_via_groups: Vec<VisibleReminder>,
) -> Vec<VisibleReminder> {
    let mut seen: HashSet<ReminderId> = HashSet::new();
    let owned = owned.into_iter().filter(|v| v.reminder.user_id == viewer);
    let shared = shared_by_friends
        .into_iter()
        .chain(shared_via_groups)
        .filter(|v| v.reminder.user_id != viewer);

    let mut merged: Vec<VisibleReminder> = owned
        .chain(shared)
        .filter(|v| seen.insert(v.id()))
        .collect();

    merged.sort_by(|a, b| {
        b.reminder
            .created_at
            .cmp(&a.reminder.created_at)
            .then_with(|| b.id().cmp(&a.id()))
    });
    merged
}
