use chrono::Utc;
use chrono_humanize::Humanize;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use remind_core::calendar::Locale;
use remind_core::models::{
    Friendship, Group, GroupMember, Recipient, ShareKind, User, VisibleReminder,
};
use remind_core::visibility::AccessLevel;

use super::format_instant;

pub fn display_reminders(reminders: &[VisibleReminder], tz: Tz) {
    if reminders.is_empty() {
        println!("No reminders found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "When", "Where", "Repeats", "Access"]);

    let now = Utc::now();
    for visible in reminders {
        let reminder = &visible.reminder;
        let mut row = Row::new();
        row.add_cell(Cell::new(reminder.id));

        let mut title = String::new();
        if reminder.active_pattern().is_some() {
            title.push_str("↻ ");
        }
        title.push_str(&reminder.title);
        let mut title_cell = Cell::new(title);
        if reminder.is_completed {
            title_cell = title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        }
        row.add_cell(title_cell);

        let when_cell = match reminder.datetime {
            Some(at) => {
                let text = format!("{} ({})", format_instant(at, tz), at.humanize());
                if !reminder.is_completed && at < now {
                    Cell::new(text).fg(Color::Red)
                } else if !reminder.is_completed
                    && at.with_timezone(&tz).date_naive() == now.with_timezone(&tz).date_naive()
                {
                    Cell::new(text).fg(Color::Yellow)
                } else {
                    Cell::new(text)
                }
            }
            None => Cell::new("-"),
        };
        row.add_cell(when_cell);

        row.add_cell(Cell::new(reminder.address.as_deref().unwrap_or("-")));

        let repeats = match reminder.active_pattern() {
            Some(pattern) => match reminder.recurrence_end_date {
                Some(end) => format!("{} until {}", pattern.label(Locale::En), format_instant(end, tz)),
                None => pattern.label(Locale::En).to_string(),
            },
            None => "-".to_string(),
        };
        row.add_cell(Cell::new(repeats));
        row.add_cell(access_cell(visible));
        table.add_row(row);
    }

    println!("{table}");
}

fn access_cell(visible: &VisibleReminder) -> Cell {
    let level = match AccessLevel::of(visible) {
        AccessLevel::Owner => return Cell::new("owner").fg(Color::Green),
        AccessLevel::Editor => "editor",
        AccessLevel::Viewer => "viewer",
    };
    let via = match visible.shared_via {
        Some(ShareKind::Group) => format!(
            " via {}",
            visible.group_name.as_deref().unwrap_or("group")
        ),
        _ => format!(
            " from {}",
            visible.shared_by_name.as_deref().unwrap_or("friend")
        ),
    };
    Cell::new(format!("{}{}", level, via)).fg(Color::Cyan)
}

pub fn display_recipients(recipients: &[Recipient]) {
    if recipients.is_empty() {
        println!("Not shared with anyone.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Shared with", "Kind", "Can edit"]);
    for recipient in recipients {
        let kind = match recipient.kind {
            ShareKind::Friend => "friend",
            ShareKind::Group => "group",
        };
        table.add_row(vec![
            Cell::new(format!("{} (#{})", recipient.name, recipient.recipient_id)),
            Cell::new(kind),
            Cell::new(if recipient.can_edit { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
}

pub fn display_users(users: &[User]) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Email"]);
    for user in users {
        table.add_row(vec![Cell::new(user.id), Cell::new(&user.name), Cell::new(&user.email)]);
    }
    println!("{table}");
}

pub fn display_requests(requests: &[Friendship]) {
    if requests.is_empty() {
        println!("No pending requests.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Request", "From user", "Sent"]);
    for request in requests {
        table.add_row(vec![
            Cell::new(request.id),
            Cell::new(request.requester_id),
            Cell::new(request.created_at.humanize()),
        ]);
    }
    println!("{table}");
}

pub fn display_groups(groups: &[Group]) {
    if groups.is_empty() {
        println!("No groups found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Description", "Owner"]);
    for group in groups {
        table.add_row(vec![
            Cell::new(group.id),
            Cell::new(&group.name),
            Cell::new(group.description.as_deref().unwrap_or("None")),
            Cell::new(group.owner_id),
        ]);
    }
    println!("{table}");
}

pub fn display_members(members: &[GroupMember]) {
    let mut table = Table::new();
    table.set_header(vec!["User", "Name", "Role", "Joined"]);
    for member in members {
        table.add_row(vec![
            Cell::new(member.user_id),
            Cell::new(&member.name),
            Cell::new(format!("{:?}", member.role).to_lowercase()),
            Cell::new(member.joined_at.humanize()),
        ]);
    }
    println!("{table}");
}
