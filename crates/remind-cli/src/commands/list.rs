use anyhow::Result;
use owo_colors::OwoColorize;
use remind_core::repository::{ReminderRepository, VisibilityRepository};

use crate::cli::{ListCommand, ShowCommand};
use crate::context::Context;
use crate::views::table::{display_recipients, display_reminders};

pub async fn list_reminders(ctx: &Context, command: ListCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let mut reminders = if command.shared {
        ctx.repo().list_shared_with_me(user_id).await?
    } else {
        ctx.repo().list_reminders(user_id).await?
    };
    if command.open {
        reminders.retain(|v| !v.reminder.is_completed);
    }

    display_reminders(&reminders, ctx.tz);
    Ok(())
}

pub async fn show_reminder(ctx: &Context, command: ShowCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let visible = ctx.repo().find_visible_reminder(user_id, command.id).await?;

    display_reminders(std::slice::from_ref(&visible), ctx.tz);
    if let Some(description) = &visible.reminder.description {
        println!("{}", description.italic());
    }
    if visible.is_owner {
        display_recipients(&visible.shared_with);
    }
    Ok(())
}
