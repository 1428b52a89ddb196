use anyhow::{anyhow, Result};
use owo_colors::{OwoColorize, Style};
use remind_core::models::UpdateReminderData;
use remind_core::repository::ReminderRepository;

use crate::cli::EditCommand;
use crate::context::Context;
use crate::parser::parse_datetime;

pub async fn edit_reminder(ctx: &Context, command: EditCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let id = command.id;

    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.map(Some)
    };

    let datetime = command
        .at
        .as_deref()
        .map(|at| parse_datetime(at, ctx.tz))
        .transpose()?;

    let update_data = UpdateReminderData {
        title: command.title,
        description,
        datetime,
        address: command.address,
        is_completed: command.reopen.then_some(false),
        is_notified: command.notified,
    };

    if update_data.is_empty() {
        return Err(anyhow!(
            "Nothing to change. Pass --title, --description, --at, --address, --notified or --reopen"
        ));
    }

    let outcome = ctx.repo().update_reminder(user_id, id, update_data).await?;
    println!(
        "{} Updated reminder: {}",
        "✓".style(Style::new().green().bold()),
        outcome.reminder().title.bright_white().bold()
    );
    Ok(())
}
