use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use remind_core::repository::ReminderRepository;

use crate::cli::DeleteCommand;
use crate::context::Context;

pub async fn delete_reminder(ctx: &Context, command: DeleteCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let visible = ctx.repo().find_visible_reminder(user_id, command.id).await?;

    if !command.force {
        let confirmation = Confirm::new()
            .with_prompt(format!(
                "Are you sure you want to delete reminder '{}'?",
                visible.reminder.title
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirmation {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    ctx.repo().delete_reminder(user_id, command.id).await?;
    println!(
        "{} Deleted reminder: {}",
        "✓".style(Style::new().green().bold()),
        visible.reminder.title
    );
    Ok(())
}
