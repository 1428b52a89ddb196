use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use remind_core::models::{UpdateOutcome, UpdateReminderData};
use remind_core::repository::ReminderRepository;

use crate::cli::DoneCommand;
use crate::context::Context;
use crate::views::format_instant;

pub async fn complete_reminder(ctx: &Context, command: DoneCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let data = UpdateReminderData {
        is_completed: Some(true),
        ..Default::default()
    };

    match ctx.repo().update_reminder(user_id, command.id, data).await? {
        UpdateOutcome::Renewed { reminder, next_occurrence } => {
            println!(
                "{} Completed reminder: {}",
                "✓".style(Style::new().green().bold()),
                reminder.title.bright_white().bold()
            );
            println!(
                "  {} Renewed for {}",
                "↻".blue(),
                format_instant(next_occurrence, ctx.tz).cyan()
            );
        }
        UpdateOutcome::Updated(reminder) => {
            println!(
                "{} Completed reminder: {}",
                "✓".style(Style::new().green().bold()),
                reminder.title.bright_white().bold()
            );
            if reminder.is_recurring {
                println!("  {} Final occurrence, the series has ended", "→".blue());
            }
        }
    }
    Ok(())
}
