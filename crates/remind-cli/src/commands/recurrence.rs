use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use remind_core::api::LocalReminderApi;
use remind_core::models::RecurrencePattern;
use remind_core::repository::ReminderRepository;

use crate::cli::{RecurCommand, RecurSubcommand};
use crate::context::Context;
use crate::parser::parse_end_date;
use crate::views::format_instant;

pub async fn recurrence_command(ctx: &Context, command: RecurCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let success_style = Style::new().green().bold();

    match command.command {
        RecurSubcommand::Set { id, pattern, until } => {
            let pattern = RecurrencePattern::from(pattern);
            let end_date = until.as_deref().map(|u| parse_end_date(u, ctx.tz)).transpose()?;
            let reminder = ctx.repo().set_recurrence(user_id, id, pattern, end_date).await?;
            println!(
                "{} '{}' now repeats {}",
                "✓".style(success_style),
                reminder.title.bright_white().bold(),
                pattern
            );
        }
        RecurSubcommand::Clear { id } => {
            let reminder = ctx.repo().remove_recurrence(user_id, id).await?;
            println!(
                "{} '{}' no longer repeats",
                "✓".style(success_style),
                reminder.title.bright_white().bold()
            );
        }
        RecurSubcommand::Preview { id, limit } => {
            let api = LocalReminderApi::new(ctx.repo.clone(), ctx.repo().location_store(), user_id);
            let preview = api.occurrences(id, limit).await?;
            println!(
                "Upcoming {} occurrences of #{}:",
                preview.pattern,
                preview.reminder_id
            );
            for (n, occurrence) in preview.occurrences.iter().enumerate() {
                println!("  {:>3}. {}", n + 1, format_instant(*occurrence, ctx.tz));
            }
        }
    }
    Ok(())
}
