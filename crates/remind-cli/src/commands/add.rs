use anyhow::{anyhow, Result};
use owo_colors::{OwoColorize, Style};
use remind_core::models::{NewReminderData, RecurrencePattern, ReminderType};
use remind_core::repository::ReminderRepository;

use crate::cli::{AddCommand, TypeArg};
use crate::context::Context;
use crate::parser::{parse_datetime, parse_end_date};
use crate::views::format_instant;

pub async fn add_reminder(ctx: &Context, command: AddCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let datetime = command.at.as_deref().map(|at| parse_datetime(at, ctx.tz)).transpose()?;
    let recurrence_end_date = command
        .until
        .as_deref()
        .map(|until| parse_end_date(until, ctx.tz))
        .transpose()?;

    let reminder_type = infer_type(command.reminder_type, datetime.is_some(), command.address.is_some())?;
    let recurrence_pattern = command.every.map(RecurrencePattern::from);

    let data = NewReminderData {
        title: command.title,
        description: command.description,
        reminder_type,
        datetime,
        address: command.address,
        recurrence_pattern,
        recurrence_end_date,
    };

    let reminder = ctx.repo().add_reminder(user_id, data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    let label = if reminder.is_recurring { "recurring reminder" } else { "reminder" };
    println!(
        "{} Created {}: {}",
        "✓".style(success_style),
        label,
        reminder.title.bright_white().bold()
    );
    println!("  {} Reminder ID: {}", "→".style(info_style), reminder.id.to_string().yellow());
    if let Some(at) = reminder.datetime {
        println!("  {} At: {}", "→".style(info_style), format_instant(at, ctx.tz).cyan());
    }
    if let Some(address) = &reminder.address {
        println!("  {} Where: {}", "→".style(info_style), address.cyan());
    }
    if let Some(pattern) = reminder.active_pattern() {
        println!(
            "  {} Repeats {}{}",
            "→".style(info_style),
            pattern,
            reminder
                .recurrence_end_date
                .map(|end| format!(" until {}", format_instant(end, ctx.tz)))
                .unwrap_or_default()
        );
    }
    Ok(())
}

/// An explicit `--type` wins; otherwise the supplied fields decide.
fn infer_type(explicit: Option<TypeArg>, has_datetime: bool, has_address: bool) -> Result<ReminderType> {
    if let Some(kind) = explicit {
        return Ok(kind.into());
    }
    match (has_datetime, has_address) {
        (true, true) => Ok(ReminderType::Both),
        (false, true) => Ok(ReminderType::Location),
        (true, false) => Ok(ReminderType::Datetime),
        (false, false) => Err(anyhow!("A reminder needs --at, --address or both")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, true, false, ReminderType::Datetime)]
    #[case(None, false, true, ReminderType::Location)]
    #[case(None, true, true, ReminderType::Both)]
    #[case(Some(TypeArg::Both), true, false, ReminderType::Both)]
    fn test_infer_type(
        #[case] explicit: Option<TypeArg>,
        #[case] has_datetime: bool,
        #[case] has_address: bool,
        #[case] expected: ReminderType,
    ) {
        assert_eq!(infer_type(explicit, has_datetime, has_address).unwrap(), expected);
    }

    #[test]
    fn test_infer_type_needs_a_trigger() {
        assert!(infer_type(None, false, false).is_err());
    }
}
