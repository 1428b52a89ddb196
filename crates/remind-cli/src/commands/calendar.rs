use anyhow::Result;
use chrono::Utc;
use remind_core::calendar::CalendarView;
use remind_core::repository::VisibilityRepository;

use crate::cli::CalendarCommand;
use crate::context::Context;
use crate::parser::parse_month;
use crate::views::calendar::display_month;

pub async fn show_calendar(ctx: &Context, command: CalendarCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let locale = command.locale.unwrap_or(ctx.config.calendar.locale);
    let today = Utc::now().with_timezone(&ctx.tz).date_naive();

    let view = match command.month.as_deref() {
        Some(month) => {
            let (year, month) = parse_month(month)?;
            CalendarView::new(year, month, locale)?
        }
        None => CalendarView::containing(today, locale),
    };

    let visible = ctx.repo().list_reminders(user_id).await?;
    let month = view.render(visible.iter().map(|v| &v.reminder), today, &ctx.tz)?;
    display_month(&month, ctx.tz);
    Ok(())
}
