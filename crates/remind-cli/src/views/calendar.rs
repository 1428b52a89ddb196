use chrono::Datelike;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Table};
use owo_colors::OwoColorize;
use remind_core::calendar::{DayCell, MonthView, Occurrence};

use super::format_instant;

const TITLES_PER_CELL: usize = 2;
const TITLE_WIDTH: usize = 12;

pub fn display_month(view: &MonthView<'_>, tz: Tz) {
    println!("{}", view.title.bold());

    let mut table = Table::new();
    table.set_header(view.weekday_labels.to_vec());
    for week in view.days.chunks(7) {
        let cells: Vec<Cell> = week.iter().map(day_cell).collect();
        table.add_row(cells);
    }
    println!("{table}");

    let agenda: Vec<&Occurrence<'_>> = view
        .days
        .iter()
        .flat_map(|day| day.occurrences.iter())
        .collect();
    if agenda.is_empty() {
        println!("No reminders this month.");
        return;
    }
    for occurrence in agenda {
        println!("  {}", agenda_line(occurrence, tz));
    }
}

fn day_cell(day: &DayCell<'_>) -> Cell {
    let text = cell_text(day);
    let mut cell = Cell::new(text);
    if !day.in_month {
        cell = cell.fg(Color::DarkGrey);
    } else if day.is_today {
        cell = cell.fg(Color::Yellow).add_attribute(Attribute::Bold);
    }
    cell
}

fn cell_text(day: &DayCell<'_>) -> String {
    let mut lines = vec![if day.is_today {
        format!("{}*", day.date.day())
    } else {
        day.date.day().to_string()
    }];
    for occurrence in day.occurrences.iter().take(TITLES_PER_CELL) {
        lines.push(truncate(&occurrence.reminder.title, TITLE_WIDTH));
    }
    if day.occurrences.len() > TITLES_PER_CELL {
        lines.push(format!("+{} more", day.occurrences.len() - TITLES_PER_CELL));
    }
    lines.join("\n")
}

fn agenda_line(occurrence: &Occurrence<'_>, tz: Tz) -> String {
    let marker = if occurrence.is_location_marker {
        "@"
    } else if occurrence.is_recurring_occurrence {
        "↻"
    } else {
        "•"
    };
    format!(
        "{} {} {} (#{})",
        format_instant(occurrence.datetime, tz),
        marker,
        occurrence.reminder.title,
        occurrence.reminder.id
    )
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        title.to_string()
    } else {
        let mut short: String = title.chars().take(width.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}
