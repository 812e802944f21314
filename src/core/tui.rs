//! Terminal rendering for text output.

use crate::core::model::{DayKey, TodoItem};
use colored::Colorize;
use std::env;

const MIN_BOX_WIDTH: usize = 30;
const MAX_BOX_WIDTH: usize = 50;
const MAX_TODO_CHARS: usize = 72;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxStyle {
    Info,
    Success,
    Warning,
}

pub fn terminal_width() -> usize {
    env::var("TERM_WIDTH")
        .ok()
        .and_then(|w| w.parse().ok())
        .or_else(|| env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .unwrap_or(80)
}

fn effective_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

pub fn box_row(content: &str, width: usize) -> String {
    let content_len = content.chars().count();
    let padding = width.saturating_sub(2).saturating_sub(content_len);
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;
    format!(
        "║{}{}{}║",
        " ".repeat(left_pad),
        content,
        " ".repeat(right_pad)
    )
}

pub fn render_box(title: &str, subtitle: &str, style: BoxStyle) {
    let width = effective_width();
    let top = format!("╔{}╗", "═".repeat(width - 2));
    let bottom = format!("╚{}╝", "═".repeat(width - 2));
    let lines = [top, box_row(title, width), box_row(subtitle, width), bottom];
    for (i, line) in lines.iter().enumerate() {
        if i == 2 && subtitle.is_empty() {
            continue;
        }
        let painted = match style {
            BoxStyle::Info => line.bright_cyan(),
            BoxStyle::Success => line.bright_green(),
            BoxStyle::Warning => line.bright_yellow(),
        };
        if i == 1 {
            println!("{}", painted.bold());
        } else {
            println!("{}", painted);
        }
    }
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// One numbered checklist line, without colour.
pub fn todo_line(index: usize, item: &TodoItem) -> String {
    let check = if item.done { "x" } else { " " };
    format!("{:>3}. [{}] {}", index, check, compact_line(&item.text, MAX_TODO_CHARS))
}

pub fn print_day(day: DayKey, todos: &[TodoItem], last_saved_at: Option<&str>) {
    println!("{} {}", "▸".bright_cyan(), day.to_string().bright_white().bold());
    if todos.is_empty() {
        println!("  {}", "Nothing planned yet. Add a todo with `daybook add`.".dimmed());
    }
    for (i, item) in todos.iter().enumerate() {
        let line = todo_line(i, item);
        if item.done {
            println!("{}", line.dimmed().strikethrough());
        } else {
            println!("{}", line);
        }
    }
    if let Some(stamp) = last_saved_at {
        println!("  {} {}", "last saved".dimmed(), stamp.dimmed());
    }
}
