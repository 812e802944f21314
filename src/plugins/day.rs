//! Day record manager: every edit to one day's todo list.
//!
//! Operations take the collection explicitly and never touch the disk. Each
//! [`DayCommand`] applied through [`apply`] returns the day's new snapshot and
//! an [`Effect`] telling the caller whether the change must be persisted now
//! or may wait for the next explicit save. Text edits wait (no write per
//! keystroke); adds, deletes, toggles and saves persist immediately.

use crate::core::error::DaybookError;
use crate::core::model::{Collection, DayKey, DayRecord, TodoItem};
use crate::core::output::{self, OutputFormat};
use crate::core::planner::Planner;
use crate::core::tui::{self, BoxStyle};
use crate::core::{schema, time};
use clap::Subcommand;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum DayCli {
    /// List the todos of a day.
    Show {
        /// Day to show (YYYY-MM-DD); defaults to today.
        #[clap(long)]
        date: Option<String>,
    },
    /// Add a todo.
    Add {
        /// Todo text (positional argument)
        #[clap(value_name = "TEXT")]
        text: String,
        #[clap(long)]
        date: Option<String>,
    },
    /// Mark a todo done or open; flips it when --done is omitted.
    Toggle {
        #[clap(long)]
        index: usize,
        #[clap(long)]
        done: Option<bool>,
        #[clap(long)]
        date: Option<String>,
    },
    /// Replace a todo's text and save the day.
    Edit {
        #[clap(long)]
        index: usize,
        #[clap(long)]
        text: String,
        #[clap(long)]
        date: Option<String>,
    },
    /// Delete a todo.
    Delete {
        #[clap(long)]
        index: usize,
        #[clap(long)]
        date: Option<String>,
    },
    /// Save the day: prune empty todos and stamp the save time.
    Save {
        #[clap(long)]
        date: Option<String>,
    },
    /// Remove every done todo from a day.
    ClearDone {
        #[clap(long)]
        date: Option<String>,
    },
    /// Append an old undated list (JSON array or plain text) to a day.
    Import {
        /// File holding the list.
        #[clap(value_name = "FILE")]
        source: PathBuf,
        #[clap(long)]
        date: Option<String>,
    },
}

/// One edit to one day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayCommand {
    Add { text: String },
    SetItem { index: usize, text: String, done: bool },
    Toggle { index: usize, done: Option<bool> },
    EditText { index: usize, text: String },
    Delete { index: usize },
    /// Replace the list; `None` re-saves the current working list.
    Save { items: Option<Vec<TodoItem>> },
    Import { items: Vec<TodoItem> },
    ClearDone,
}

/// What the caller has to do after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Write the collection and stamp `_meta.last_saved_at`.
    Persist,
    /// Keep the change in memory until the next persisting command.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied {
    pub day: DayKey,
    pub effect: Effect,
    pub todos: Vec<TodoItem>,
}

/// Returns the day's record, creating an empty one on first access.
///
/// Records are normalised when the collection is loaded, so the entry handed
/// out is always canonical.
pub fn get_or_create(collection: &mut Collection, day: DayKey) -> &mut DayRecord {
    collection.entry(day)
}

/// Appends an open todo; rejects text that is empty once trimmed.
pub fn add_item(
    collection: &mut Collection,
    day: DayKey,
    text: &str,
) -> Result<usize, DaybookError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DaybookError::EmptyInput);
    }
    let record = get_or_create(collection, day);
    record.todos.push(TodoItem::new(text));
    Ok(record.todos.len() - 1)
}

/// Overwrites one item in place; text is stored as typed.
pub fn set_item(
    collection: &mut Collection,
    day: DayKey,
    index: usize,
    text: &str,
    done: bool,
) -> Result<(), DaybookError> {
    let item = item_mut(collection, day, index)?;
    item.text = text.to_string();
    item.done = done;
    Ok(())
}

pub fn delete_item(
    collection: &mut Collection,
    day: DayKey,
    index: usize,
) -> Result<TodoItem, DaybookError> {
    check_index(collection, day, index)?;
    Ok(get_or_create(collection, day).todos.remove(index))
}

/// Replaces the day's list with the non-empty items, trimmed. Returns how
/// many were kept.
pub fn save_day(collection: &mut Collection, day: DayKey, items: Vec<TodoItem>) -> usize {
    let cleaned = clean(items);
    let kept = cleaned.len();
    get_or_create(collection, day).todos = cleaned;
    kept
}

/// Drops the day's done items. Returns how many were removed.
pub fn clear_done(collection: &mut Collection, day: DayKey) -> usize {
    let todos = &mut get_or_create(collection, day).todos;
    let before = todos.len();
    todos.retain(|item| !item.done);
    before - todos.len()
}

/// Turns an undated list (JSON array of items, legacy text, or a day record)
/// into todo items through the normaliser.
pub fn items_from_value(value: JsonValue) -> Vec<TodoItem> {
    let value = match value {
        JsonValue::Array(items) => serde_json::json!({ "todos": items }),
        other => other,
    };
    schema::to_record(value).0.todos
}

pub fn apply(
    collection: &mut Collection,
    day: DayKey,
    command: DayCommand,
) -> Result<Applied, DaybookError> {
    let effect = match command {
        DayCommand::Add { text } => {
            add_item(collection, day, &text)?;
            Effect::Persist
        }
        DayCommand::SetItem { index, text, done } => {
            set_item(collection, day, index, &text, done)?;
            Effect::Deferred
        }
        DayCommand::Toggle { index, done } => {
            let item = item_mut(collection, day, index)?;
            item.done = done.unwrap_or(!item.done);
            Effect::Persist
        }
        DayCommand::EditText { index, text } => {
            item_mut(collection, day, index)?.text = text;
            Effect::Deferred
        }
        DayCommand::Delete { index } => {
            delete_item(collection, day, index)?;
            Effect::Persist
        }
        DayCommand::Save { items } => {
            let items = match items {
                Some(items) => items,
                None => get_or_create(collection, day).todos.clone(),
            };
            save_day(collection, day, items);
            Effect::Persist
        }
        DayCommand::Import { items } => {
            let mut imported = clean(items);
            if imported.is_empty() {
                return Err(DaybookError::EmptyInput);
            }
            get_or_create(collection, day).todos.append(&mut imported);
            Effect::Persist
        }
        DayCommand::ClearDone => {
            clear_done(collection, day);
            Effect::Persist
        }
    };
    Ok(Applied {
        day,
        effect,
        todos: get_or_create(collection, day).todos.clone(),
    })
}

pub fn run_day_cli(
    planner: &mut Planner,
    cli: DayCli,
    format: OutputFormat,
) -> Result<(), DaybookError> {
    let (cmd, result) = match &cli {
        DayCli::Show { date } => {
            let day = planner.day_arg(date.as_deref())?;
            let todos = planner.get_day(day);
            let out = time::command_envelope(
                "day.show",
                "ok",
                serde_json::json!({
                    "day": day,
                    "todos": todos,
                    "last_saved_at": planner.collection().last_saved_at(),
                }),
            );
            return match format {
                OutputFormat::Json => output::print_json(&out),
                OutputFormat::Text => {
                    tui::print_day(day, &todos, planner.collection().last_saved_at());
                    Ok(())
                }
            };
        }
        DayCli::Add { text, date } => {
            let day = planner.day_arg(date.as_deref())?;
            ("day.add", planner.add_todo(day, text))
        }
        DayCli::Toggle { index, done, date } => {
            let day = planner.day_arg(date.as_deref())?;
            ("day.toggle", planner.toggle_todo(day, *index, *done))
        }
        DayCli::Edit { index, text, date } => {
            let day = planner.day_arg(date.as_deref())?;
            let result = planner
                .edit_todo_text(day, *index, text)
                .and_then(|_| planner.save_day(day, None));
            ("day.edit", result)
        }
        DayCli::Delete { index, date } => {
            let day = planner.day_arg(date.as_deref())?;
            ("day.delete", planner.delete_todo(day, *index))
        }
        DayCli::Save { date } => {
            let day = planner.day_arg(date.as_deref())?;
            ("day.save", planner.save_day(day, None))
        }
        DayCli::ClearDone { date } => {
            let day = planner.day_arg(date.as_deref())?;
            ("day.clear_done", planner.clear_done(day))
        }
        DayCli::Import { source, date } => {
            let day = planner.day_arg(date.as_deref())?;
            let content =
                fs::read_to_string(source).map_err(|e| DaybookError::storage(source, e))?;
            let value = serde_json::from_str::<JsonValue>(&content)
                .unwrap_or(JsonValue::String(content));
            ("day.import", planner.import(day, value))
        }
    };

    let applied = match result {
        Ok(applied) => applied,
        Err(e) if e.is_validation() => {
            match format {
                OutputFormat::Json => output::print_json(&time::command_envelope(
                    cmd,
                    "rejected",
                    serde_json::json!({ "reason": e.to_string() }),
                ))?,
                OutputFormat::Text => {
                    tui::render_box("Nothing to add", "Type some text first.", BoxStyle::Warning)
                }
            }
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    match format {
        OutputFormat::Json => output::print_json(&time::command_envelope(
            cmd,
            "ok",
            serde_json::to_value(&applied)?,
        )),
        OutputFormat::Text => {
            if matches!(cli, DayCli::ClearDone { .. }) {
                println!("{} Cleared done items on {}.", "✓".bright_green(), applied.day);
            }
            if matches!(cli, DayCli::Save { .. } | DayCli::Edit { .. }) {
                println!("{} Saved {}.", "✓".bright_green(), applied.day);
            }
            tui::print_day(
                applied.day,
                &applied.todos,
                planner.collection().last_saved_at(),
            );
            Ok(())
        }
    }
}

fn clean(items: Vec<TodoItem>) -> Vec<TodoItem> {
    items
        .into_iter()
        .filter(TodoItem::has_content)
        .map(|mut item| {
            item.text = item.text.trim().to_string();
            item
        })
        .collect()
}

fn check_index(collection: &Collection, day: DayKey, index: usize) -> Result<(), DaybookError> {
    let len = collection.day(&day).map_or(0, |record| record.todos.len());
    if index >= len {
        return Err(DaybookError::InvariantViolation {
            day: day.to_string(),
            index,
            len,
        });
    }
    Ok(())
}

fn item_mut(
    collection: &mut Collection,
    day: DayKey,
    index: usize,
) -> Result<&mut TodoItem, DaybookError> {
    check_index(collection, day, index)?;
    Ok(&mut get_or_create(collection, day).todos[index])
}
