//! Month-grid projection.
//!
//! The grid only needs to know which days have something on them. Markers are
//! recomputed from the whole collection on every render; the collection is
//! bounded by the number of days ever used, so there is no index to maintain.

use crate::core::dates;
use crate::core::error::DaybookError;
use crate::core::model::{Collection, DayKey};
use crate::core::output::{self, OutputFormat};
use crate::core::planner::Planner;
use crate::core::time;
use chrono::{Datelike, NaiveDate};
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Subcommand, Debug)]
pub enum CalendarCli {
    /// Draw a month grid with a marker on every day that has todos.
    Month {
        /// Month to draw (YYYY-MM); defaults to the month of --date.
        #[clap(long)]
        month: Option<String>,
        /// Day to highlight; defaults to today.
        #[clap(long)]
        date: Option<String>,
    },
    /// Print the marker list fed to the calendar widget.
    Events,
    /// Resolve a raw widget selection (string or JSON payload) to a day.
    Select {
        #[clap(value_name = "PAYLOAD")]
        payload: String,
        /// Day to keep when the payload holds no recognisable date.
        #[clap(long)]
        date: Option<String>,
    },
}

/// One entry of the widget's event list. Serialised in the widget's own
/// event shape (`start`, `allDay`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub title: String,
    #[serde(rename = "start")]
    pub date: DayKey,
    #[serde(rename = "allDay")]
    pub all_day: bool,
}

/// Presence flag for one cell of a month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayMarker {
    pub date: DayKey,
    pub has_content: bool,
}

/// One marker per day holding at least one todo with text, done or not.
pub fn project(collection: &Collection, title: &str) -> Vec<Marker> {
    collection
        .days()
        .filter(|(_, record)| record.has_content())
        .map(|(day, _)| Marker {
            title: title.to_string(),
            date: *day,
            all_day: true,
        })
        .collect()
}

/// Every day of `year`-`month` with its presence flag.
pub fn month_markers(
    collection: &Collection,
    year: i32,
    month: u32,
) -> Result<Vec<DayMarker>, DaybookError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DaybookError::InvalidDate(format!("{year:04}-{month:02}")))?;
    Ok(first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|d| {
            let date = DayKey::new(d);
            DayMarker {
                date,
                has_content: collection.day(&date).is_some_and(|r| r.has_content()),
            }
        })
        .collect())
}

/// Parses `YYYY-MM`.
pub fn parse_month(s: &str) -> Result<(i32, u32), DaybookError> {
    let invalid = || DaybookError::InvalidDate(s.to_string());
    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    Ok((year, month))
}

/// Monday-first text grid. Days with content carry `glyph`; the selected day
/// is bracketed.
pub fn render_month(markers: &[DayMarker], selected: Option<DayKey>, glyph: &str) -> String {
    let Some(first) = markers.first() else {
        return String::new();
    };
    let first_date = first.date.date();
    let mut out = format!("{}\n", first_date.format("%B %Y"));
    out.push_str(" Mo   Tu   We   Th   Fr   Sa   Su\n");

    let lead = first_date.weekday().num_days_from_monday() as usize;
    let mut cells: Vec<String> = vec!["     ".to_string(); lead];
    for marker in markers {
        let day = marker.date.date().day();
        let mark = if marker.has_content { glyph } else { " " };
        let cell = if Some(marker.date) == selected {
            format!("[{day:>2}]{mark}")
        } else {
            format!(" {day:>2} {mark}")
        };
        cells.push(cell);
    }

    for week in cells.chunks(7) {
        out.push_str(week.join("").trim_end());
        out.push('\n');
    }
    out
}

pub fn run_calendar_cli(
    planner: &mut Planner,
    cli: CalendarCli,
    format: OutputFormat,
) -> Result<(), DaybookError> {
    match cli {
        CalendarCli::Month { month, date } => {
            let selected = planner.day_arg(date.as_deref())?;
            let (year, month) = match month {
                Some(m) => parse_month(&m)?,
                None => (selected.year(), selected.month()),
            };
            let markers = planner.month_markers(year, month)?;
            match format {
                OutputFormat::Json => output::print_json(&time::command_envelope(
                    "calendar.month",
                    "ok",
                    serde_json::json!({
                        "month": format!("{year:04}-{month:02}"),
                        "selected": selected,
                        "days": markers,
                    }),
                )),
                OutputFormat::Text => {
                    print!("{}", render_month(&markers, Some(selected), planner.marker_title()));
                    Ok(())
                }
            }
        }
        CalendarCli::Events => {
            let events = planner.events();
            match format {
                OutputFormat::Json => output::print_json(&serde_json::to_value(&events)?),
                OutputFormat::Text => {
                    for event in &events {
                        println!("{} {}", event.date, event.title);
                    }
                    Ok(())
                }
            }
        }
        CalendarCli::Select { payload, date } => {
            let previous = planner.day_arg(date.as_deref())?;
            planner.select(previous);
            let value = serde_json::from_str::<JsonValue>(&payload)
                .unwrap_or(JsonValue::String(payload));
            let resolved = dates::resolve_clicked_date(&value, planner.tz());
            if let Some(day) = resolved {
                planner.select(day);
            }
            let picked = planner.selected();
            tracing::debug!(%previous, %picked, "resolved widget selection");
            match format {
                OutputFormat::Json => output::print_json(&time::command_envelope(
                    "calendar.select",
                    "ok",
                    serde_json::json!({
                        "day": picked,
                        "resolved": resolved.is_some(),
                    }),
                )),
                OutputFormat::Text => {
                    println!("{picked}");
                    Ok(())
                }
            }
        }
    }
}
