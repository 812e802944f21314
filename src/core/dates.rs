//! Date resolution for calendar selections.
//!
//! The month widget reports a click either as a bare date (`2026-02-20`) or
//! as a UTC-anchored timestamp (`2026-02-19T16:00:00.000Z`) depending on its
//! version and locale. Truncating the latter to ten characters picks the
//! wrong day for anyone east of UTC near midnight, so every selection is
//! funnelled through [`resolve`], which converts zoned instants into the
//! configured zone before taking the calendar date.

use crate::core::model::DayKey;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(.*)$").expect("date prefix pattern")
});

static TIME_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[T ]\d{1,2}:\d{2}").expect("time component pattern"));

/// Trailing UTC designator or numeric offset (`Z`, `+08`, `+0800`, `+08:00`).
static OFFSET_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[Zz]|([+-]\d{2}):?(\d{2})?)$").expect("offset suffix pattern")
});

const ZONED_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const LOCAL_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// A date as handed over by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDate {
    /// Anything stringly: bare date, naive or zoned timestamp.
    Text(String),
    /// A plain calendar date.
    Date(NaiveDate),
    /// A wall-clock timestamp with no zone; taken as already local.
    Local(NaiveDateTime),
    /// An instant with a known offset; converted before use.
    Zoned(DateTime<FixedOffset>),
    /// Milliseconds since the unix epoch (JavaScript `Date.valueOf()`).
    EpochMillis(i64),
}

impl From<&str> for RawDate {
    fn from(s: &str) -> Self {
        RawDate::Text(s.to_string())
    }
}

impl From<NaiveDate> for RawDate {
    fn from(d: NaiveDate) -> Self {
        RawDate::Date(d)
    }
}

impl From<NaiveDateTime> for RawDate {
    fn from(dt: NaiveDateTime) -> Self {
        RawDate::Local(dt)
    }
}

impl<Z: TimeZone> From<DateTime<Z>> for RawDate {
    fn from(dt: DateTime<Z>) -> Self {
        RawDate::Zoned(dt.fixed_offset())
    }
}

/// Canonical calendar day for `raw` in `tz`, or `None` when it holds no
/// recognisable date.
pub fn resolve(raw: &RawDate, tz: Tz) -> Option<DayKey> {
    match raw {
        RawDate::Text(s) => resolve_text(s, tz),
        RawDate::Date(d) => Some(DayKey::new(*d)),
        RawDate::Local(dt) => Some(DayKey::new(dt.date())),
        RawDate::Zoned(dt) => Some(day_in_zone(dt, tz)),
        RawDate::EpochMillis(ms) => Utc
            .timestamp_millis_opt(*ms)
            .single()
            .map(|dt| day_in_zone(&dt, tz)),
    }
}

/// Resolves a string selection.
///
/// A string that is only a date, or a date followed by something other than
/// a time, resolves to its first ten characters. A string carrying a time is
/// parsed in full: with an offset it is converted into `tz`, without one it is
/// taken as local wall-clock time. A timestamp that cannot be parsed is
/// rejected rather than truncated.
pub fn resolve_text(s: &str, tz: Tz) -> Option<DayKey> {
    let s = s.trim();
    let caps = DATE_PREFIX.captures(s)?;
    let date_part = caps.get(1)?.as_str();
    let rest = caps.get(2).map_or("", |m| m.as_str());

    if !TIME_COMPONENT.is_match(rest) {
        return date_part.parse().ok();
    }

    if let Some(dt) = parse_zoned(s) {
        return Some(day_in_zone(&dt, tz));
    }
    if let Some(dt) = parse_local(s) {
        return Some(DayKey::new(dt.date()));
    }
    tracing::debug!(raw = s, "timestamp with unparseable time component");
    None
}

/// Extracts the clicked day from a calendar widget state payload.
///
/// Accepts the widget's `{"dateClick": {"date": ..}}` and
/// `{"select": {"start": ..}}` shapes (in that order), a bare string, or an
/// epoch-milliseconds number.
pub fn resolve_clicked_date(payload: &JsonValue, tz: Tz) -> Option<DayKey> {
    let raw = match payload {
        JsonValue::Object(_) => payload
            .get("dateClick")
            .and_then(|click| click.get("date"))
            .filter(|v| is_present(v))
            .or_else(|| {
                payload
                    .get("select")
                    .and_then(|sel| sel.get("start"))
                    .filter(|v| is_present(v))
            })?,
        other => other,
    };
    let resolved = match raw {
        JsonValue::String(s) => resolve_text(s, tz),
        JsonValue::Number(n) => n.as_i64().and_then(|ms| resolve(&RawDate::EpochMillis(ms), tz)),
        _ => None,
    };
    if resolved.is_none() {
        tracing::debug!(payload = %payload, "no recognisable date in selection");
    }
    resolved
}

fn is_present(v: &JsonValue) -> bool {
    match v {
        JsonValue::Null => false,
        JsonValue::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn parse_zoned(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = with_full_offset(s)?;
    DateTime::parse_from_rfc3339(&s).ok().or_else(|| {
        ZONED_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(&s, fmt).ok())
    })
}

/// Rewrites the trailing offset as `±HH:MM`; `None` when there is none.
fn with_full_offset(s: &str) -> Option<String> {
    let caps = OFFSET_SUFFIX.captures(s)?;
    let whole = caps.get(0)?;
    let offset = match caps.get(1) {
        None => "+00:00".to_string(),
        Some(hours) => format!(
            "{}:{}",
            hours.as_str(),
            caps.get(2).map_or("00", |m| m.as_str())
        ),
    };
    Some(format!("{}{}", &s[..whole.start()], offset))
}

fn parse_local(s: &str) -> Option<NaiveDateTime> {
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn day_in_zone<Z: TimeZone>(dt: &DateTime<Z>, tz: Tz) -> DayKey {
    DayKey::new(dt.with_timezone(&tz).date_naive())
}
