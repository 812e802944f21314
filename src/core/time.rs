//! Clock helpers and the shared command envelope.
//!
//! Everything user-facing is expressed in the configured zone; the envelope
//! timestamp stays in epoch seconds so machine consumers can sort it.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value as JsonValue;
use ulid::Ulid;

use crate::core::model::DayKey;

/// Format of `_meta.last_saved_at`.
pub const SAVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    format!("{}Z", Utc::now().timestamp())
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Wall-clock stamp in `tz`, as written to `_meta.last_saved_at`.
pub fn saved_at_stamp(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz).format(SAVED_AT_FORMAT).to_string()
}

/// The calendar day `now` falls on in `tz`.
pub fn today_in(now: DateTime<Utc>, tz: Tz) -> DayKey {
    DayKey::new(now.with_timezone(&tz).date_naive())
}

/// Standard command response envelope shape used across CLI surfaces.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": "1.0.0",
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    base
}
