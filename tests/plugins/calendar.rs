use daybook::core::model::DayKey;
use daybook::core::planner::Planner;
use daybook::core::store::Store;
use daybook::plugins::calendar::{self, render_month};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use tempfile::tempdir;

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 19, 16, 0, 0).unwrap()
}

fn key(s: &str) -> DayKey {
    s.parse().unwrap()
}

#[test]
fn events_follow_content_not_completion() {
    let tmp = tempdir().unwrap();
    let mut p = Planner::open_with_clock(
        Store::new(tmp.path().join("calendar.json")),
        chrono_tz::Asia::Shanghai,
        clock,
    )
    .unwrap();

    p.add_todo(key("2026-02-20"), "done already").unwrap();
    p.toggle_todo(key("2026-02-20"), 0, Some(true)).unwrap();
    p.add_todo(key("2026-02-22"), "later").unwrap();
    p.delete_todo(key("2026-02-22"), 0).unwrap();
    p.get_day(key("2026-02-23"));

    let events = p.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].date, key("2026-02-20"));
    assert_eq!(
        serde_json::to_value(&events).unwrap(),
        json!([{"title": "•", "start": "2026-02-20", "allDay": true}])
    );
}

#[test]
fn events_ignore_meta_and_foreign_keys() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("calendar.json");
    std::fs::write(
        &path,
        r#"{"notes": {"todos": [{"text": "x", "done": false}]},
            "_meta": {"last_saved_at": "2026-02-01 10:00:00"},
            "2026-02-03": {"todos": [{"text": "real", "done": false}]}}"#,
    )
    .unwrap();
    let p = Planner::open_with_clock(Store::new(&path), chrono_tz::UTC, clock).unwrap();

    let days: Vec<_> = p.events().into_iter().map(|m| m.date).collect();
    assert_eq!(days, vec![key("2026-02-03")]);
    assert!(p.collection().foreign().contains_key("notes"));
}

#[test]
fn month_view_marks_days_and_highlights_selection() {
    let tmp = tempdir().unwrap();
    let mut p = Planner::open_with_clock(
        Store::new(tmp.path().join("calendar.json")),
        chrono_tz::Asia::Shanghai,
        clock,
    )
    .unwrap();
    p.add_todo(key("2026-02-14"), "flowers").unwrap();

    let markers = p.month_markers(2026, 2).unwrap();
    assert_eq!(markers.len(), 28);
    let marked: Vec<_> = markers.iter().filter(|m| m.has_content).collect();
    assert_eq!(marked.len(), 1);
    assert_eq!(marked[0].date, key("2026-02-14"));

    let grid = render_month(&markers, Some(p.selected()), p.marker_title());
    assert!(grid.starts_with("February 2026\n"));
    assert!(grid.contains(" 14 •"));
    assert!(grid.contains("[20]"));
}

#[test]
fn clicked_dates_resolve_in_the_configured_zone() {
    let tmp = tempdir().unwrap();
    let mut p = Planner::open_with_clock(
        Store::new(tmp.path().join("calendar.json")),
        chrono_tz::Asia::Shanghai,
        clock,
    )
    .unwrap();

    let picked = p.on_date_selected(&json!({"dateClick": {"date": "2026-02-19T16:00:00.000Z"}}));
    assert_eq!(picked, key("2026-02-20"));

    let picked = p.on_date_selected(&json!({"select": {"start": "2026-03-05"}}));
    assert_eq!(picked, key("2026-03-05"));

    let kept = p.on_date_selected(&json!({"select": {"start": "2026-03-06T99:99"}}));
    assert_eq!(kept, key("2026-03-05"));
}

#[test]
fn month_argument_parsing() {
    assert_eq!(calendar::parse_month("2024-12").unwrap(), (2024, 12));
    assert!(calendar::parse_month("2024-13").is_err());
}
