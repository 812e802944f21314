use daybook::core::config::{Config, DEFAULT_MARKER_TITLE, Overrides};
use daybook::core::dates::{self, RawDate};
use daybook::core::error::DaybookError;
use daybook::core::model::{DayKey, DayRecord};
use daybook::core::schema::{self, Normalization};
use daybook::core::store::{self, Store};
use daybook::core::time;
use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Shanghai;
use serde_json::{Value, json};
use std::fs;
use tempfile::tempdir;

#[test]
fn day_keys_are_strict_and_ordered() {
    let a: DayKey = "2025-12-31".parse().unwrap();
    let b: DayKey = "2026-01-01".parse().unwrap();
    assert!(a < b);
    assert_eq!(b.to_string(), "2026-01-01");

    for bad in ["2026-1-01", "2026-02-30", "20260101", "2026-01-01T00:00", "_meta", ""] {
        assert!(bad.parse::<DayKey>().is_err(), "{bad} should not parse");
    }
}

#[test]
fn normaliser_handles_every_generation() {
    let mut legacy = json!("- 买菜\n- 交电费");
    assert_eq!(schema::normalize(&mut legacy), Normalization::MigratedText);
    assert_eq!(
        legacy,
        json!({"todos": [{"text": "买菜", "done": false}, {"text": "交电费", "done": false}]})
    );

    let mut missing = json!({"note": "kept"});
    assert_eq!(schema::normalize(&mut missing), Normalization::Repaired);
    assert_eq!(missing, json!({"note": "kept", "todos": []}));

    let mut junk = json!(42);
    assert_eq!(schema::normalize(&mut junk), Normalization::Reset);
    assert_eq!(junk, json!({"todos": []}));

    let mut canonical = json!({"todos": [{"text": "ok", "done": true, "id": 7}]});
    let before = canonical.clone();
    assert_eq!(schema::normalize(&mut canonical), Normalization::Unchanged);
    assert_eq!(canonical, before);
}

#[test]
fn normaliser_is_idempotent() {
    let inputs = [
        json!("• one\r\n\n  -two  "),
        json!({"todos": "nope"}),
        json!({"todos": [null, "x", {"text": 5, "done": "yes"}]}),
        json!(null),
        json!([1, 2]),
    ];
    for mut value in inputs {
        schema::normalize(&mut value);
        let once = value.clone();
        assert_eq!(schema::normalize(&mut value), Normalization::Unchanged);
        assert_eq!(value, once);
        serde_json::from_value::<DayRecord>(value).unwrap();
    }
}

#[test]
fn legacy_text_strips_a_single_bullet() {
    assert_eq!(schema::parse_legacy_text("--x"), vec!["-x"]);
    assert_eq!(schema::parse_legacy_text("•  y "), vec!["y"]);
    assert!(schema::parse_legacy_text(" \n - \n").is_empty());
}

#[test]
fn foreign_and_reserved_keys_survive_a_load_save_cycle() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("calendar.json");
    fs::write(
        &path,
        r#"{"2026-02-20": {"todos": [], "color": "red"},
            "settings": {"theme": "dark"},
            "_meta": {"last_saved_at": "2026-02-20 08:00:00", "device": "phone"}}"#,
    )
    .unwrap();

    let store = Store::new(&path);
    let c = store.load().unwrap();
    assert_eq!(c.last_saved_at(), Some("2026-02-20 08:00:00"));
    store.save(&c).unwrap();

    let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["settings"], json!({"theme": "dark"}));
    assert_eq!(raw["_meta"]["device"], "phone");
    assert_eq!(raw["2026-02-20"]["color"], "red");
}

#[test]
fn collection_from_map_counts_migrations() {
    let map = json!({
        "2026-02-20": "a\nb",
        "2026-02-21": {"todos": []},
        "2026-02-22": 3,
        "_meta": {}
    });
    let loaded = store::collection_from_map(map.as_object().unwrap().clone());
    assert_eq!(loaded.migrated, 2);
    assert!(loaded.needs_write());
    assert_eq!(loaded.collection.len(), 3);
}

#[test]
fn date_resolution_respects_the_zone() {
    let d = |s: &str| dates::resolve_text(s, Shanghai).map(|k| k.to_string());
    assert_eq!(d("2026-02-20").as_deref(), Some("2026-02-20"));
    assert_eq!(d("2026-02-20 (Fri)").as_deref(), Some("2026-02-20"));
    assert_eq!(d("2026-02-19T16:00:00.000Z").as_deref(), Some("2026-02-20"));
    assert_eq!(d("2026-02-19T15:59:59Z").as_deref(), Some("2026-02-19"));
    assert_eq!(d("2026-02-19T23:30:00").as_deref(), Some("2026-02-19"));
    assert_eq!(d("2026-02-19T23:30:00-05:00").as_deref(), Some("2026-02-20"));
    assert_eq!(d("2026-02-19T25:00:00Z"), None);
    assert_eq!(d("tomorrow"), None);

    let ms = Utc.with_ymd_and_hms(2026, 2, 19, 16, 0, 0).unwrap().timestamp_millis();
    assert_eq!(
        dates::resolve(&RawDate::EpochMillis(ms), Shanghai).unwrap().to_string(),
        "2026-02-20"
    );
    let date = NaiveDate::from_ymd_opt(2026, 2, 19).unwrap();
    assert_eq!(
        dates::resolve(&RawDate::from(date), Shanghai).unwrap().to_string(),
        "2026-02-19"
    );
    let zoned = Utc.with_ymd_and_hms(2026, 2, 19, 16, 0, 0).unwrap();
    assert_eq!(
        dates::resolve(&RawDate::from(zoned), Shanghai).unwrap().to_string(),
        "2026-02-20"
    );
}

#[test]
fn widget_payload_prefers_date_click() {
    let payload = json!({
        "dateClick": {"date": "2026-02-01"},
        "select": {"start": "2026-03-01"}
    });
    assert_eq!(
        dates::resolve_clicked_date(&payload, Shanghai).unwrap().to_string(),
        "2026-02-01"
    );
    let fallback = json!({"dateClick": {"date": null}, "select": {"start": "2026-03-01"}});
    assert_eq!(
        dates::resolve_clicked_date(&fallback, Shanghai).unwrap().to_string(),
        "2026-03-01"
    );
    assert!(dates::resolve_clicked_date(&json!({}), Shanghai).is_none());
    assert!(dates::resolve_clicked_date(&json!(true), Shanghai).is_none());
}

#[test]
fn config_precedence_file_then_flags() {
    let tmp = tempdir().unwrap();
    let cfg = tmp.path().join("daybook.toml");
    fs::write(
        &cfg,
        "time_zone = \"Europe/Berlin\"\ndata_file = \"data/plan.json\"\n",
    )
    .unwrap();

    let from_file = Config::resolve(
        tmp.path(),
        &Overrides {
            config_path: Some(cfg.clone()),
            ..Overrides::default()
        },
    )
    .unwrap();
    assert_eq!(from_file.time_zone, "Europe/Berlin");
    assert_eq!(from_file.data_file, tmp.path().join("data/plan.json"));
    assert_eq!(from_file.marker_title, DEFAULT_MARKER_TITLE);

    let flagged = Config::resolve(
        tmp.path(),
        &Overrides {
            config_path: Some(cfg),
            data_file: Some("other.json".into()),
            time_zone: Some("UTC".into()),
        },
    )
    .unwrap();
    assert_eq!(flagged.time_zone, "UTC");
    assert_eq!(flagged.data_file, tmp.path().join("other.json"));
}

#[test]
fn config_rejects_bad_zones_and_unknown_keys() {
    assert!(matches!(
        Config::from_toml("time_zone = \"Mars/Olympus\""),
        Err(DaybookError::InvalidTimeZone(_))
    ));
    assert!(Config::from_toml("colour = \"red\"").is_err());

    let tmp = tempdir().unwrap();
    let missing = Config::resolve(
        tmp.path(),
        &Overrides {
            config_path: Some(tmp.path().join("nope.toml")),
            ..Overrides::default()
        },
    );
    assert!(matches!(missing, Err(DaybookError::ConfigError(_))));
}

#[test]
fn save_stamp_uses_wall_clock_of_the_zone() {
    let now = Utc.with_ymd_and_hms(2026, 2, 19, 16, 30, 5).unwrap();
    assert_eq!(time::saved_at_stamp(now, Shanghai), "2026-02-20 00:30:05");
    assert_eq!(time::today_in(now, chrono_tz::UTC).to_string(), "2026-02-19");
}
