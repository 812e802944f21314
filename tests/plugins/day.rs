use daybook::core::error::DaybookError;
use daybook::core::model::{Collection, DayKey, TodoItem};
use daybook::plugins::day::{
    self, DayCommand, Effect, add_item, delete_item, get_or_create, items_from_value, save_day,
    set_item,
};
use serde_json::json;

fn key(s: &str) -> DayKey {
    s.parse().unwrap()
}

fn texts(c: &Collection, d: &str) -> Vec<String> {
    c.day(&key(d))
        .unwrap()
        .todos
        .iter()
        .map(|t| t.text.clone())
        .collect()
}

#[test]
fn test_day_lifecycle() {
    let mut c = Collection::new();
    let d = key("2026-02-20");

    // 1. First access creates an empty day
    assert!(get_or_create(&mut c, d).todos.is_empty());
    assert_eq!(c.len(), 1);

    // 2. Add trims and appends
    assert_eq!(add_item(&mut c, d, "  买菜 ").unwrap(), 0);
    assert_eq!(add_item(&mut c, d, "交电费").unwrap(), 1);
    assert_eq!(texts(&c, "2026-02-20"), vec!["买菜", "交电费"]);

    // 3. Set keeps text verbatim
    set_item(&mut c, d, 1, " 交电费 ", true).unwrap();
    let item = &c.day(&d).unwrap().todos[1];
    assert_eq!(item.text, " 交电费 ");
    assert!(item.done);

    // 4. Delete returns the removed item
    let removed = delete_item(&mut c, d, 0).unwrap();
    assert_eq!(removed.text, "买菜");
    assert_eq!(c.day(&d).unwrap().todos.len(), 1);
}

#[test]
fn empty_add_is_rejected_without_touching_the_day() {
    let mut c = Collection::new();
    let d = key("2026-02-20");
    add_item(&mut c, d, "keep").unwrap();

    let err = add_item(&mut c, d, "   \n").unwrap_err();
    assert!(matches!(err, DaybookError::EmptyInput));
    assert!(err.is_validation());
    assert_eq!(texts(&c, "2026-02-20"), vec!["keep"]);
}

#[test]
fn out_of_range_index_is_an_invariant_violation() {
    let mut c = Collection::new();
    let d = key("2026-02-20");
    add_item(&mut c, d, "only").unwrap();

    let err = delete_item(&mut c, d, 3).unwrap_err();
    match err {
        DaybookError::InvariantViolation { day, index, len } => {
            assert_eq!(day, "2026-02-20");
            assert_eq!(index, 3);
            assert_eq!(len, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(set_item(&mut c, d, 1, "x", false).is_err());
    assert_eq!(texts(&c, "2026-02-20"), vec!["only"]);
}

#[test]
fn save_prunes_blank_items_and_keeps_extra_fields() {
    let mut c = Collection::new();
    let d = key("2026-02-20");
    let mut tagged = TodoItem::new("  call mum  ");
    tagged.extra.insert("priority".into(), json!("high"));
    let items = vec![tagged, TodoItem::new("   "), TodoItem::new("")];

    assert_eq!(save_day(&mut c, d, items), 1);
    let saved = &c.day(&d).unwrap().todos[0];
    assert_eq!(saved.text, "call mum");
    assert_eq!(saved.extra.get("priority"), Some(&json!("high")));
}

#[test]
fn effects_separate_text_edits_from_persisting_commands() {
    let mut c = Collection::new();
    let d = key("2026-02-20");

    let add = day::apply(&mut c, d, DayCommand::Add { text: "a".into() }).unwrap();
    assert_eq!(add.effect, Effect::Persist);

    let edit = day::apply(
        &mut c,
        d,
        DayCommand::EditText {
            index: 0,
            text: "a!".into(),
        },
    )
    .unwrap();
    assert_eq!(edit.effect, Effect::Deferred);
    assert_eq!(edit.todos[0].text, "a!");

    let set = day::apply(
        &mut c,
        d,
        DayCommand::SetItem {
            index: 0,
            text: "a?".into(),
            done: false,
        },
    )
    .unwrap();
    assert_eq!(set.effect, Effect::Deferred);

    let toggle = day::apply(&mut c, d, DayCommand::Toggle { index: 0, done: None }).unwrap();
    assert_eq!(toggle.effect, Effect::Persist);
    assert!(toggle.todos[0].done);
    let toggle = day::apply(&mut c, d, DayCommand::Toggle { index: 0, done: None }).unwrap();
    assert!(!toggle.todos[0].done);

    let save = day::apply(&mut c, d, DayCommand::Save { items: None }).unwrap();
    assert_eq!(save.effect, Effect::Persist);
    assert_eq!(
        serde_json::to_value(save.effect).unwrap(),
        json!("persist")
    );
}

#[test]
fn import_accepts_arrays_and_legacy_text() {
    let from_array = items_from_value(json!(["one", {"text": "two", "done": 1}, 3]));
    assert_eq!(from_array.len(), 2);
    assert_eq!(from_array[1].text, "two");
    assert!(from_array[1].done);

    let from_text = items_from_value(json!("- milk\n• eggs\n\n"));
    assert_eq!(
        from_text.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
        vec!["milk", "eggs"]
    );

    let mut c = Collection::new();
    let d = key("2026-02-20");
    add_item(&mut c, d, "existing").unwrap();
    let applied = day::apply(&mut c, d, DayCommand::Import { items: from_text }).unwrap();
    assert_eq!(applied.todos.len(), 3);
    assert_eq!(applied.todos[2].text, "eggs");

    let empty = day::apply(&mut c, d, DayCommand::Import { items: vec![] });
    assert!(matches!(empty, Err(DaybookError::EmptyInput)));
}
