//! The planner session: the interface the rendering layer talks to.
//!
//! A `Planner` owns the store handle, the in-memory collection and the
//! currently selected day. The collection in memory doubles as the working
//! copy: text edits land there and stay unsaved until the next persisting
//! command.
//!
//! Persisting commands run a reload-overlay-save cycle: the file is read
//! again, this session's copy of the touched day replaces the on-disk one,
//! `_meta.last_saved_at` is stamped and the result is written atomically.
//! Days edited elsewhere in the meantime are kept as they are on disk. Days
//! holding deferred text edits from this session ride along with the commit,
//! so a pending edit is never dropped by a save on another day.

use crate::core::config::Config;
use crate::core::dates::{self, RawDate};
use crate::core::error::DaybookError;
use crate::core::model::{Collection, DayKey, TodoItem};
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::calendar::{self, DayMarker, Marker};
use crate::plugins::day::{self, Applied, DayCommand, Effect};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;

pub type Clock = fn() -> DateTime<Utc>;

pub struct Planner {
    store: Store,
    tz: Tz,
    marker_title: String,
    collection: Collection,
    selected: DayKey,
    clock: Clock,
    /// Days with deferred edits not yet written.
    unsaved: BTreeSet<DayKey>,
    /// Entries migrated when the file was opened, not yet reported.
    migrated_on_open: usize,
}

impl Planner {
    pub fn open(config: &Config) -> Result<Self, DaybookError> {
        let mut planner = Planner::open_store(Store::new(&config.data_file), config.tz()?)?;
        planner.marker_title = config.marker_title.clone();
        Ok(planner)
    }

    /// Loads the store and writes migrated entries back once, without
    /// stamping `_meta` (a read is not an edit).
    pub fn open_store(store: Store, tz: Tz) -> Result<Self, DaybookError> {
        Planner::open_with_clock(store, tz, Utc::now)
    }

    pub fn open_with_clock(store: Store, tz: Tz, clock: Clock) -> Result<Self, DaybookError> {
        let loaded = store.load_normalized()?;
        if loaded.needs_write() {
            tracing::info!(
                path = %store.path.display(),
                migrated = loaded.migrated,
                "writing back migrated day entries"
            );
            store.save(&loaded.collection)?;
        }
        Ok(Planner {
            selected: time::today_in(clock(), tz),
            store,
            tz,
            marker_title: crate::core::config::DEFAULT_MARKER_TITLE.to_string(),
            collection: loaded.collection,
            clock,
            unsaved: BTreeSet::new(),
            migrated_on_open: loaded.migrated,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn today(&self) -> DayKey {
        time::today_in((self.clock)(), self.tz)
    }

    pub fn selected(&self) -> DayKey {
        self.selected
    }

    pub fn select(&mut self, day: DayKey) {
        self.selected = day;
    }

    /// Interprets a `--date` argument: absent means today, otherwise a day
    /// key or anything date resolution understands.
    pub fn day_arg(&self, arg: Option<&str>) -> Result<DayKey, DaybookError> {
        match arg {
            None => Ok(self.today()),
            Some(raw) => raw
                .parse()
                .ok()
                .or_else(|| dates::resolve_text(raw, self.tz))
                .ok_or_else(|| DaybookError::InvalidDate(raw.to_string())),
        }
    }

    /// Feeds a widget click through date resolution. An unresolvable payload
    /// keeps the current selection.
    pub fn on_date_selected(&mut self, payload: &JsonValue) -> DayKey {
        if let Some(day) = dates::resolve_clicked_date(payload, self.tz) {
            self.selected = day;
        }
        self.selected
    }

    pub fn on_raw_date(&mut self, raw: &RawDate) -> DayKey {
        if let Some(day) = dates::resolve(raw, self.tz) {
            self.selected = day;
        }
        self.selected
    }

    /// Widget event list.
    pub fn events(&self) -> Vec<Marker> {
        calendar::project(&self.collection, &self.marker_title)
    }

    pub fn month_markers(&self, year: i32, month: u32) -> Result<Vec<DayMarker>, DaybookError> {
        calendar::month_markers(&self.collection, year, month)
    }

    pub fn marker_title(&self) -> &str {
        &self.marker_title
    }

    /// The day's todos, creating the day in memory on first access.
    pub fn get_day(&mut self, day: DayKey) -> Vec<TodoItem> {
        day::get_or_create(&mut self.collection, day).todos.clone()
    }

    pub fn add_todo(&mut self, day: DayKey, text: &str) -> Result<Applied, DaybookError> {
        self.execute(
            day,
            DayCommand::Add {
                text: text.to_string(),
            },
        )
    }

    pub fn toggle_todo(
        &mut self,
        day: DayKey,
        index: usize,
        done: Option<bool>,
    ) -> Result<Applied, DaybookError> {
        self.execute(day, DayCommand::Toggle { index, done })
    }

    pub fn edit_todo_text(
        &mut self,
        day: DayKey,
        index: usize,
        text: &str,
    ) -> Result<Applied, DaybookError> {
        self.execute(
            day,
            DayCommand::EditText {
                index,
                text: text.to_string(),
            },
        )
    }

    pub fn delete_todo(&mut self, day: DayKey, index: usize) -> Result<Applied, DaybookError> {
        self.execute(day, DayCommand::Delete { index })
    }

    /// Explicit save. `None` saves the working list as it stands.
    pub fn save_day(
        &mut self,
        day: DayKey,
        items: Option<Vec<TodoItem>>,
    ) -> Result<Applied, DaybookError> {
        self.execute(day, DayCommand::Save { items })
    }

    /// Removes the day's done todos and persists.
    pub fn clear_done(&mut self, day: DayKey) -> Result<Applied, DaybookError> {
        self.execute(day, DayCommand::ClearDone)
    }

    /// Days holding edits that have not been written yet.
    pub fn unsaved_days(&self) -> impl Iterator<Item = &DayKey> {
        self.unsaved.iter()
    }

    /// Appends an undated list (see [`day::items_from_value`]) to `day`.
    pub fn import(&mut self, day: DayKey, value: JsonValue) -> Result<Applied, DaybookError> {
        let items = day::items_from_value(value);
        self.execute(day, DayCommand::Import { items })
    }

    /// Re-reads the file and writes it back if any entry was not canonical.
    /// Returns how many entries were migrated, including those already
    /// written back when this planner opened the file.
    pub fn migrate(&mut self) -> Result<usize, DaybookError> {
        let loaded = self.store.load_normalized()?;
        let migrated = loaded.migrated + std::mem::take(&mut self.migrated_on_open);
        if loaded.needs_write() {
            self.store.save(&loaded.collection)?;
        }
        self.collection = loaded.collection;
        self.unsaved.clear();
        Ok(migrated)
    }

    /// Drops unsaved edits and re-reads the file.
    pub fn reload(&mut self) -> Result<(), DaybookError> {
        self.collection = self.store.load()?;
        self.unsaved.clear();
        Ok(())
    }

    pub fn execute(&mut self, day: DayKey, command: DayCommand) -> Result<Applied, DaybookError> {
        let applied = day::apply(&mut self.collection, day, command)?;
        match applied.effect {
            Effect::Persist => self.commit(day)?,
            Effect::Deferred => {
                self.unsaved.insert(day);
            }
        }
        Ok(applied)
    }

    fn commit(&mut self, day: DayKey) -> Result<(), DaybookError> {
        let mut fresh = self.store.load()?;
        self.unsaved.insert(day);
        for touched in &self.unsaved {
            if let Some(record) = self.collection.day(touched) {
                fresh.insert_day(*touched, record.clone());
            }
        }
        fresh.stamp_saved_at(&time::saved_at_stamp((self.clock)(), self.tz));
        self.store.save(&fresh)?;
        tracing::debug!(days = self.unsaved.len(), "committed working days");
        self.collection = fresh;
        self.unsaved.clear();
        Ok(())
    }
}
