// SQLite persistence for draw annotations and UI preferences.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A free-text note attached to one draw under one zone group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub draw_date: NaiveDate,
    pub group: String,
    pub note: String,
    pub updated_at: String,
}

/// Storage for annotations. Kept as a trait so the display layer can run
/// against an in-memory or no-op store.
pub trait AnnotationStore: Send + Sync {
    /// Insert or replace the note for `(date, group)`. An empty (or blank)
    /// note removes it.
    fn put(&self, date: NaiveDate, group: &str, note: &str) -> Result<()>;

    fn remove(&self, date: NaiveDate, group: &str) -> Result<()>;

    /// All annotations whose draw date is one of `dates`, ordered by date
    /// (newest first) then group.
    fn load_for_dates(&self, dates: &[NaiveDate]) -> Result<Vec<Annotation>>;
}

/// SQLite-backed annotation store plus a key-value table for app state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS annotations (
                draw_date  TEXT NOT NULL,
                group_name TEXT NOT NULL,
                note       TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (draw_date, group_name)
            );

            CREATE TABLE IF NOT EXISTS app_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Persist an arbitrary JSON value under `key`, replacing any previous
    /// value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM app_state WHERE key = ?1")
            .context("failed to prepare load_state query")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query app state")?;

        match rows.next() {
            Some(row_result) => {
                let json_str = row_result.context("failed to read state row")?;
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize state value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

impl AnnotationStore for Database {
    fn put(&self, date: NaiveDate, group: &str, note: &str) -> Result<()> {
        let note = note.trim();
        if note.is_empty() {
            return self.remove(date, group);
        }
        let conn = self.conn();
        conn.execute(
            "INSERT OR REPLACE INTO annotations (draw_date, group_name, note)
             VALUES (?1, ?2, ?3)",
            params![date.format(DATE_FORMAT).to_string(), group, note],
        )
        .context("failed to save annotation")?;
        Ok(())
    }

    fn remove(&self, date: NaiveDate, group: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM annotations WHERE draw_date = ?1 AND group_name = ?2",
            params![date.format(DATE_FORMAT).to_string(), group],
        )
        .context("failed to remove annotation")?;
        Ok(())
    }

    fn load_for_dates(&self, dates: &[NaiveDate]) -> Result<Vec<Annotation>> {
        let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
            return Ok(Vec::new());
        };
        let wanted: HashSet<NaiveDate> = dates.iter().copied().collect();

        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT draw_date, group_name, note, updated_at FROM annotations
                 WHERE draw_date BETWEEN ?1 AND ?2
                 ORDER BY draw_date DESC, group_name",
            )
            .context("failed to prepare load_for_dates query")?;

        let rows = stmt
            .query_map(
                params![
                    min.format(DATE_FORMAT).to_string(),
                    max.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .context("failed to query annotations")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map annotation rows")?;

        let mut annotations = Vec::with_capacity(rows.len());
        for (raw_date, group, note, updated_at) in rows {
            let draw_date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)
                .with_context(|| format!("bad annotation date `{raw_date}`"))?;
            if wanted.contains(&draw_date) {
                annotations.push(Annotation {
                    draw_date,
                    group,
                    note,
                    updated_at,
                });
            }
        }
        Ok(annotations)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"annotations".to_string()));
        assert!(tables.contains(&"app_state".to_string()));
    }

    #[test]
    fn put_and_load_annotations() {
        let db = test_db();
        db.put(ymd(2024, 1, 2), "A", "hot streak").unwrap();
        db.put(ymd(2024, 1, 2), "B", "odd ones").unwrap();
        db.put(ymd(2024, 1, 5), "A", "later").unwrap();

        let loaded = db
            .load_for_dates(&[ymd(2024, 1, 2), ymd(2024, 1, 5)])
            .unwrap();
        let keys: Vec<(NaiveDate, &str)> = loaded
            .iter()
            .map(|a| (a.draw_date, a.group.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![(ymd(2024, 1, 5), "A"), (ymd(2024, 1, 2), "A"), (ymd(2024, 1, 2), "B")]
        );
        assert!(!loaded[0].updated_at.is_empty());
    }

    #[test]
    fn load_for_dates_excludes_dates_inside_range_but_not_requested() {
        let db = test_db();
        db.put(ymd(2024, 1, 2), "A", "x").unwrap();
        db.put(ymd(2024, 1, 3), "A", "y").unwrap();
        db.put(ymd(2024, 1, 4), "A", "z").unwrap();

        let loaded = db.load_for_dates(&[ymd(2024, 1, 2), ymd(2024, 1, 4)]).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|a| a.draw_date != ymd(2024, 1, 3)));
    }

    #[test]
    fn load_for_no_dates_is_empty() {
        let db = test_db();
        db.put(ymd(2024, 1, 2), "A", "x").unwrap();
        assert!(db.load_for_dates(&[]).unwrap().is_empty());
    }

    #[test]
    fn put_replaces_and_blank_note_removes() {
        let db = test_db();
        let date = ymd(2024, 3, 1);
        db.put(date, "C", "first").unwrap();
        db.put(date, "C", "second").unwrap();
        let loaded = db.load_for_dates(&[date]).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].note, "second");

        db.put(date, "C", "   ").unwrap();
        assert!(db.load_for_dates(&[date]).unwrap().is_empty());
    }

    #[test]
    fn remove_missing_annotation_is_ok() {
        let db = test_db();
        db.remove(ymd(2024, 3, 1), "A").unwrap();
    }

    #[test]
    fn save_and_load_state_round_trip() {
        let db = test_db();
        let value = json!({"period": "lottery_2024.json", "group": "New-A"});
        db.save_state("last_view", &value).unwrap();
        assert_eq!(db.load_state("last_view").unwrap(), Some(value));
    }

    #[test]
    fn load_state_returns_none_for_missing_key() {
        assert!(test_db().load_state("nonexistent").unwrap().is_none());
    }

    #[test]
    fn save_state_overwrites_previous_value() {
        let db = test_db();
        db.save_state("key", &json!(1)).unwrap();
        db.save_state("key", &json!(2)).unwrap();
        assert_eq!(db.load_state("key").unwrap(), Some(json!(2)));
    }

    #[test]
    fn open_creates_parent_directory() {
        let tmp = std::env::temp_dir().join("drawzone_db_parent");
        let _ = std::fs::remove_dir_all(&tmp);
        let path = tmp.join("nested/drawzone.db");
        let db = Database::open(&path).unwrap();
        db.put(ymd(2024, 1, 1), "A", "persisted").unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.load_for_dates(&[ymd(2024, 1, 1)]).unwrap().len(), 1);
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
