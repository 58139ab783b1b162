//! SQLite-backed schedule store: the engine's durable state.
//!
//! Persists one row per scheduled reminder, keyed by the identity tuple.
//! The store is authoritative for "currently scheduled" across process
//! restarts; the delivery platform is write-only from the engine's
//! perspective and never enumerated.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};

use super::data_dir;
use crate::error::{CoreError, StoreError};
use crate::notify::{EntityKind, ReminderCategory, ReminderIdentity, ScheduledEntry};

const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";

fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// Parse a stored datetime, falling back to the epoch on corruption.
/// A corrupt trigger shows up as a mismatch and heals on the next
/// reconcile pass.
fn parse_datetime_fallback(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or(NaiveDateTime::MIN)
}

fn parse_date_fallback(s: &str) -> NaiveDate {
    s.parse().unwrap_or(NaiveDate::MIN)
}

fn row_to_entry(row: &rusqlite::Row) -> Result<ScheduledEntry, rusqlite::Error> {
    let category_str: String = row.get(0)?;
    let kind_str: String = row.get(1)?;
    let trigger_str: String = row.get(4)?;
    let deadline_str: String = row.get(6)?;

    Ok(ScheduledEntry {
        identity: ReminderIdentity {
            category: ReminderCategory::parse(&category_str)
                .unwrap_or(ReminderCategory::License),
            entity_kind: EntityKind::parse(&kind_str).unwrap_or(EntityKind::License),
            entity_id: row.get(2)?,
            offset_days: row.get(3)?,
        },
        trigger_at: parse_datetime_fallback(&trigger_str),
        delivery_handle: row.get(5)?,
        deadline_snapshot: parse_date_fallback(&deadline_str),
    })
}

/// SQLite store mapping reminder identity to delivery handle and trigger.
pub struct ScheduleStore {
    conn: Connection,
}

impl ScheduleStore {
    /// Open the schedule store at `~/.config/credtrack/credtrack.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("credtrack.db");
        let conn = Connection::open(&path).map_err(|source| StoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests and dry runs).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open the store at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS scheduled_reminders (
                category          TEXT NOT NULL,
                entity_kind       TEXT NOT NULL,
                entity_id         TEXT NOT NULL,
                offset_days       INTEGER NOT NULL,
                trigger_at        TEXT NOT NULL,
                delivery_handle   TEXT NOT NULL,
                deadline_snapshot TEXT NOT NULL,
                updated_at        TEXT NOT NULL,
                PRIMARY KEY (category, entity_kind, entity_id, offset_days)
            );

            CREATE TABLE IF NOT EXISTS engine_meta (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Insert or replace the entry for its identity tuple.
    pub fn upsert(&self, entry: &ScheduledEntry) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO scheduled_reminders (
                category, entity_kind, entity_id, offset_days,
                trigger_at, delivery_handle, deadline_snapshot, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (category, entity_kind, entity_id, offset_days)
             DO UPDATE SET trigger_at = ?5, delivery_handle = ?6,
                           deadline_snapshot = ?7, updated_at = ?8",
            params![
                entry.identity.category.as_str(),
                entry.identity.entity_kind.as_str(),
                entry.identity.entity_id,
                entry.identity.offset_days,
                format_datetime(entry.trigger_at),
                entry.delivery_handle,
                entry.deadline_snapshot.to_string(),
                format_datetime(chrono::Local::now().naive_local()),
            ],
        )?;
        tracing::debug!(
            category = entry.identity.category.as_str(),
            entity = %entry.identity.entity_id,
            offset = entry.identity.offset_days,
            "upserted scheduled reminder"
        );
        Ok(())
    }

    /// Remove the entry for an identity tuple, if present.
    pub fn remove(&self, identity: &ReminderIdentity) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM scheduled_reminders
             WHERE category = ?1 AND entity_kind = ?2 AND entity_id = ?3 AND offset_days = ?4",
            params![
                identity.category.as_str(),
                identity.entity_kind.as_str(),
                identity.entity_id,
                identity.offset_days,
            ],
        )?;
        tracing::debug!(
            category = identity.category.as_str(),
            entity = %identity.entity_id,
            offset = identity.offset_days,
            "removed scheduled reminder"
        );
        Ok(())
    }

    /// Get the entry for an identity tuple.
    pub fn get(&self, identity: &ReminderIdentity) -> Result<Option<ScheduledEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT category, entity_kind, entity_id, offset_days,
                    trigger_at, delivery_handle, deadline_snapshot
             FROM scheduled_reminders
             WHERE category = ?1 AND entity_kind = ?2 AND entity_id = ?3 AND offset_days = ?4",
        )?;
        let entry = stmt
            .query_row(
                params![
                    identity.category.as_str(),
                    identity.entity_kind.as_str(),
                    identity.entity_id,
                    identity.offset_days,
                ],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// List every scheduled entry, ordered by identity.
    pub fn list_all(&self) -> Result<Vec<ScheduledEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT category, entity_kind, entity_id, offset_days,
                    trigger_at, delivery_handle, deadline_snapshot
             FROM scheduled_reminders
             ORDER BY category, entity_kind, entity_id, offset_days",
        )?;
        let entries = stmt.query_map([], row_to_entry)?;
        entries.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Number of scheduled entries.
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scheduled_reminders", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Timestamp of the last completed refresh, if any.
    pub fn last_refresh_at(&self) -> Result<Option<NaiveDateTime>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM engine_meta WHERE key = 'last_refresh_at'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.map(|s| parse_datetime_fallback(&s)))
    }

    /// Record the timestamp of a completed refresh.
    pub fn set_last_refresh_at(&self, at: NaiveDateTime) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO engine_meta (key, value) VALUES ('last_refresh_at', ?1)
             ON CONFLICT (key) DO UPDATE SET value = ?1",
            params![format_datetime(at)],
        )?;
        Ok(())
    }

    /// Whether the last completed refresh ran without schedule permission.
    ///
    /// Durable across restarts so the surrounding application can surface
    /// a degraded run even when the process that observed it is gone.
    pub fn last_run_permission_limited(&self) -> Result<bool, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM engine_meta WHERE key = 'last_run_permission_limited'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref() == Some("true"))
    }

    /// Record whether a completed refresh was permission-limited.
    pub fn set_last_run_permission_limited(&self, limited: bool) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO engine_meta (key, value) VALUES ('last_run_permission_limited', ?1)
             ON CONFLICT (key) DO UPDATE SET value = ?1",
            params![if limited { "true" } else { "false" }],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entity_id: &str, offset_days: u32, handle: &str) -> ScheduledEntry {
        ScheduledEntry {
            identity: ReminderIdentity {
                category: ReminderCategory::License,
                entity_kind: EntityKind::License,
                entity_id: entity_id.to_string(),
                offset_days,
            },
            trigger_at: "2026-09-24".parse::<NaiveDate>().unwrap().and_hms_opt(9, 0, 0).unwrap(),
            delivery_handle: handle.to_string(),
            deadline_snapshot: "2026-10-01".parse().unwrap(),
        }
    }

    #[test]
    fn upsert_and_get_round_trip() {
        let store = ScheduleStore::open_memory().unwrap();
        let e = entry("a", 7, "h-1");
        store.upsert(&e).unwrap();

        let back = store.get(&e.identity).unwrap().unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn upsert_replaces_existing_identity() {
        let store = ScheduleStore::open_memory().unwrap();
        let mut e = entry("a", 7, "h-1");
        store.upsert(&e).unwrap();

        e.delivery_handle = "h-2".to_string();
        e.deadline_snapshot = "2026-12-01".parse().unwrap();
        store.upsert(&e).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let back = store.get(&e.identity).unwrap().unwrap();
        assert_eq!(back.delivery_handle, "h-2");
        assert_eq!(back.deadline_snapshot, "2026-12-01".parse().unwrap());
    }

    #[test]
    fn remove_deletes_only_that_identity() {
        let store = ScheduleStore::open_memory().unwrap();
        let a = entry("a", 7, "h-1");
        let b = entry("a", 14, "h-2");
        store.upsert(&a).unwrap();
        store.upsert(&b).unwrap();

        store.remove(&a.identity).unwrap();
        assert!(store.get(&a.identity).unwrap().is_none());
        assert!(store.get(&b.identity).unwrap().is_some());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn removing_missing_identity_is_not_an_error() {
        let store = ScheduleStore::open_memory().unwrap();
        store.remove(&entry("ghost", 7, "h").identity).unwrap();
    }

    #[test]
    fn list_all_is_ordered_by_identity() {
        let store = ScheduleStore::open_memory().unwrap();
        store.upsert(&entry("b", 7, "h-3")).unwrap();
        store.upsert(&entry("a", 14, "h-2")).unwrap();
        store.upsert(&entry("a", 7, "h-1")).unwrap();

        let all = store.list_all().unwrap();
        let keys: Vec<(String, u32)> = all
            .iter()
            .map(|e| (e.identity.entity_id.clone(), e.identity.offset_days))
            .collect();
        assert_eq!(
            keys,
            vec![("a".to_string(), 7), ("a".to_string(), 14), ("b".to_string(), 7)]
        );
    }

    #[test]
    fn last_refresh_round_trip() {
        let store = ScheduleStore::open_memory().unwrap();
        assert!(store.last_refresh_at().unwrap().is_none());

        let at = "2026-08-29".parse::<NaiveDate>().unwrap().and_hms_opt(12, 30, 0).unwrap();
        store.set_last_refresh_at(at).unwrap();
        assert_eq!(store.last_refresh_at().unwrap(), Some(at));

        let later = at + chrono::Duration::hours(1);
        store.set_last_refresh_at(later).unwrap();
        assert_eq!(store.last_refresh_at().unwrap(), Some(later));
    }

    #[test]
    fn permission_limited_flag_round_trip() {
        let store = ScheduleStore::open_memory().unwrap();
        assert!(!store.last_run_permission_limited().unwrap());

        store.set_last_run_permission_limited(true).unwrap();
        assert!(store.last_run_permission_limited().unwrap());

        store.set_last_run_permission_limited(false).unwrap();
        assert!(!store.last_run_permission_limited().unwrap());
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credtrack.db");

        {
            let store = ScheduleStore::open_at(&path).unwrap();
            store.upsert(&entry("a", 7, "h-1")).unwrap();
        }

        let store = ScheduleStore::open_at(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        let all = store.list_all().unwrap();
        assert_eq!(all[0].delivery_handle, "h-1");
    }
}
