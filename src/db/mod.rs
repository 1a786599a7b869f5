pub mod items;
pub mod memory;
pub mod reviews;
pub mod schema;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{ItemRecord, ReviewLog};
use crate::error::{Error, Result};
use crate::srs::cap_to_latest_due;

pub use memory::MemoryStore;
pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// Load/save access to review items by ID.
///
/// Implementations serialize their own access, so every method takes `&self`.
/// Concurrent reviews of the same item are last-write-wins.
pub trait ReviewStore {
    fn get_item(&self, id: &str) -> Result<Option<ItemRecord>>;

    /// Errors with `AlreadyExists` if the ID is taken.
    fn insert_item(&self, record: &ItemRecord) -> Result<()>;

    /// Errors with `NotFound` if the item was never inserted.
    fn save_item(&self, record: &ItemRecord) -> Result<()>;

    /// Removes the item and its review history.
    fn delete_item(&self, id: &str) -> Result<bool>;

    /// Items due at `now`, ordered by next review time ascending.
    fn due_items(&self, now: &DateTime<Utc>, limit: usize) -> Result<Vec<ItemRecord>>;

    fn all_items(&self) -> Result<Vec<ItemRecord>>;

    fn insert_review_log(&self, log: &ReviewLog) -> Result<i64>;

    fn review_logs(&self, item_id: &str) -> Result<Vec<ReviewLog>>;

    /// Persist the updated item together with its log entry.
    fn record_review(&self, record: &ItemRecord, log: &ReviewLog) -> Result<i64> {
        self.save_item(record)?;
        self.insert_review_log(log)
    }
}

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> Result<MutexGuard<'_, Connection>> {
    pool.lock().map_err(|_| {
        tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
        Error::LockPoisoned
    })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Create backup before migrations if database exists
    if path.exists() {
        std::fs::copy(path, path.with_extension("db.backup")).log_warn("Could not create database backup");
    }

    let conn = Connection::open(path)?;
    run_migrations(&conn)?;
    tracing::debug!("Opened review database at {}", path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// Fixed-width RFC 3339 in UTC, so text comparison in SQL orders by time.
/// Instants past year 9999 are written as the last storable second.
pub(crate) fn to_timestamp(dt: &DateTime<Utc>) -> String {
    cap_to_latest_due(*dt).to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    parse_rfc3339(s).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse an RFC 3339 timestamp in any offset into UTC
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp(s.to_string()))
}

/// SQLite-backed store
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self { pool: init_db(path)? })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, running migrations first.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        run_migrations(&conn)?;
        Ok(Self {
            pool: Arc::new(Mutex::new(conn)),
        })
    }

    /// (total reviews logged, successful reviews logged)
    pub fn review_totals(&self) -> Result<(i64, i64)> {
        let conn = try_lock(&self.pool)?;
        Ok(reviews::get_review_totals(&conn)?)
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl ReviewStore for SqliteStore {
    fn get_item(&self, id: &str) -> Result<Option<ItemRecord>> {
        let conn = try_lock(&self.pool)?;
        Ok(items::get_item_by_id(&conn, id)?)
    }

    fn insert_item(&self, record: &ItemRecord) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        items::insert_item(&conn, record).map_err(|e| {
            if is_constraint_violation(&e) {
                Error::AlreadyExists(record.id.clone())
            } else {
                e.into()
            }
        })
    }

    fn save_item(&self, record: &ItemRecord) -> Result<()> {
        let conn = try_lock(&self.pool)?;
        match items::update_item(&conn, record)? {
            0 => Err(Error::NotFound(record.id.clone())),
            _ => Ok(()),
        }
    }

    fn delete_item(&self, id: &str) -> Result<bool> {
        let conn = try_lock(&self.pool)?;
        Ok(items::delete_item(&conn, id)?)
    }

    fn due_items(&self, now: &DateTime<Utc>, limit: usize) -> Result<Vec<ItemRecord>> {
        let conn = try_lock(&self.pool)?;
        Ok(items::get_due_items(&conn, now, limit)?)
    }

    fn all_items(&self) -> Result<Vec<ItemRecord>> {
        let conn = try_lock(&self.pool)?;
        Ok(items::get_all_items(&conn)?)
    }

    fn insert_review_log(&self, log: &ReviewLog) -> Result<i64> {
        let conn = try_lock(&self.pool)?;
        Ok(reviews::insert_review_log(&conn, log)?)
    }

    fn review_logs(&self, item_id: &str) -> Result<Vec<ReviewLog>> {
        let conn = try_lock(&self.pool)?;
        Ok(reviews::get_review_logs(&conn, item_id)?)
    }

    fn record_review(&self, record: &ItemRecord, log: &ReviewLog) -> Result<i64> {
        let conn = try_lock(&self.pool)?;
        let tx = conn.unchecked_transaction()?;
        if items::update_item(&tx, record)? == 0 {
            return Err(Error::NotFound(record.id.clone()));
        }
        let log_id = reviews::insert_review_log(&tx, log)?;
        tx.commit()?;
        Ok(log_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_roundtrip_is_fixed_width() {
        let dt = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 1).unwrap();
        let s = to_timestamp(&dt);
        assert_eq!(s, "2024-02-29T23:59:01.000000Z");
        assert_eq!(parse_timestamp(0, &s).unwrap(), dt);
    }

    #[test]
    fn test_far_future_timestamp_stays_readable() {
        let s = to_timestamp(&DateTime::<Utc>::MAX_UTC);
        assert_eq!(s, "9999-12-31T23:59:59.000000Z");
        assert_eq!(parse_timestamp(0, &s).unwrap().timestamp(), crate::srs::LATEST_DUE_TIMESTAMP);
    }

    #[test]
    fn test_parse_rfc3339_converts_offset() {
        let dt = parse_rfc3339("2024-05-01T09:00:00+07:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap());
        assert!(matches!(parse_rfc3339("tomorrow"), Err(Error::InvalidTimestamp(_))));
    }

    #[test]
    fn test_log_warn() {
        let ok: std::result::Result<i32, String> = Ok(3);
        let err: std::result::Result<i32, String> = Err("boom".into());
        assert_eq!(ok.log_warn("ctx"), Some(3));
        assert_eq!(err.log_warn("ctx"), None);
    }

    #[test]
    fn test_reopen_writes_backup_of_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.db");
        let backup = path.with_extension("db.backup");

        drop(init_db(&path).unwrap());
        assert!(!backup.exists());

        drop(init_db(&path).unwrap());
        assert!(backup.exists());
    }

    #[test]
    fn test_record_review_missing_item_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = ItemRecord::new("ghost", now);
        let result = crate::srs::calculate_next_review_at(
            &record.item,
            crate::domain::ReviewQuality::GOOD,
            &now,
        );
        let log = ReviewLog::new("ghost", crate::domain::ReviewQuality::GOOD, now, &result);

        assert!(matches!(store.record_review(&record, &log), Err(Error::NotFound(_))));
        assert_eq!(store.review_totals().unwrap(), (0, 0));
    }
}
