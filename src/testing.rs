//! Test utilities for database setup.
//!
//! Reuses the production open path (`db::init_db`, which runs the
//! authoritative migrations) so tests never duplicate schema.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::db::SqliteStore;
use crate::error::Result;

/// On-disk review database in a temporary directory.
///
/// The directory, and the database with it, is removed when dropped.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    /// Path of the reviews database inside `temp`
    pub db_path: PathBuf,
    /// Store opened on `db_path` with all migrations applied
    pub store: SqliteStore,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let db_path = temp.path().join("reviews.db");
        let store = SqliteStore::open(&db_path)?;

        Ok(Self {
            temp,
            db_path,
            store,
        })
    }

    /// Open a second store on the same database file.
    pub fn reopen(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.db_path)
    }
}
