use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Complete schema for new databases; upgrades for older files follow below
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS review_items (
      id TEXT PRIMARY KEY,
      ease_factor REAL NOT NULL DEFAULT 2.5,
      interval_days INTEGER NOT NULL DEFAULT 0,
      review_count INTEGER NOT NULL DEFAULT 0,
      last_review TEXT,
      next_review TEXT NOT NULL,
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS review_logs (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      item_id TEXT NOT NULL,
      quality INTEGER NOT NULL,
      reviewed_at TEXT NOT NULL,
      ease_factor REAL NOT NULL,
      interval_days INTEGER NOT NULL,
      review_count INTEGER NOT NULL,
      FOREIGN KEY (item_id) REFERENCES review_items(id)
    );

    CREATE INDEX IF NOT EXISTS idx_review_items_next_review ON review_items(next_review);
    CREATE INDEX IF NOT EXISTS idx_review_logs_item_id ON review_logs(item_id);
    CREATE INDEX IF NOT EXISTS idx_review_logs_reviewed_at ON review_logs(reviewed_at);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // No-ops for new databases (columns already exist)
  // ============================================================

  // last_review was not tracked by the first schema
  add_column_if_missing(conn, "review_items", "last_review", "TEXT")?;

  Ok(())
}

/// Check if a column exists in a table
pub(crate) fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    tracing::info!("Migrating {}: adding column {}", table, column);
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
