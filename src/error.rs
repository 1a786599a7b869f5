//! Crate-wide error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Quality grade outside 0-5
  #[error("Invalid review quality: {0} (expected 0-5)")]
  InvalidQuality(i64),

  #[error("Review item not found: {0}")]
  NotFound(String),

  #[error("Review item already exists: {0}")]
  AlreadyExists(String),

  #[error("Database error: {0}")]
  Database(#[from] rusqlite::Error),

  /// Stored timestamp that is not valid RFC 3339
  #[error("Invalid timestamp: {0}")]
  InvalidTimestamp(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Database unavailable")]
  LockPoisoned,
}

pub type Result<T> = std::result::Result<T, Error>;
