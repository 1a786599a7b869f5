use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::srs;

/// Ease factor assigned to an item when it first enters the review system
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Spaced-repetition state attached to one learnable unit (word, flashcard, exercise).
///
/// The learnable content itself lives with the caller; this only carries what
/// the scheduler needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
  pub ease_factor: f64,
  /// Days until the next scheduled review. 0 only before the first review.
  pub interval: u32,
  /// Consecutive successful reviews since the last failure
  pub review_count: u32,
  /// Informational, not read by the scheduling math
  pub last_review: Option<DateTime<Utc>>,
}

impl ReviewItem {
  pub fn new() -> Self {
    Self {
      ease_factor: DEFAULT_EASE_FACTOR,
      interval: 0,
      review_count: 0,
      last_review: None,
    }
  }
}

impl Default for ReviewItem {
  fn default() -> Self {
    Self::new()
  }
}

/// A review item as persisted by a store, keyed by the learnable unit's ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
  pub id: String,
  #[serde(flatten)]
  pub item: ReviewItem,
  pub next_review: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

impl ItemRecord {
  /// Fresh record with default scheduling state, due immediately.
  pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
    Self {
      id: id.into(),
      item: ReviewItem::new(),
      next_review: now,
      created_at: now,
    }
  }

  pub fn is_due_at(&self, now: &DateTime<Utc>) -> bool {
    srs::is_due_at(&self.next_review, now)
  }

  /// Apply a scheduling result, producing the record to persist.
  pub fn with_result(&self, result: &srs::ReviewResult, reviewed_at: DateTime<Utc>) -> Self {
    Self {
      id: self.id.clone(),
      item: result.apply(reviewed_at),
      next_review: result.next_review,
      created_at: self.created_at,
    }
  }
}
