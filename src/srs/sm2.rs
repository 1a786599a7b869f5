//! SM-2 (SuperMemo 2) scheduling.
//!
//! - Grades 0-2 send the item back to a 1-day interval and reset the streak
//! - Grades 3-5 grow the interval: 1 day, then 6 days, then interval * EF
//! - EF is adjusted after every review, failures included, and never drops below 1.3

use chrono::{DateTime, Days, Duration, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ReviewItem, ReviewQuality};

pub const MIN_EASE_FACTOR: f64 = 1.3;

const FIRST_INTERVAL_DAYS: u32 = 1;
const SECOND_INTERVAL_DAYS: u32 = 6;
const RELEARN_INTERVAL_DAYS: u32 = 1;

/// 9999-12-31T23:59:59Z. Later instants need an expanded year that RFC 3339 can't express.
pub const LATEST_DUE_TIMESTAMP: i64 = 253_402_300_799;

/// Scheduling state after one review
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
  pub ease_factor: f64,
  pub interval: u32,
  pub next_review: DateTime<Utc>,
  pub review_count: u32,
}

impl ReviewResult {
  /// The updated item, stamped with the time of the review.
  pub fn apply(&self, reviewed_at: DateTime<Utc>) -> ReviewItem {
    ReviewItem {
      ease_factor: self.ease_factor,
      interval: self.interval,
      review_count: self.review_count,
      last_review: Some(reviewed_at),
    }
  }
}

/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
pub fn ease_delta(quality: ReviewQuality) -> f64 {
  let penalty = f64::from(ReviewQuality::MAX - quality.value());
  0.1 - penalty * (0.08 + penalty * 0.02)
}

/// Schedule the next review relative to the local clock.
pub fn calculate_next_review(item: &ReviewItem, quality: ReviewQuality) -> ReviewResult {
  calculate_next_review_at(item, quality, &Local::now())
}

/// Schedule the next review relative to `now`.
///
/// The interval is counted in calendar days in `now`'s time zone, so the item
/// comes due at the same wall-clock time `interval` days later.
pub fn calculate_next_review_at<Tz: TimeZone>(
  item: &ReviewItem,
  quality: ReviewQuality,
  now: &DateTime<Tz>,
) -> ReviewResult {
  let (interval, review_count) = if !quality.is_success() {
    (RELEARN_INTERVAL_DAYS, 0)
  } else {
    // Growth uses the ease factor from before this review
    let interval = match item.review_count {
      0 => FIRST_INTERVAL_DAYS,
      1 => SECOND_INTERVAL_DAYS,
      _ => grow_interval(item.interval, item.ease_factor),
    };
    (interval, item.review_count.saturating_add(1))
  };

  let ease_factor = (item.ease_factor + ease_delta(quality)).max(MIN_EASE_FACTOR);

  ReviewResult {
    ease_factor,
    interval,
    next_review: add_calendar_days(now, interval),
    review_count,
  }
}

/// round(interval * EF), half away from zero, never below one day.
fn grow_interval(interval: u32, ease_factor: f64) -> u32 {
  let grown = (f64::from(interval) * ease_factor).round();
  (grown as u32).max(1)
}

/// Same wall-clock time `days` calendar days later, in `from`'s time zone.
///
/// An ambiguous target (clocks going back) resolves to the earlier instant. A
/// target inside a DST gap falls back to adding `days * 24h`. Results past
/// year 9999 are capped at [`LATEST_DUE_TIMESTAMP`].
pub fn add_calendar_days<Tz: TimeZone>(from: &DateTime<Tz>, days: u32) -> DateTime<Utc> {
  let due = from
    .naive_local()
    .checked_add_days(Days::new(u64::from(days)))
    .and_then(|local| from.timezone().from_local_datetime(&local).earliest())
    .map(|dt| dt.with_timezone(&Utc))
    .unwrap_or_else(|| {
      from
        .with_timezone(&Utc)
        .checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
    });
  cap_to_latest_due(due)
}

/// Clamp to [`LATEST_DUE_TIMESTAMP`], the last instant with a four-digit year.
pub fn cap_to_latest_due(dt: DateTime<Utc>) -> DateTime<Utc> {
  if dt.timestamp() <= LATEST_DUE_TIMESTAMP {
    return dt;
  }
  DateTime::from_timestamp(LATEST_DUE_TIMESTAMP, 0).unwrap_or(dt)
}
