//! Review-session orchestration over a [`ReviewStore`].
//!
//! Loads an item, validates the learner's grade, runs the scheduler and
//! persists the result together with a review log entry. Queue and progress
//! queries for dashboards live here too.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::db::ReviewStore;
use crate::domain::{ItemRecord, QualityPolicy, ReviewLog, ReviewQuality};
use crate::error::{Error, Result};
use crate::srs::{self, ReviewResult};

/// Everything a caller needs to report back after a review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
  pub previous: ItemRecord,
  pub updated: ItemRecord,
  pub quality: ReviewQuality,
  pub result: ReviewResult,
  pub log_id: i64,
}

/// Per-item progress for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemProgress {
  pub id: String,
  pub interval: u32,
  pub ease_factor: f64,
  pub review_count: u32,
  pub next_review: DateTime<Utc>,
  pub is_due: bool,
  pub is_mastered: bool,
  /// Rough projection, assumes perfect reviews from here on
  pub estimated_days_to_mastery: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
  pub total_items: usize,
  pub due_items: usize,
  pub mastered_items: usize,
  pub average_ease_factor: Option<f64>,
}

pub struct ReviewService<S: ReviewStore> {
  store: S,
  config: SchedulerConfig,
}

impl<S: ReviewStore> ReviewService<S> {
  pub fn new(store: S, config: SchedulerConfig) -> Self {
    Self { store, config }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn config(&self) -> &SchedulerConfig {
    &self.config
  }

  /// Start tracking a learnable unit. New items are due immediately.
  pub fn add_item(&self, id: &str, now: DateTime<Utc>) -> Result<ItemRecord> {
    let record = ItemRecord::new(id, now);
    self.store.insert_item(&record)?;
    tracing::info!(item = id, "Review item added");
    Ok(record)
  }

  pub fn remove_item(&self, id: &str) -> Result<bool> {
    let removed = self.store.delete_item(id)?;
    if removed {
      tracing::info!(item = id, "Review item removed");
    }
    Ok(removed)
  }

  pub fn get_item(&self, id: &str) -> Result<ItemRecord> {
    self
      .store
      .get_item(id)?
      .ok_or_else(|| Error::NotFound(id.to_string()))
  }

  /// Apply the configured quality policy to a raw grade from the UI.
  pub fn validate_quality(&self, raw: i64) -> Result<ReviewQuality> {
    let quality = self.config.quality_policy.apply(raw)?;
    if self.config.quality_policy == QualityPolicy::Clamp && i64::from(quality.value()) != raw {
      tracing::warn!("Review quality {} out of range, clamped to {}", raw, quality);
    }
    Ok(quality)
  }

  /// Grade one review of `id` at `now` and persist the new schedule.
  ///
  /// `now`'s time zone decides what "N days later" means for the due date.
  pub fn submit_review<Tz: TimeZone>(
    &self,
    id: &str,
    raw_quality: i64,
    now: &DateTime<Tz>,
  ) -> Result<ReviewOutcome> {
    let quality = self.validate_quality(raw_quality)?;
    let previous = self.get_item(id)?;

    let result = srs::calculate_next_review_at(&previous.item, quality, now);
    let reviewed_at = now.with_timezone(&Utc);
    let updated = previous.with_result(&result, reviewed_at);
    let log = ReviewLog::new(id, quality, reviewed_at, &result);
    let log_id = self.store.record_review(&updated, &log)?;

    tracing::info!(
      item = id,
      quality = quality.value(),
      interval = result.interval,
      ease_factor = result.ease_factor,
      review_count = result.review_count,
      "Review recorded"
    );

    Ok(ReviewOutcome {
      previous,
      updated,
      quality,
      result,
      log_id,
    })
  }

  /// Due items, most overdue first
  pub fn due_queue(&self, now: &DateTime<Utc>, limit: usize) -> Result<Vec<ItemRecord>> {
    let due = self.store.due_items(now, limit)?;
    tracing::debug!("{} items due", due.len());
    Ok(due)
  }

  pub fn history(&self, id: &str) -> Result<Vec<ReviewLog>> {
    self.store.review_logs(id)
  }

  pub fn progress(&self, id: &str, now: &DateTime<Utc>) -> Result<ItemProgress> {
    let record = self.get_item(id)?;
    Ok(self.progress_for(&record, now))
  }

  fn progress_for(&self, record: &ItemRecord, now: &DateTime<Utc>) -> ItemProgress {
    let target = self.config.mastery_target_days;
    ItemProgress {
      id: record.id.clone(),
      interval: record.item.interval,
      ease_factor: record.item.ease_factor,
      review_count: record.item.review_count,
      next_review: record.next_review,
      is_due: record.is_due_at(now),
      is_mastered: srs::is_mastered(record.item.interval, target),
      estimated_days_to_mastery: srs::estimate_days_to_mastery(record.item.interval, target),
    }
  }

  pub fn stats(&self, now: &DateTime<Utc>) -> Result<ReviewStats> {
    let items = self.store.all_items()?;
    let target = self.config.mastery_target_days;

    let due_items = items.iter().filter(|r| r.is_due_at(now)).count();
    let mastered_items = items
      .iter()
      .filter(|r| srs::is_mastered(r.item.interval, target))
      .count();
    let average_ease_factor = if items.is_empty() {
      None
    } else {
      Some(items.iter().map(|r| r.item.ease_factor).sum::<f64>() / items.len() as f64)
    };

    Ok(ReviewStats {
      total_items: items.len(),
      due_items,
      mastered_items,
      average_ease_factor,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db::MemoryStore;
  use crate::testing::TestEnv;
  use chrono::{Duration, FixedOffset};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 6, 0, 0).unwrap()
  }

  fn service() -> ReviewService<MemoryStore> {
    ReviewService::new(MemoryStore::new(), SchedulerConfig::default())
  }

  #[test]
  fn test_add_item_is_due_immediately() {
    let svc = service();
    let record = svc.add_item("word:book", now()).unwrap();
    assert_eq!(record.item.interval, 0);

    let due = svc.due_queue(&now(), 10).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, "word:book");
  }

  #[test]
  fn test_add_duplicate_item() {
    let svc = service();
    svc.add_item("word:book", now()).unwrap();
    assert!(matches!(svc.add_item("word:book", now()), Err(Error::AlreadyExists(_))));
  }

  #[test]
  fn test_submit_review_persists_and_logs() {
    let svc = service();
    svc.add_item("word:book", now()).unwrap();

    let outcome = svc.submit_review("word:book", 5, &now()).unwrap();
    assert_eq!(outcome.previous.item.review_count, 0);
    assert_eq!(outcome.updated.item.interval, 1);
    assert_eq!(outcome.updated.item.review_count, 1);
    assert_eq!(outcome.updated.item.last_review, Some(now()));
    assert_eq!(outcome.updated.next_review, now() + Duration::days(1));

    let stored = svc.get_item("word:book").unwrap();
    assert_eq!(stored, outcome.updated);

    let history = svc.history("word:book").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, outcome.log_id);
    assert_eq!(history[0].quality, ReviewQuality::PERFECT);
  }

  #[test]
  fn test_reviewed_item_leaves_due_queue() {
    let svc = service();
    svc.add_item("word:book", now()).unwrap();
    svc.submit_review("word:book", 4, &now()).unwrap();

    assert!(svc.due_queue(&now(), 10).unwrap().is_empty());
    assert_eq!(svc.due_queue(&(now() + Duration::days(1)), 10).unwrap().len(), 1);
  }

  #[test]
  fn test_submit_review_missing_item() {
    let svc = service();
    assert!(matches!(svc.submit_review("ghost", 4, &now()), Err(Error::NotFound(_))));
  }

  #[test]
  fn test_reject_policy_refuses_out_of_range() {
    let svc = service();
    svc.add_item("word:book", now()).unwrap();
    assert!(matches!(
      svc.submit_review("word:book", 10, &now()),
      Err(Error::InvalidQuality(10))
    ));
    // Nothing changed
    assert_eq!(svc.get_item("word:book").unwrap().item.review_count, 0);
    assert!(svc.history("word:book").unwrap().is_empty());
  }

  #[test]
  fn test_clamp_policy_schedules_out_of_range() {
    let config = SchedulerConfig {
      quality_policy: QualityPolicy::Clamp,
      ..SchedulerConfig::default()
    };
    let svc = ReviewService::new(MemoryStore::new(), config);
    svc.add_item("word:book", now()).unwrap();

    let outcome = svc.submit_review("word:book", 10, &now()).unwrap();
    assert_eq!(outcome.quality, ReviewQuality::PERFECT);
    assert!((outcome.result.ease_factor - 2.6).abs() < 1e-9);

    let outcome = svc.submit_review("word:book", -4, &now()).unwrap();
    assert_eq!(outcome.quality, ReviewQuality::BLACKOUT);
    assert_eq!(outcome.updated.item.review_count, 0);
  }

  #[test]
  fn test_submit_review_in_learner_time_zone() {
    let svc = service();
    svc.add_item("word:book", now()).unwrap();
    let hanoi = FixedOffset::east_opt(7 * 3600).unwrap();
    let local_now = hanoi.with_ymd_and_hms(2024, 10, 1, 22, 15, 0).unwrap();

    let outcome = svc.submit_review("word:book", 4, &local_now).unwrap();
    assert_eq!(outcome.updated.item.last_review, Some(local_now.with_timezone(&Utc)));
    assert_eq!(
      outcome.updated.next_review,
      Utc.with_ymd_and_hms(2024, 10, 2, 15, 15, 0).unwrap()
    );
  }

  #[test]
  fn test_progress_and_stats() {
    let svc = service();
    svc.add_item("fresh", now()).unwrap();
    svc.add_item("strong", now()).unwrap();

    // Drive "strong" past the 30-day threshold: 1, 6, 16, 45
    let mut at = now();
    for _ in 0..4 {
      let outcome = svc.submit_review("strong", 5, &at).unwrap();
      at = outcome.updated.next_review;
    }

    let strong = svc.progress("strong", &now()).unwrap();
    assert_eq!(strong.interval, 45);
    assert!(strong.is_mastered);
    assert!(!strong.is_due);
    assert_eq!(strong.estimated_days_to_mastery, 0);

    let fresh = svc.progress("fresh", &now()).unwrap();
    assert!(fresh.is_due);
    assert!(!fresh.is_mastered);
    assert_eq!(fresh.estimated_days_to_mastery, 32);

    let stats = svc.stats(&now()).unwrap();
    assert_eq!(stats.total_items, 2);
    assert_eq!(stats.due_items, 1);
    assert_eq!(stats.mastered_items, 1);
    let avg = stats.average_ease_factor.unwrap();
    assert!((avg - (2.5 + 2.9) / 2.0).abs() < 1e-9);
  }

  #[test]
  fn test_stats_empty() {
    let stats = service().stats(&now()).unwrap();
    assert_eq!(stats.total_items, 0);
    assert!(stats.average_ease_factor.is_none());
  }

  #[test]
  fn test_remove_item() {
    let svc = service();
    svc.add_item("word:book", now()).unwrap();
    svc.submit_review("word:book", 3, &now()).unwrap();

    assert!(svc.remove_item("word:book").unwrap());
    assert!(!svc.remove_item("word:book").unwrap());
    assert!(svc.history("word:book").unwrap().is_empty());
  }

  #[test]
  fn test_sqlite_backed_service() {
    let env = TestEnv::new().unwrap();
    let svc = ReviewService::new(env.store.clone(), SchedulerConfig::default());
    svc.add_item("phrase:good-morning", now()).unwrap();

    svc.submit_review("phrase:good-morning", 5, &now()).unwrap();
    let outcome = svc
      .submit_review("phrase:good-morning", 1, &(now() + Duration::days(1)))
      .unwrap();
    assert_eq!(outcome.updated.item.interval, 1);
    assert_eq!(outcome.updated.item.review_count, 0);

    let stored = svc.get_item("phrase:good-morning").unwrap();
    assert_eq!(stored, outcome.updated);
    assert_eq!(svc.history("phrase:good-morning").unwrap().len(), 2);
    assert_eq!(env.store.review_totals().unwrap(), (2, 1));

    let reopened = ReviewService::new(env.reopen().unwrap(), SchedulerConfig::default());
    assert_eq!(reopened.get_item("phrase:good-morning").unwrap(), stored);
  }
}
