pub mod due;
pub mod mastery;
pub mod sm2;

pub use due::{is_due_at, is_due_for_review};
pub use mastery::{
  estimate_days_to_mastery, estimate_days_to_mastery_default, is_mastered, DEFAULT_MASTERY_TARGET_DAYS,
};
pub use sm2::{
  calculate_next_review, calculate_next_review_at, cap_to_latest_due, ReviewResult, LATEST_DUE_TIMESTAMP,
  MIN_EASE_FACTOR,
};
