//! Rough projection of how far an item is from being "mastered".
//!
//! This is a progress-display heuristic. It assumes every remaining review is
//! perfect and uses a fixed ease of 2.5 regardless of the item's real ease
//! factor, so it must not feed back into scheduling.

/// Interval, in days, at which an item counts as well-learned
pub const DEFAULT_MASTERY_TARGET_DAYS: u32 = 30;

const PROJECTED_EASE_FACTOR: f64 = 2.5;

/// Days of further review until the interval reaches `target_interval`.
///
/// A never-reviewed item (interval 0) is projected from a 1-day interval,
/// which is what its first successful review would give it.
pub fn estimate_days_to_mastery(current_interval: u32, target_interval: u32) -> u32 {
  if current_interval >= target_interval {
    return 0;
  }

  let mut interval = current_interval.max(1);
  let mut days: u32 = 0;
  while interval < target_interval {
    days = days.saturating_add(interval);
    interval = (f64::from(interval) * PROJECTED_EASE_FACTOR).round() as u32;
  }
  days
}

pub fn estimate_days_to_mastery_default(current_interval: u32) -> u32 {
  estimate_days_to_mastery(current_interval, DEFAULT_MASTERY_TARGET_DAYS)
}

pub fn is_mastered(interval: u32, target_interval: u32) -> bool {
  interval >= target_interval
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_already_mastered() {
    assert_eq!(estimate_days_to_mastery_default(30), 0);
    assert_eq!(estimate_days_to_mastery_default(90), 0);
  }

  #[test]
  fn test_from_one_day() {
    // 1 -> 3 -> 8 -> 20 -> 50
    assert_eq!(estimate_days_to_mastery_default(1), 1 + 3 + 8 + 20);
  }

  #[test]
  fn test_from_six_days() {
    // 6 -> 15 -> 38
    assert_eq!(estimate_days_to_mastery_default(6), 21);
  }

  #[test]
  fn test_never_reviewed_projects_from_one_day() {
    assert_eq!(estimate_days_to_mastery_default(0), estimate_days_to_mastery_default(1));
  }

  #[test]
  fn test_custom_target() {
    assert_eq!(estimate_days_to_mastery(6, 7), 6);
    assert_eq!(estimate_days_to_mastery(20, 20), 0);
    assert_eq!(estimate_days_to_mastery(0, 0), 0);
  }

  #[test]
  fn test_large_target_terminates() {
    let days = estimate_days_to_mastery(1, u32::MAX);
    assert!(days > 0);
  }

  #[test]
  fn test_is_mastered() {
    assert!(is_mastered(30, DEFAULT_MASTERY_TARGET_DAYS));
    assert!(!is_mastered(29, DEFAULT_MASTERY_TARGET_DAYS));
  }
}
