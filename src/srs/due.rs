use chrono::{DateTime, TimeZone, Utc};

/// True once `now` has reached the scheduled review time.
pub fn is_due_at<Tz1: TimeZone, Tz2: TimeZone>(next_review: &DateTime<Tz1>, now: &DateTime<Tz2>) -> bool {
  now >= next_review
}

/// Due check against the system clock
pub fn is_due_for_review<Tz: TimeZone>(next_review: &DateTime<Tz>) -> bool {
  is_due_at(next_review, &Utc::now())
}
