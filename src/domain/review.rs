use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::srs::ReviewResult;

/// Self-assessed recall grade, 0 (complete blackout) to 5 (perfect recall).
///
/// 0-2 count as a failed review, 3-5 as a successful one. The constructor
/// guarantees the range, so scheduling code never sees an out-of-range grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct ReviewQuality(u8);

impl ReviewQuality {
  pub const BLACKOUT: Self = Self(0);
  pub const WRONG: Self = Self(1);
  /// Wrong, but the answer felt familiar once shown
  pub const HARD_WRONG: Self = Self(2);
  pub const HARD: Self = Self(3);
  pub const GOOD: Self = Self(4);
  pub const PERFECT: Self = Self(5);

  /// Highest valid grade
  pub const MAX: u8 = 5;

  /// Lowest grade that counts as a successful recall
  pub const PASSING: u8 = 3;

  pub fn new(value: i64) -> Result<Self> {
    if (0..=Self::MAX as i64).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::InvalidQuality(value))
    }
  }

  /// Clamp any integer into 0-5.
  pub fn saturating(value: i64) -> Self {
    Self(value.clamp(0, Self::MAX as i64) as u8)
  }

  pub fn from_u8(value: u8) -> Option<Self> {
    (value <= Self::MAX).then_some(Self(value))
  }

  pub fn value(self) -> u8 {
    self.0
  }

  pub fn is_success(self) -> bool {
    self.0 >= Self::PASSING
  }
}

impl TryFrom<i64> for ReviewQuality {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> {
    Self::new(value)
  }
}

impl From<ReviewQuality> for u8 {
  fn from(quality: ReviewQuality) -> Self {
    quality.0
  }
}

impl std::fmt::Display for ReviewQuality {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// What to do with a raw grade outside 0-5 at the service boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityPolicy {
  /// Refuse the review with `Error::InvalidQuality`
  #[default]
  Reject,
  /// Clamp into 0-5 and schedule anyway
  Clamp,
}

impl QualityPolicy {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Reject => "reject",
      Self::Clamp => "clamp",
    }
  }

  pub fn apply(&self, raw: i64) -> Result<ReviewQuality> {
    match self {
      Self::Reject => ReviewQuality::new(raw),
      Self::Clamp => Ok(ReviewQuality::saturating(raw)),
    }
  }
}

impl std::str::FromStr for QualityPolicy {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "reject" => Ok(Self::Reject),
      "clamp" => Ok(Self::Clamp),
      _ => Err(Error::Config(format!("unknown quality policy '{}'", s))),
    }
  }
}

/// One review event, with the scheduling state it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
  pub id: i64,
  pub item_id: String,
  pub quality: ReviewQuality,
  pub reviewed_at: DateTime<Utc>,
  pub ease_factor: f64,
  pub interval: u32,
  pub review_count: u32,
}

impl ReviewLog {
  pub fn new(
    item_id: impl Into<String>,
    quality: ReviewQuality,
    reviewed_at: DateTime<Utc>,
    result: &ReviewResult,
  ) -> Self {
    Self {
      id: 0,
      item_id: item_id.into(),
      quality,
      reviewed_at,
      ease_factor: result.ease_factor,
      interval: result.interval,
      review_count: result.review_count,
    }
  }

  pub fn is_success(&self) -> bool {
    self.quality.is_success()
  }
}
