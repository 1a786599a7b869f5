pub mod item;
pub mod review;

pub use item::{ItemRecord, ReviewItem, DEFAULT_EASE_FACTOR};
pub use review::{QualityPolicy, ReviewLog, ReviewQuality};
