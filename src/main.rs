use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocab_srs::config::{self, DEFAULT_DUE_LIMIT};
use vocab_srs::db::SqliteStore;
use vocab_srs::domain::ItemRecord;
use vocab_srs::service::ReviewService;
use vocab_srs::{srs, Error};

/// Spaced-repetition review scheduler for vocabulary items
#[derive(Parser)]
#[command(name = "vocab-srs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "SM-2 review scheduling for vocabulary items")]
struct Cli {
  /// Database file (overrides config.toml and DATABASE_PATH)
  #[arg(long, global = true)]
  db: Option<PathBuf>,

  /// Print results as JSON
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Start tracking an item; it is due immediately
  Add { id: String },

  /// Stop tracking an item and drop its review history
  Remove { id: String },

  /// Record a review grade (0-5) for an item
  Review {
    id: String,
    #[arg(allow_negative_numbers = true)]
    quality: i64,
    /// Review time as RFC 3339 (default: now, local time zone)
    #[arg(long)]
    at: Option<String>,
  },

  /// List items due for review
  Due {
    #[arg(long, default_value_t = DEFAULT_DUE_LIMIT)]
    limit: usize,
  },

  /// Show an item and its review history
  Show { id: String },

  /// Show progress toward mastery for an item
  Progress { id: String },

  /// Summary across all items
  Stats,

  /// Estimate days until an interval reaches the mastery threshold
  Mastery {
    interval: u32,
    #[arg(long)]
    target: Option<u32>,
  },
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "vocab_srs=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();
  let settings = config::load().context("Failed to load configuration")?;

  // Only opened by commands that touch stored items
  let open_service = || -> anyhow::Result<ReviewService<SqliteStore>> {
    let db_path = cli.db.clone().unwrap_or_else(|| settings.database_path.clone());
    let store = SqliteStore::open(&db_path)
      .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    Ok(ReviewService::new(store, settings.scheduler))
  };
  let now = Utc::now();

  match cli.command {
    Commands::Add { id } => {
      let record = open_service()?.add_item(&id, now)?;
      emit(cli.json, &record, || format!("Added {} (due now)", record.id))
    }
    Commands::Remove { id } => {
      if !open_service()?.remove_item(&id)? {
        return Err(Error::NotFound(id).into());
      }
      emit(cli.json, &id, || format!("Removed {}", id))
    }
    Commands::Review { id, quality, at } => {
      let service = open_service()?;
      let outcome = match at {
        Some(at) => service.submit_review(&id, quality, &parse_review_time(&at)?)?,
        None => service.submit_review(&id, quality, &Local::now())?,
      };
      emit(cli.json, &outcome, || {
        format!(
          "{}: quality {} -> interval {} day(s), ease {:.2}, streak {}, next review {}",
          id,
          outcome.quality,
          outcome.result.interval,
          outcome.result.ease_factor,
          outcome.result.review_count,
          outcome.result.next_review.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        )
      })
    }
    Commands::Due { limit } => {
      let due = open_service()?.due_queue(&now, limit)?;
      emit(cli.json, &due, || {
        if due.is_empty() {
          "Nothing due".to_string()
        } else {
          due.iter().map(describe).collect::<Vec<_>>().join("\n")
        }
      })
    }
    Commands::Show { id } => {
      let service = open_service()?;
      let record = service.get_item(&id)?;
      let history = service.history(&id)?;
      #[derive(Serialize)]
      struct Shown<'a> {
        item: &'a ItemRecord,
        history: &'a [vocab_srs::domain::ReviewLog],
      }
      emit(cli.json, &Shown { item: &record, history: &history }, || {
        let mut lines = vec![describe(&record)];
        for log in &history {
          lines.push(format!(
            "  {} quality {} -> interval {}, ease {:.2}",
            log.reviewed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            log.quality,
            log.interval,
            log.ease_factor
          ));
        }
        lines.join("\n")
      })
    }
    Commands::Progress { id } => {
      let progress = open_service()?.progress(&id, &now)?;
      emit(cli.json, &progress, || {
        if progress.is_mastered {
          format!("{}: mastered (interval {} days)", progress.id, progress.interval)
        } else {
          format!(
            "{}: interval {} days, ~{} more days to mastery{}",
            progress.id,
            progress.interval,
            progress.estimated_days_to_mastery,
            if progress.is_due { " (due now)" } else { "" }
          )
        }
      })
    }
    Commands::Stats => {
      let stats = open_service()?.stats(&now)?;
      emit(cli.json, &stats, || {
        format!(
          "{} items, {} due, {} mastered, average ease {}",
          stats.total_items,
          stats.due_items,
          stats.mastered_items,
          stats
            .average_ease_factor
            .map(|ef| format!("{:.2}", ef))
            .unwrap_or_else(|| "-".to_string())
        )
      })
    }
    Commands::Mastery { interval, target } => {
      // Pure estimate, no database needed
      let target = target.unwrap_or(settings.scheduler.mastery_target_days);
      print_mastery_estimate(cli.json, interval, target)
    }
  }
}

fn print_mastery_estimate(json: bool, interval: u32, target: u32) -> anyhow::Result<()> {
  #[derive(Serialize)]
  struct Estimate {
    interval: u32,
    target: u32,
    days: u32,
  }

  let days = srs::estimate_days_to_mastery(interval, target);
  emit(json, &Estimate { interval, target, days }, || {
    format!("~{} days until a {}-day interval reaches {} days", days, interval, target)
  })
}

fn parse_review_time(s: &str) -> Result<DateTime<FixedOffset>, Error> {
  DateTime::parse_from_rfc3339(s).map_err(|_| Error::InvalidTimestamp(s.to_string()))
}

fn describe(record: &ItemRecord) -> String {
  format!(
    "{}  interval {}d  ease {:.2}  streak {}  next {}",
    record.id,
    record.item.interval,
    record.item.ease_factor,
    record.item.review_count,
    record.next_review.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
  )
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(value)?);
  } else {
    println!("{}", text());
  }
  Ok(())
}
