//! Application configuration.
//!
//! Values resolve with priority: config.toml > environment (including `.env`) > defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::QualityPolicy;
use crate::error::{Error, Result};
use crate::paths;
use crate::srs::DEFAULT_MASTERY_TARGET_DAYS;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "config.toml";

/// Default number of items returned for a due queue
pub const DEFAULT_DUE_LIMIT: usize = 50;

// ==================== File Structure ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    scheduler: Option<SchedulerFileConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulerFileConfig {
    quality_policy: Option<QualityPolicy>,
    mastery_target_days: Option<u32>,
}

// ==================== Resolved Settings ====================

/// Boundary policy for the review service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub quality_policy: QualityPolicy,
    /// Interval at which an item is reported as mastered
    pub mastery_target_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quality_policy: QualityPolicy::default(),
            mastery_target_days: DEFAULT_MASTERY_TARGET_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub scheduler: SchedulerConfig,
}

/// Load settings from `config.toml` in the working directory and the environment.
pub fn load() -> Result<Settings> {
    load_from(Path::new(CONFIG_FILE))
}

pub fn load_from(config_path: &Path) -> Result<Settings> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file_config = match std::fs::read_to_string(config_path) {
        Ok(contents) => parse_config(&contents)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => return Err(e.into()),
    };

    resolve(file_config, |key| std::env::var(key).ok())
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config(format!("{}: {}", CONFIG_FILE, e)))
}

fn resolve(file: AppConfig, env: impl Fn(&str) -> Option<String>) -> Result<Settings> {
    let database_path = resolve_database_path(file.database.unwrap_or_default(), &env);
    let scheduler_file = file.scheduler.unwrap_or_default();

    let quality_policy = match scheduler_file.quality_policy {
        Some(policy) => policy,
        None => match env("SRS_QUALITY_POLICY") {
            Some(raw) => raw.trim().parse::<QualityPolicy>().map_err(|_| {
                Error::Config(format!("SRS_QUALITY_POLICY must be 'reject' or 'clamp', got '{}'", raw))
            })?,
            None => QualityPolicy::default(),
        },
    };

    let mastery_target_days = match scheduler_file.mastery_target_days {
        Some(days) => days,
        None => match env("SRS_MASTERY_TARGET_DAYS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!("SRS_MASTERY_TARGET_DAYS must be a whole number of days, got '{}'", raw))
            })?,
            None => DEFAULT_MASTERY_TARGET_DAYS,
        },
    };

    Ok(Settings {
        database_path,
        scheduler: SchedulerConfig {
            quality_policy,
            mastery_target_days,
        },
    })
}

fn resolve_database_path(db: DatabaseConfig, env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    // Priority 1: config.toml
    if let Some(path) = db.path {
        tracing::info!("Using database from config.toml: {}", path);
        return PathBuf::from(path);
    }

    // Priority 2: DATABASE_PATH env
    if let Some(path) = env("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    let default = PathBuf::from(paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}
