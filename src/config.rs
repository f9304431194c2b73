//! Application configuration.
//!
//! Runtime paths and the bind address are loaded with priority
//! `config.toml` > environment (`.env` supported) > defaults. Tuning values
//! for study sessions and achievements are constants.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== Runtime Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database: Option<DatabaseSection>,
    server: Option<ServerSection>,
    media: Option<MediaSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    bind_addr: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaSection {
    dir: Option<String>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub media_dir: PathBuf,
    pub bind_addr: String,
}

impl Config {
    /// Load configuration: config.toml > env (FLASHY_*) > defaults
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file = match std::fs::read_to_string("config.toml") {
            Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Ignoring malformed config.toml: {}", e);
                    FileConfig::default()
                }
            },
            Err(_) => FileConfig::default(),
        };

        let database_path = resolve(
            "database path",
            file.database.and_then(|d| d.path),
            "FLASHY_DATABASE_PATH",
            DEFAULT_DATABASE_PATH,
        );
        let media_dir = resolve(
            "media directory",
            file.media.and_then(|m| m.dir),
            "FLASHY_MEDIA_DIR",
            DEFAULT_MEDIA_DIR,
        );
        let bind_addr = resolve(
            "bind address",
            file.server.and_then(|s| s.bind_addr),
            "FLASHY_BIND_ADDR",
            DEFAULT_BIND_ADDR,
        );

        Self {
            database_path: PathBuf::from(database_path),
            media_dir: PathBuf::from(media_dir),
            bind_addr,
        }
    }
}

fn resolve(what: &str, from_file: Option<String>, env_key: &str, default: &str) -> String {
    if let Some(value) = from_file {
        tracing::info!("Using {} from config.toml: {}", what, value);
        return value;
    }
    if let Ok(value) = std::env::var(env_key) {
        tracing::info!("Using {} from {} env: {}", what, env_key, value);
        return value;
    }
    tracing::info!("Using default {}: {}", what, default);
    default.to_string()
}

pub const DEFAULT_DATABASE_PATH: &str = "data/flashy.db";
pub const DEFAULT_MEDIA_DIR: &str = "data/media";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

// ==================== Session Configuration ====================

/// Idle study sessions expire after this many hours
pub const SESSION_EXPIRY_HOURS: i64 = 2;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

// ==================== Study Configuration ====================

/// Countdown budget per card in timed mode, in seconds
pub const TIMED_CARD_SECONDS: u32 = 30;

/// Number of distractor choices in multiple choice mode
pub const DISTRACTOR_COUNT: usize = 3;

// ==================== Achievement Thresholds ====================

/// Sessions at least this long earn "marathon"
pub const MARATHON_SECS: i64 = 30 * 60;

/// Sessions at most this long earn "quick_study" (with enough cards)
pub const QUICK_STUDY_SECS: i64 = 60;

/// Minimum studied cards for "quick_study" and answers for "perfectionist"
pub const ACHIEVEMENT_MIN_CARDS: u32 = 10;

// ==================== Upload Limits ====================

/// Maximum accepted size of a single uploaded media file
pub const MAX_MEDIA_BYTES: usize = 5 * 1024 * 1024;
