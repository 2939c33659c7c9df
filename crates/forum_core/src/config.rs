//! Runtime configuration for embedding the forum core.
//!
//! # Responsibility
//! - Deserialize host-provided settings (JSON) with defaults for every field.
//! - Turn settings into ready-to-use core handles.
//!
//! # Invariants
//! - A missing `db_path` means an in-memory database.
//! - A missing `log_dir` means logging stays disabled.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LogSettings, LoggingError};
use crate::social::tweet::{TweetFormatter, DEFAULT_SHORT_LINK_BASE, DEFAULT_TWEET_MAX_CHARS};
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForumConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// Prefix of the short link appended to announcements.
    pub short_link_base: String,
    pub tweet_max_chars: usize,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            short_link_base: DEFAULT_SHORT_LINK_BASE.to_string(),
            tweet_max_chars: DEFAULT_TWEET_MAX_CHARS,
        }
    }
}

impl ForumConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_link_base.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "short_link_base must not be empty".to_string(),
            ));
        }
        // The link for the largest possible id must fit whole.
        let min_chars = TweetFormatter::min_max_chars(&self.short_link_base);
        if self.tweet_max_chars < min_chars {
            return Err(ConfigError::Invalid(format!(
                "tweet_max_chars must be at least {min_chars}, got {}",
                self.tweet_max_chars
            )));
        }
        Ok(())
    }

    /// Opens (and migrates) the configured database.
    pub fn open_database(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }

    /// Starts file logging when `log_dir` is set.
    ///
    /// Returns `Ok(false)` when logging is not configured.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(log_dir) = &self.log_dir else {
            return Ok(false);
        };
        init_logging(&LogSettings::new(&self.log_level, log_dir)?)?;
        Ok(true)
    }

    pub fn tweet_formatter(&self) -> TweetFormatter {
        TweetFormatter::new(self.short_link_base.clone(), self.tweet_max_chars)
    }
}
