//! Digest checkpoint model.
//!
//! # Invariants
//! - The most recent `DigestHistory` per frequency marks the start of the
//!   next digest window.
//! - A window is keyed on post ids, never on timestamps, so two runs can
//!   never cover the same post.

use crate::model::post::PostId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestFrequency {
    Daily,
    Weekly,
}

impl DigestFrequency {
    /// Value persisted in `frequency`/`digest_frequency` columns.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }
}

/// One digest checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestHistory {
    pub id: i64,
    pub frequency: DigestFrequency,
    /// Highest post id covered so far; the window holds posts above it.
    pub last_post_id: PostId,
    /// Epoch milliseconds.
    pub created_at: i64,
}
