//! Social network cross-posting.
//!
//! # Responsibility
//! - Format bounded-length status text for new posts.
//! - Define the outbound posting collaborator contract.
//!
//! # Invariants
//! - Core never retries a failed publish; the error goes back to the caller.

use crate::model::post::Post;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod tweet;

/// Failure reported by a [`SocialPoster`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialError {
    pub message: String,
}

impl SocialError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for SocialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "social posting failed: {}", self.message)
    }
}

impl Error for SocialError {}

/// Outbound collaborator that publishes a status update for a post.
pub trait SocialPoster {
    fn publish(&self, content: &str, post: &Post) -> Result<(), SocialError>;
}

/// Poster that accepts and drops every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSocialPoster;

impl SocialPoster for NoopSocialPoster {
    fn publish(&self, _content: &str, _post: &Post) -> Result<(), SocialError> {
        Ok(())
    }
}
