//! Comment domain model.

use crate::model::post::PostId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned comment identifier.
pub type CommentId = i64;

/// Comment attached to a parent post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    /// Parent post.
    pub post_id: PostId,
    pub user_id: UserId,
    pub body: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentValidationError {
    EmptyBody,
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "comment body must be present"),
        }
    }
}

impl Error for CommentValidationError {}

pub fn validate_comment_body(body: &str) -> Result<(), CommentValidationError> {
    if body.trim().is_empty() {
        return Err(CommentValidationError::EmptyBody);
    }
    Ok(())
}
