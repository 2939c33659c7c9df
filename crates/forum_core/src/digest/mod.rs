//! Periodic digest email.
//!
//! # Responsibility
//! - Collect posts newer than the last checkpoint of a frequency.
//! - Hand one message per subscriber to the mailing collaborator.
//! - Advance the checkpoint once every delivery succeeded.
//!
//! # Invariants
//! - A failed delivery leaves the checkpoint untouched, so the next run
//!   covers the same window again.
//! - Scheduling is the caller's concern; one call is one digest period.

use crate::model::digest::DigestHistory;
use crate::model::post::Post;
use crate::model::user::User;
use crate::repo::post_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod builder;

/// One digest email for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage<'a> {
    /// Checkpoint the window starts at.
    pub checkpoint: &'a DigestHistory,
    pub recipient: &'a User,
    /// Posts in the window, oldest id first.
    pub posts: &'a [Post],
}

/// Failure reported by a [`Mailer`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailError {
    pub message: String,
}

impl MailError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for MailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "digest delivery failed: {}", self.message)
    }
}

impl Error for MailError {}

/// Mail delivery collaborator.
pub trait Mailer {
    fn deliver(&self, message: &DigestMessage<'_>) -> Result<(), MailError>;
}

#[derive(Debug)]
pub enum DigestError {
    Repo(RepoError),
    Mail(MailError),
}

impl Display for DigestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Mail(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DigestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Mail(err) => Some(err),
        }
    }
}

impl From<RepoError> for DigestError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MailError> for DigestError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}
