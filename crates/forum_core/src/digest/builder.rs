//! Digest run orchestration.

use crate::digest::{DigestError, DigestMessage, Mailer};
use crate::model::digest::{DigestFrequency, DigestHistory};
use crate::repo::digest_repo::DigestRepository;
use crate::repo::user_repo::UserRepository;
use log::{error, info};

/// Outcome of one digest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestRun {
    /// Checkpoint the window started at.
    pub window_start: DigestHistory,
    /// Checkpoint created at the end of the run; its `last_post_id` is the
    /// newest post sent.
    pub next_checkpoint: DigestHistory,
    pub recipients: usize,
    pub posts: usize,
}

/// Builds and sends digests through a [`Mailer`].
pub struct DigestBuilder<D, U, M>
where
    D: DigestRepository,
    U: UserRepository,
    M: Mailer,
{
    digests: D,
    users: U,
    mailer: M,
}

impl<D, U, M> DigestBuilder<D, U, M>
where
    D: DigestRepository,
    U: UserRepository,
    M: Mailer,
{
    pub fn new(digests: D, users: U, mailer: M) -> Self {
        Self {
            digests,
            users,
            mailer,
        }
    }

    /// Sends one digest period for `frequency`.
    ///
    /// The first run for a frequency opens a checkpoint at the current
    /// highest post id, so only later posts are ever sent.
    pub fn send_digest(&self, frequency: DigestFrequency) -> Result<DigestRun, DigestError> {
        let window_start = match self.digests.latest_history(frequency)? {
            Some(history) => history,
            None => {
                let last_post_id = self.digests.max_post_id()?;
                self.digests.create_history(frequency, last_post_id)?
            }
        };
        let recipients = self.users.list_digest_subscribers(frequency)?;
        let posts = self.digests.posts_after(window_start.last_post_id)?;
        // Posts inserted after the read above belong to the next window.
        let window_end = posts
            .last()
            .map_or(window_start.last_post_id, |post| post.id);

        for recipient in &recipients {
            let message = DigestMessage {
                checkpoint: &window_start,
                recipient,
                posts: &posts,
            };
            if let Err(err) = self.mailer.deliver(&message) {
                error!(
                    "event=digest_send module=digest status=error frequency={} user_id={} error={}",
                    frequency.as_db_str(),
                    recipient.id,
                    err
                );
                return Err(err.into());
            }
        }

        let next_checkpoint = self.digests.create_history(frequency, window_end)?;
        info!(
            "event=digest_send module=digest status=ok frequency={} recipients={} posts={} checkpoint_id={} last_post_id={}",
            frequency.as_db_str(),
            recipients.len(),
            posts.len(),
            next_checkpoint.id,
            next_checkpoint.last_post_id
        );

        Ok(DigestRun {
            window_start,
            next_checkpoint,
            recipients: recipients.len(),
            posts: posts.len(),
        })
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }
}
