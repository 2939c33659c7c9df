//! Post use-case service.
//!
//! # Responsibility
//! - Create/update/delete posts and apply free-text tag strings.
//! - Announce new posts through the social posting collaborator.
//! - Expose comment and vote use-cases.
//!
//! # Invariants
//! - Invalid write models are rejected before anything is persisted.
//! - A post and its tag string are persisted atomically.
//! - Applying a tag string replaces the whole tag set.
//! - `SocialPoster::publish` runs exactly once per successful creation and
//!   its failure is returned, not retried.

use crate::model::comment::Comment;
use crate::model::post::{NewPost, Post, PostId, PostKind, PostUpdate, PostValidationError};
use crate::model::user::UserId;
use crate::repo::post_repo::{PostListQuery, PostRepository, RepoError, RepoResult};
use crate::social::tweet::TweetFormatter;
use crate::social::{SocialError, SocialPoster};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for post use-cases.
#[derive(Debug)]
pub enum PostServiceError {
    /// Write model failed validation; nothing was persisted.
    Invalid(PostValidationError),
    /// Target post does not exist.
    PostNotFound(PostId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Post was persisted but announcing it failed.
    SocialPost { post_id: PostId, source: SocialError },
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for PostServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::PostNotFound(post_id) => write!(f, "post not found: {post_id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::SocialPost { post_id, source } => {
                write!(f, "post {post_id} created but not announced: {source}")
            }
            Self::InconsistentState(details) => write!(f, "inconsistent post state: {details}"),
        }
    }
}

impl Error for PostServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::SocialPost { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<RepoError> for PostServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(post_id) => Self::PostNotFound(post_id),
            RepoError::Validation(err) => Self::Invalid(err),
            other => Self::Repo(other),
        }
    }
}

impl From<PostValidationError> for PostServiceError {
    fn from(value: PostValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Post service facade over a repository and a social poster.
pub struct PostService<R: PostRepository, S: SocialPoster> {
    repo: R,
    poster: S,
    formatter: TweetFormatter,
}

impl<R: PostRepository, S: SocialPoster> PostService<R, S> {
    /// Creates a service with the default tweet format.
    pub fn new(repo: R, poster: S) -> Self {
        Self::with_formatter(repo, poster, TweetFormatter::default())
    }

    pub fn with_formatter(repo: R, poster: S, formatter: TweetFormatter) -> Self {
        Self {
            repo,
            poster,
            formatter,
        }
    }

    /// Creates a post, applies its tag string and announces it.
    ///
    /// The post and its tags are written atomically; a failed tag step leaves
    /// nothing behind. On `SocialPost` errors the post (and its tags) stay persisted.
    pub fn create_post(&mut self, new_post: NewPost) -> Result<Post, PostServiceError> {
        new_post.validate()?;

        let post_id = self.repo.create_post(&new_post)?;
        let post = self.read_back(post_id, "created post not found in read-back")?;
        let content = self.formatter.format(post.id, &post.title);
        if let Err(err) = self.poster.publish(&content, &post) {
            error!(
                "event=post_announce module=service status=error post_id={} error={}",
                post.id, err
            );
            return Err(PostServiceError::SocialPost {
                post_id: post.id,
                source: err,
            });
        }

        info!(
            "event=post_announce module=service status=ok post_id={} tweet_chars={}",
            post.id,
            content.chars().count()
        );
        Ok(post)
    }

    /// Replaces title/body/url; replaces tags when `tags_string` is set.
    pub fn update_post(
        &mut self,
        post_id: PostId,
        update: PostUpdate,
    ) -> Result<Post, PostServiceError> {
        self.repo.update_post(post_id, &update)?;
        self.read_back(post_id, "updated post not found in read-back")
    }

    /// Replaces the full tag set of a post from a free-text tag string.
    pub fn set_tags_string(
        &mut self,
        post_id: PostId,
        tags_string: &str,
    ) -> Result<Post, PostServiceError> {
        self.apply_tags_string(post_id, tags_string)?;
        self.read_back(post_id, "post missing after tag replacement")
    }

    pub fn get_post(&self, post_id: PostId) -> RepoResult<Option<Post>> {
        self.repo.get_post(post_id)
    }

    /// Lists posts newest first, optionally restricted to one kind.
    pub fn list_posts(
        &self,
        kind: Option<PostKind>,
        limit: Option<u32>,
        offset: u32,
    ) -> RepoResult<Vec<Post>> {
        self.repo.list_posts(&PostListQuery {
            kind,
            limit,
            offset,
        })
    }

    pub fn delete_post(&self, post_id: PostId) -> Result<(), PostServiceError> {
        self.repo.delete_post(post_id)?;
        Ok(())
    }

    pub fn add_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        body: &str,
    ) -> Result<Comment, PostServiceError> {
        Ok(self.repo.add_comment(post_id, user_id, body)?)
    }

    pub fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<Comment>> {
        self.repo.list_comments(post_id)
    }

    /// Records a vote; voting twice is a silent no-op.
    pub fn add_vote(&self, post_id: PostId, user_id: UserId) -> Result<(), PostServiceError> {
        Ok(self.repo.add_vote(post_id, user_id)?)
    }

    pub fn has_voted(&self, post_id: PostId, user_id: UserId) -> RepoResult<bool> {
        self.repo.has_voted(post_id, user_id)
    }

    pub fn count_votes(&self, post_id: PostId) -> RepoResult<u32> {
        self.repo.count_votes(post_id)
    }

    /// Tweet text for an already persisted post.
    pub fn tweet_content(&self, post: &Post) -> String {
        self.formatter.format(post.id, &post.title)
    }

    pub fn poster(&self) -> &S {
        &self.poster
    }

    fn apply_tags_string(&mut self, post_id: PostId, tags_string: &str) -> RepoResult<()> {
        let tags = self.repo.resolve_tags(tags_string)?;
        self.repo.set_post_tags(post_id, &tags)
    }

    fn read_back(
        &self,
        post_id: PostId,
        missing: &'static str,
    ) -> Result<Post, PostServiceError> {
        self.repo
            .get_post(post_id)?
            .ok_or(PostServiceError::InconsistentState(missing))
    }
}
