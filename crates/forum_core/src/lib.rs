//! Core domain logic for the forum: posts, tags, comments, votes, search,
//! social announcements and digests.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod digest;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod social;

pub use config::{ConfigError, ForumConfig};
pub use digest::builder::{DigestBuilder, DigestRun};
pub use digest::{DigestError, DigestMessage, MailError, Mailer};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::comment::{Comment, CommentId, CommentValidationError};
pub use model::digest::{DigestFrequency, DigestHistory};
pub use model::post::{
    KindBehavior, NewPost, Post, PostId, PostKind, PostUpdate, PostValidationError,
};
pub use model::tag::{parse_tags_string, Tag, TagId};
pub use model::user::{User, UserId};
pub use model::vote::Vote;
pub use repo::comment_repo::{CommentRepository, SqliteCommentRepository};
pub use repo::digest_repo::{DigestRepository, SqliteDigestRepository};
pub use repo::post_repo::{
    PostListQuery, PostRepository, RepoError, RepoResult, SqlitePostRepository,
};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::vote_repo::{SqliteVoteRepository, VoteRepository};
pub use search::post_search::{search_posts, PostSearchQuery, SearchError, SearchResult};
pub use service::post_service::{PostService, PostServiceError};
pub use social::tweet::TweetFormatter;
pub use social::{NoopSocialPoster, SocialError, SocialPoster};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
