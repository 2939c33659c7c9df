//! Post domain model.
//!
//! # Responsibility
//! - Define the post record, its write models, and kind-specific behavior.
//! - Validate write models before they reach persistence.
//! - Derive `body_html` from `body_markdown`.
//!
//! # Invariants
//! - `title` is never blank for a persisted post.
//! - Kinds whose behavior has `requires_url` carry a non-blank `url`.
//! - `tags` on a read model are lower-cased and sorted by title.

use crate::model::user::UserId;
use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned post identifier.
pub type PostId = i64;

/// Post variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    /// Discussion hosted on the forum itself.
    Internal,
    /// Link to content hosted elsewhere.
    External,
}

/// Kind-specific behavior, looked up through [`PostKind::behavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindBehavior {
    /// Discriminator persisted in `posts.type`.
    pub type_name: &'static str,
    /// Short human-readable label used in logs.
    pub label: &'static str,
    /// Whether posts of this kind must carry a `url`.
    pub requires_url: bool,
}

const KIND_TABLE: &[(PostKind, KindBehavior)] = &[
    (
        PostKind::Internal,
        KindBehavior {
            type_name: "InternalPost",
            label: "internal",
            requires_url: false,
        },
    ),
    (
        PostKind::External,
        KindBehavior {
            type_name: "ExternalPost",
            label: "external",
            requires_url: true,
        },
    ),
];

impl PostKind {
    /// All kinds, in table order.
    pub const ALL: [PostKind; 2] = [PostKind::Internal, PostKind::External];

    /// Resolves kind-specific behavior from the dispatch table.
    pub fn behavior(self) -> &'static KindBehavior {
        KIND_TABLE
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, behavior)| behavior)
            .unwrap_or(&KIND_TABLE[0].1)
    }

    /// Discriminator persisted in `posts.type`.
    pub fn type_name(self) -> &'static str {
        self.behavior().type_name
    }

    /// Parses a persisted discriminator.
    pub fn from_type_name(value: &str) -> Option<Self> {
        KIND_TABLE
            .iter()
            .find(|(_, behavior)| behavior.type_name == value)
            .map(|(kind, _)| *kind)
    }
}

/// Validation failures for post write models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostValidationError {
    /// Title is empty or whitespace only.
    MissingTitle,
    /// The kind requires a link target but none was given.
    MissingUrl(PostKind),
}

impl Display for PostValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTitle => write!(f, "post title must be present"),
            Self::MissingUrl(kind) => {
                write!(f, "{} posts must have a url", kind.behavior().label)
            }
        }
    }
}

impl Error for PostValidationError {}

/// Persisted post read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    /// Author.
    pub user_id: UserId,
    /// Serialized as `type` to match the persisted column name.
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    /// Markdown source, the searchable body.
    pub body_markdown: String,
    /// HTML rendered from `body_markdown` at write time.
    pub body_html: String,
    pub url: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    /// Associated tag titles, sorted.
    pub tags: Vec<String>,
}

/// Write model for post creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub user_id: UserId,
    pub kind: PostKind,
    pub title: String,
    pub body_markdown: String,
    pub url: Option<String>,
    /// Free-text tag list applied right after creation.
    pub tags_string: Option<String>,
}

impl NewPost {
    /// Creates an internal discussion post with an empty body.
    pub fn internal(user_id: UserId, title: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: PostKind::Internal,
            title: title.into(),
            body_markdown: String::new(),
            url: None,
            tags_string: None,
        }
    }

    /// Creates an external link post.
    pub fn external(user_id: UserId, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: PostKind::External,
            title: title.into(),
            body_markdown: String::new(),
            url: Some(url.into()),
            tags_string: None,
        }
    }

    pub fn with_body(mut self, body_markdown: impl Into<String>) -> Self {
        self.body_markdown = body_markdown.into();
        self
    }

    pub fn with_tags(mut self, tags_string: impl Into<String>) -> Self {
        self.tags_string = Some(tags_string.into());
        self
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), PostValidationError> {
        validate_post_fields(self.kind, &self.title, self.url.as_deref())
    }
}

/// Write model for full post replacement.
///
/// Kind and author are immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUpdate {
    pub title: String,
    pub body_markdown: String,
    pub url: Option<String>,
    /// `Some` replaces the whole tag set; `None` leaves tags untouched.
    pub tags_string: Option<String>,
}

impl PostUpdate {
    /// Builds an update that keeps the current field values of `post`.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            body_markdown: post.body_markdown.clone(),
            url: post.url.clone(),
            tags_string: None,
        }
    }

    pub fn validate(&self, kind: PostKind) -> Result<(), PostValidationError> {
        validate_post_fields(kind, &self.title, self.url.as_deref())
    }
}

fn validate_post_fields(
    kind: PostKind,
    title: &str,
    url: Option<&str>,
) -> Result<(), PostValidationError> {
    if title.trim().is_empty() {
        return Err(PostValidationError::MissingTitle);
    }
    let has_url = url.is_some_and(|value| !value.trim().is_empty());
    if kind.behavior().requires_url && !has_url {
        return Err(PostValidationError::MissingUrl(kind));
    }
    Ok(())
}

/// Renders markdown to HTML for `body_html`.
pub fn render_markdown_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(markdown, options);
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

#[cfg(test)]
mod tests {
    use super::{render_markdown_html, NewPost, PostKind, PostValidationError};

    #[test]
    fn kind_table_round_trips_type_names() {
        for kind in PostKind::ALL {
            assert_eq!(PostKind::from_type_name(kind.type_name()), Some(kind));
        }
        assert_eq!(PostKind::from_type_name("Post"), None);
    }

    #[test]
    fn blank_title_is_rejected() {
        let post = NewPost::internal(1, "   ");
        assert_eq!(post.validate(), Err(PostValidationError::MissingTitle));
    }

    #[test]
    fn external_post_requires_url() {
        let mut post = NewPost::external(1, "Link", "https://example.com");
        assert_eq!(post.validate(), Ok(()));

        post.url = Some(" ".to_string());
        assert_eq!(
            post.validate(),
            Err(PostValidationError::MissingUrl(PostKind::External))
        );
    }

    #[test]
    fn markdown_renders_to_html() {
        let html = render_markdown_html("# Title\n\nSome **bold** text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }
}
