//! Tweet content formatting.
//!
//! # Invariants
//! - Output is `title + " " + link` and never longer than `max_chars`.
//! - A title that does not fit is cut to exactly the remaining budget, so
//!   the output is then exactly `max_chars` long. No ellipsis is added.
//! - With no room left for the title the output is the link alone, cut to
//!   `max_chars` if even the link does not fit.
//! - Lengths are counted in `char`s, never bytes.

use crate::model::post::PostId;

/// Default short-link prefix; the post id is appended verbatim.
pub const DEFAULT_SHORT_LINK_BASE: &str = "http://rbga.me/";
/// Default status length limit.
pub const DEFAULT_TWEET_MAX_CHARS: usize = 140;
/// Digits of the largest post id (`i64::MAX`).
pub const MAX_POST_ID_DIGITS: usize = 19;

/// Builds status text for a newly created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetFormatter {
    short_link_base: String,
    max_chars: usize,
}

impl Default for TweetFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_SHORT_LINK_BASE, DEFAULT_TWEET_MAX_CHARS)
    }
}

impl TweetFormatter {
    pub fn new(short_link_base: impl Into<String>, max_chars: usize) -> Self {
        Self {
            short_link_base: short_link_base.into(),
            max_chars,
        }
    }

    /// Short link for `post_id`.
    pub fn short_link(&self, post_id: PostId) -> String {
        format!("{}{post_id}", self.short_link_base)
    }

    /// Formats `title` and the short link within the length limit.
    pub fn format(&self, post_id: PostId, title: &str) -> String {
        let link = self.short_link(post_id);
        let link_chars = link.chars().count();
        if link_chars >= self.max_chars {
            return link.chars().take(self.max_chars).collect();
        }

        let budget = self.max_chars - link_chars - 1;
        if budget == 0 {
            return link;
        }

        let mut output =
            String::with_capacity(title.len().min(budget.saturating_mul(4)) + link.len() + 1);
        output.extend(title.chars().take(budget));
        output.push(' ');
        output.push_str(&link);
        output
    }

    /// Smallest `max_chars` that keeps the link for any post id whole.
    pub fn min_max_chars(short_link_base: &str) -> usize {
        short_link_base.chars().count() + 1 + MAX_POST_ID_DIGITS
    }
}
