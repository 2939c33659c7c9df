//! Post search entry points.
//!
//! # Responsibility
//! - Expose substring search across post title, tags, comments and body.
//! - Keep result shaping inside core.

pub mod post_search;
