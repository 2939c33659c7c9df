//! Tag domain model and tag-string parsing.
//!
//! # Responsibility
//! - Define the tag record.
//! - Parse free-text tag strings into normalized, deduplicated titles.
//!
//! # Invariants
//! - A normalized title is trimmed, lower-cased and non-empty.
//! - Parsed titles keep first-occurrence order and contain no duplicates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

static TAG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,\s]+").expect("valid tag separator regex"));

/// Store-assigned tag identifier.
pub type TagId = i64;

/// Tag entity. `title` is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub title: String,
}

/// Normalizes one tag title; returns `None` for blank input.
pub fn normalize_tag_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Splits a tag string on any run of commas and/or whitespace.
///
/// Returns normalized titles in first-occurrence order.
pub fn parse_tags_string(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    TAG_SEPARATOR_RE
        .split(raw)
        .filter_map(normalize_tag_title)
        .filter(|title| seen.insert(title.clone()))
        .collect()
}
