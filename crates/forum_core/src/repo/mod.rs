//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - Duplicate-key conditions for tags and votes never escape as errors.

pub mod comment_repo;
pub mod digest_repo;
pub mod post_repo;
pub mod tag_repo;
pub mod user_repo;
pub mod vote_repo;
