//! Forum domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own pure normalization/validation rules that do not touch storage.
//!
//! # Invariants
//! - Every persisted object is identified by a store-assigned `i64` id.
//! - Tag titles are always trimmed and lower-cased before they are compared.

pub mod comment;
pub mod digest;
pub mod post;
pub mod tag;
pub mod user;
pub mod vote;
