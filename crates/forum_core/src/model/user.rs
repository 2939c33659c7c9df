//! User reference model.
//!
//! Users are owned by an external account system; core only keeps the id,
//! a contact address and the digest subscription.

use crate::model::digest::DigestFrequency;
use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// `None` means the user receives no digest.
    pub digest_frequency: Option<DigestFrequency>,
}
