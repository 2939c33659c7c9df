//! Vote domain model.
//!
//! # Invariants
//! - At most one vote exists per `(post_id, user_id)`.

use crate::model::post::PostId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

pub type VoteId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub post_id: PostId,
    pub user_id: UserId,
    /// Epoch milliseconds.
    pub created_at: i64,
}
