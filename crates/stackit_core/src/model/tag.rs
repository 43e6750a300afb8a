//! Tag domain model.
//!
//! Tags are found-or-created by exact name when questions are written; the
//! question backref is a repository query (`question_count`).

use serde::{Deserialize, Serialize};

pub type TagId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
}
