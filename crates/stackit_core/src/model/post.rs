//! Question and answer domain models.
//!
//! # Responsibility
//! - Define the persisted shape of questions and answers.
//! - Normalize titles and tag names before they reach storage.
//!
//! # Invariants
//! - `is_active = false` is a soft delete; rows and their votes are kept.
//! - Only the acceptance transition writes `Answer::is_accepted`.
//! - Tag names are compared case-sensitively and deduplicated by first
//!   occurrence.

use crate::model::user::UserId;
use crate::model::validation::{
    required_text, ModelValidationError, TAG_NAME_MAX_CHARS, TITLE_MAX_CHARS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

pub type QuestionId = Uuid;
pub type AnswerId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    /// Sanitized rich-text body.
    pub body: String,
    pub author_id: UserId,
    pub views: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Question {
    /// Builds a new active question; timestamps are assigned by the store.
    pub fn new(author_id: UserId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            author_id,
            views: 0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub author_id: UserId,
    /// Sanitized rich-text body.
    pub body: String,
    pub is_accepted: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Answer {
    /// Builds a new active, not-accepted answer.
    pub fn new(question_id: QuestionId, author_id: UserId, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            author_id,
            body: body.into(),
            is_accepted: false,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }
}

/// Partial question update. `None` leaves the stored value untouched;
/// `Some` replaces it entirely (tags are cleared and re-added, not merged).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Trims a title and enforces the non-empty and length rules.
pub fn normalize_title(title: &str) -> Result<String, ModelValidationError> {
    required_text("title", title, Some(TITLE_MAX_CHARS))
}

/// Trims tag names, rejects blank/oversized ones and collapses duplicates.
///
/// Matching is exact and case-sensitive: `React` and `react` stay distinct.
pub fn normalize_tag_names(tags: &[String]) -> Result<Vec<String>, ModelValidationError> {
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(tags.len());
    for tag in tags {
        let name = required_text("tag", tag, Some(TAG_NAME_MAX_CHARS))?;
        if seen.insert(name.clone()) {
            normalized.push(name);
        }
    }
    Ok(normalized)
}
