//! Notification domain model.
//!
//! # Invariants
//! - `payload` is an opaque JSON object; core only writes ids into it.
//! - Messages are capped at `NOTIFICATION_MESSAGE_MAX_CHARS`.

use crate::model::user::UserId;
use crate::model::validation::NOTIFICATION_MESSAGE_MAX_CHARS;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type NotificationId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone answered the recipient's question.
    Answer,
    /// The recipient's answer was accepted.
    Accept,
    Vote,
    Mention,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Accept => "accept",
            Self::Vote => "vote",
            Self::Mention => "mention",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "answer" => Some(Self::Answer),
            "accept" => Some(Self::Accept),
            "vote" => Some(Self::Vote),
            "mention" => Some(Self::Mention),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(rename = "data")]
    pub payload: Value,
    pub is_read: bool,
    pub created_at: i64,
}

impl Notification {
    /// Builds an unread notification with a generated id and capped message.
    pub fn new(
        recipient_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        payload: Value,
    ) -> Self {
        let message = message.into();
        Self {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            message: truncate_chars(&message, NOTIFICATION_MESSAGE_MAX_CHARS),
            payload,
            is_read: false,
            created_at: 0,
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
