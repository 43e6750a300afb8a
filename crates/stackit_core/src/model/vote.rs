//! Vote domain model.
//!
//! # Invariants
//! - A vote targets exactly one question or one answer; `VoteTarget` makes
//!   "both" and "neither" unrepresentable.
//! - Stored values are only `-1` or `1`. A request value of `0` means
//!   "remove my vote" and never reaches storage.

use crate::model::post::{AnswerId, QuestionId};
use crate::model::user::UserId;
use crate::model::validation::ModelValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type VoteId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum VoteTarget {
    Question(QuestionId),
    Answer(AnswerId),
}

impl VoteTarget {
    pub fn entity(self) -> &'static str {
        match self {
            Self::Question(_) => "question",
            Self::Answer(_) => "answer",
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Question(id) | Self::Answer(id) => id,
        }
    }
}

impl Display for VoteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity(), self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn value(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    pub fn from_stored(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Up),
            -1 => Some(Self::Down),
            _ => None,
        }
    }
}

/// Parses a request-level vote value.
///
/// Returns `Ok(None)` for `0` (remove), `Ok(Some(_))` for `±1`.
pub fn parse_vote_value(value: i64) -> Result<Option<VoteDirection>, ModelValidationError> {
    match value {
        0 => Ok(None),
        other => VoteDirection::from_stored(other)
            .map(Some)
            .ok_or(ModelValidationError::InvalidVoteValue(other)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub voter_id: UserId,
    pub target: VoteTarget,
    pub direction: VoteDirection,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{parse_vote_value, VoteDirection};
    use crate::model::validation::ModelValidationError;

    #[test]
    fn zero_means_remove_and_out_of_range_is_rejected() {
        assert_eq!(parse_vote_value(0).unwrap(), None);
        assert_eq!(parse_vote_value(1).unwrap(), Some(VoteDirection::Up));
        assert_eq!(parse_vote_value(-1).unwrap(), Some(VoteDirection::Down));
        assert_eq!(
            parse_vote_value(2).unwrap_err(),
            ModelValidationError::InvalidVoteValue(2)
        );
    }
}
