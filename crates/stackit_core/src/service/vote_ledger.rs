//! Vote ledger use-cases.
//!
//! # Responsibility
//! - Apply one actor's vote request to a question or answer.
//! - Report the recomputed score and the actor's resulting vote.
//!
//! # Invariants
//! - At most one stored vote per voter and target.
//! - Request value `0` removes the vote; `1`/`-1` insert or overwrite it.
//! - Scores are sums of stored values, never cached counters.
//! - Votes on soft-deleted targets are rejected as `NotFound`.
//! - A uniqueness race is retried once before surfacing `Conflict`.

use crate::model::vote::{parse_vote_value, VoteDirection, VoteTarget};
use crate::repo::vote_repo::VoteRepository;
use crate::repo::RepoError;
use crate::service::{log_failure, Actor, ServiceError, ServiceResult};
use log::{info, warn};
use serde::Serialize;

const VOTE_ATTEMPTS: usize = 2;

/// Result of one vote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub target: VoteTarget,
    /// Score after the mutation.
    pub score: i64,
    /// The voter's vote after the mutation, `0` when none is stored.
    pub user_vote: i64,
}

/// Vote ledger facade over repository implementations.
pub struct VoteLedger<R: VoteRepository> {
    repo: R,
}

impl<R: VoteRepository> VoteLedger<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Casts, changes or removes `voter`'s vote on `target`.
    ///
    /// `value` must be `-1`, `0` or `1`.
    pub fn cast_vote(
        &self,
        voter: &Actor,
        target: VoteTarget,
        value: i64,
    ) -> ServiceResult<VoteOutcome> {
        let result = self.cast_vote_inner(voter, target, value);
        match &result {
            Ok(outcome) => info!(
                "event=vote_cast module=vote status=ok target={target} voter_id={} value={} score={}",
                voter.user_id, outcome.user_vote, outcome.score
            ),
            Err(err) => log_failure("vote_cast", "vote", err),
        }
        result
    }

    fn cast_vote_inner(
        &self,
        voter: &Actor,
        target: VoteTarget,
        value: i64,
    ) -> ServiceResult<VoteOutcome> {
        let direction = parse_vote_value(value)?;

        let mut attempt = 1;
        let score = loop {
            match self.repo.apply_vote(voter.user_id, target, direction) {
                Ok(score) => break score,
                Err(RepoError::Conflict(_)) if attempt < VOTE_ATTEMPTS => {
                    warn!(
                        "event=vote_cast module=vote status=retry target={target} voter_id={} attempt={attempt}",
                        voter.user_id
                    );
                    attempt += 1;
                }
                Err(RepoError::Conflict(_)) => {
                    return Err(ServiceError::Conflict(format!(
                        "concurrent vote on {target} could not be applied"
                    )));
                }
                Err(err) => return Err(err.into()),
            }
        };

        Ok(VoteOutcome {
            target,
            score,
            user_vote: direction.map_or(0, VoteDirection::value),
        })
    }

    /// Current score of a target, including soft-deleted targets.
    pub fn score(&self, target: VoteTarget) -> ServiceResult<i64> {
        self.repo
            .score(target)?
            .ok_or_else(|| ServiceError::not_found(target.entity(), target.id()))
    }

    /// The voter's stored vote on a target, if any.
    pub fn current_vote(
        &self,
        voter: &Actor,
        target: VoteTarget,
    ) -> ServiceResult<Option<VoteDirection>> {
        Ok(self
            .repo
            .get_vote(voter.user_id, target)?
            .map(|vote| vote.direction))
    }
}
