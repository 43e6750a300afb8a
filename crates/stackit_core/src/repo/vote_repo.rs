//! Vote ledger persistence.
//!
//! # Responsibility
//! - Apply one voter's request on one target as an upsert or delete.
//! - Recompute the target score from stored votes.
//!
//! # Invariants
//! - At most one row per (voter, question) and per (voter, answer); the
//!   UNIQUE constraints are the final guard against racing inserts.
//! - Mutation and score recomputation run in the same IMMEDIATE transaction,
//!   so the returned score reflects exactly the committed state.
//! - Votes on missing or inactive targets are rejected with `NotFound`.

use crate::model::user::UserId;
use crate::model::vote::{Vote, VoteDirection, VoteTarget};
use crate::repo::{ensure_connection_ready, parse_flag, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Repository interface for the vote ledger.
pub trait VoteRepository {
    /// Applies `direction` for `voter_id` on `target` and returns the new
    /// score. `None` removes the voter's vote if one exists.
    fn apply_vote(
        &self,
        voter_id: UserId,
        target: VoteTarget,
        direction: Option<VoteDirection>,
    ) -> RepoResult<i64>;
    /// Current score of a target, active or not. `None` if the target does
    /// not exist.
    fn score(&self, target: VoteTarget) -> RepoResult<Option<i64>>;
    /// The stored vote of one voter on one target.
    fn get_vote(&self, voter_id: UserId, target: VoteTarget) -> RepoResult<Option<Vote>>;
    /// Number of stored vote rows on a target.
    fn count_votes(&self, target: VoteTarget) -> RepoResult<u64>;
}

/// SQLite-backed vote repository.
pub struct SqliteVoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVoteRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl VoteRepository for SqliteVoteRepository<'_> {
    fn apply_vote(
        &self,
        voter_id: UserId,
        target: VoteTarget,
        direction: Option<VoteDirection>,
    ) -> RepoResult<i64> {
        let voter = voter_id.to_string();
        let target_id = target.id().to_string();
        let column = target_column(target);
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        match target_is_active(&tx, target)? {
            Some(true) => {}
            Some(false) | None => return Err(RepoError::not_found(target.entity(), target.id())),
        }

        let existing: Option<String> = tx
            .query_row(
                &format!("SELECT id FROM votes WHERE voter_id = ?1 AND {column} = ?2;"),
                params![voter.as_str(), target_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match (direction, existing) {
            (None, Some(vote_id)) => {
                tx.execute("DELETE FROM votes WHERE id = ?1;", [vote_id.as_str()])?;
            }
            (None, None) => {}
            (Some(direction), Some(vote_id)) => {
                tx.execute(
                    "UPDATE votes SET value = ?2 WHERE id = ?1;",
                    params![vote_id.as_str(), direction.value()],
                )?;
            }
            (Some(direction), None) => {
                tx.execute(
                    &format!(
                        "INSERT INTO votes (id, voter_id, {column}, value)
                         VALUES (?1, ?2, ?3, ?4);"
                    ),
                    params![
                        Uuid::new_v4().to_string(),
                        voter.as_str(),
                        target_id.as_str(),
                        direction.value(),
                    ],
                )?;
            }
        }

        let score = sum_votes(&tx, target)?;
        tx.commit()?;
        Ok(score)
    }

    fn score(&self, target: VoteTarget) -> RepoResult<Option<i64>> {
        if target_is_active(self.conn, target)?.is_none() {
            return Ok(None);
        }
        sum_votes(self.conn, target).map(Some)
    }

    fn get_vote(&self, voter_id: UserId, target: VoteTarget) -> RepoResult<Option<Vote>> {
        let column = target_column(target);
        let row: Option<(String, i64, i64)> = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, value, created_at
                     FROM votes
                     WHERE voter_id = ?1
                       AND {column} = ?2;"
                ),
                params![voter_id.to_string(), target.id().to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((id_text, value, created_at)) = row else {
            return Ok(None);
        };
        let direction = VoteDirection::from_stored(value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid vote value `{value}` in votes.value"))
        })?;

        Ok(Some(Vote {
            id: parse_uuid(&id_text, "votes.id")?,
            voter_id,
            target,
            direction,
            created_at,
        }))
    }

    fn count_votes(&self, target: VoteTarget) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM votes WHERE {} = ?1;",
                target_column(target)
            ),
            [target.id().to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn target_column(target: VoteTarget) -> &'static str {
    match target {
        VoteTarget::Question(_) => "question_id",
        VoteTarget::Answer(_) => "answer_id",
    }
}

/// `None` when the target row does not exist at all.
fn target_is_active(conn: &Connection, target: VoteTarget) -> RepoResult<Option<bool>> {
    let sql = match target {
        VoteTarget::Question(_) => "SELECT is_active FROM questions WHERE id = ?1;",
        VoteTarget::Answer(_) => "SELECT is_active FROM answers WHERE id = ?1;",
    };
    let flag: Option<i64> = conn
        .query_row(sql, [target.id().to_string()], |row| row.get(0))
        .optional()?;
    flag.map(|value| parse_flag(value, "is_active")).transpose()
}

fn sum_votes(conn: &Connection, target: VoteTarget) -> RepoResult<i64> {
    let score = conn.query_row(
        &format!(
            "SELECT COALESCE(SUM(value), 0) FROM votes WHERE {} = ?1;",
            target_column(target)
        ),
        [target.id().to_string()],
        |row| row.get(0),
    )?;
    Ok(score)
}
