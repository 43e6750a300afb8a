//! Answer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist answers and their soft-delete lifecycle.
//! - Own the acceptance transition (`accept_answer`) with atomic semantics.
//!
//! # Invariants
//! - New answers are only attached to active questions.
//! - `accept_answer` clears every other accepted answer of the question and
//!   sets the target in one IMMEDIATE transaction; the partial unique index
//!   `idx_answers_single_accepted` rejects any second accepted row.
//! - Default listings return active answers only, oldest first.

use crate::model::notification::Notification;
use crate::model::post::{Answer, AnswerId, QuestionId};
use crate::model::user::UserId;
use crate::repo::notification_repo::insert_notification;
use crate::repo::{ensure_connection_ready, parse_flag, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const ANSWER_SELECT_SQL: &str = "SELECT
    a.id AS id,
    a.question_id AS question_id,
    a.author_id AS author_id,
    a.body AS body,
    a.is_accepted AS is_accepted,
    a.is_active AS is_active,
    a.created_at AS created_at,
    a.updated_at AS updated_at,
    u.username AS author_username,
    (SELECT COALESCE(SUM(v.value), 0) FROM votes v WHERE v.answer_id = a.id) AS score
FROM answers a
INNER JOIN users u ON u.id = a.author_id";

/// Answer read model with author name and score computed at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub answer: Answer,
    pub author_username: String,
    /// Sum of stored vote values.
    pub score: i64,
}

/// Minimal view of a question needed by answer use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRef {
    pub id: QuestionId,
    pub author_id: UserId,
    pub title: String,
    pub is_active: bool,
}

/// Repository interface for answers and acceptance.
pub trait AnswerRepository {
    /// Loads the parent question header regardless of active state.
    fn parent_question(&self, question_id: QuestionId) -> RepoResult<Option<QuestionRef>>;
    /// Inserts an answer under an active question together with an optional
    /// notification, in one transaction.
    fn create_answer(&self, answer: &Answer, notification: Option<&Notification>)
        -> RepoResult<()>;
    /// Loads one answer; inactive rows only when `include_inactive`.
    fn get_answer(&self, id: AnswerId, include_inactive: bool)
        -> RepoResult<Option<AnswerRecord>>;
    /// Lists active answers of one question, oldest first.
    fn list_answers(&self, question_id: QuestionId) -> RepoResult<Vec<AnswerRecord>>;
    /// Replaces the body of an active answer and refreshes `updated_at`.
    fn update_answer_body(&self, id: AnswerId, body: &str) -> RepoResult<()>;
    /// Soft-deletes an answer. Idempotent for inactive answers.
    fn soft_delete_answer(&self, id: AnswerId) -> RepoResult<()>;
    /// Moves the accepted mark of the answer's question onto `id`, together
    /// with an optional notification, in one transaction.
    fn accept_answer(&self, id: AnswerId, notification: Option<&Notification>) -> RepoResult<()>;
    /// Returns the currently accepted answer of a question, if any.
    fn accepted_answer(&self, question_id: QuestionId) -> RepoResult<Option<AnswerId>>;
}

/// SQLite-backed answer repository.
pub struct SqliteAnswerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAnswerRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl AnswerRepository for SqliteAnswerRepository<'_> {
    fn parent_question(&self, question_id: QuestionId) -> RepoResult<Option<QuestionRef>> {
        self.conn
            .query_row(
                "SELECT id, author_id, title, is_active
                 FROM questions
                 WHERE id = ?1;",
                [question_id.to_string()],
                |row| Ok(parse_question_ref_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn create_answer(
        &self,
        answer: &Answer,
        notification: Option<&Notification>,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO answers (
                id,
                question_id,
                author_id,
                body,
                is_accepted,
                is_active
            )
            SELECT ?1, id, ?3, ?4, 0, 1
            FROM questions
            WHERE id = ?2
              AND is_active = 1;",
            params![
                answer.id.to_string(),
                answer.question_id.to_string(),
                answer.author_id.to_string(),
                answer.body.as_str(),
            ],
        )?;
        if inserted == 0 {
            return Err(RepoError::not_found("question", answer.question_id));
        }

        if let Some(notification) = notification {
            insert_notification(&tx, notification)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_answer(
        &self,
        id: AnswerId,
        include_inactive: bool,
    ) -> RepoResult<Option<AnswerRecord>> {
        self.conn
            .query_row(
                &format!(
                    "{ANSWER_SELECT_SQL}
                     WHERE a.id = ?1
                       AND (?2 = 1 OR a.is_active = 1);"
                ),
                params![id.to_string(), i64::from(include_inactive)],
                |row| Ok(parse_answer_record_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_answers(&self, question_id: QuestionId) -> RepoResult<Vec<AnswerRecord>> {
        query_active_answers(self.conn, question_id)
    }

    fn update_answer_body(&self, id: AnswerId, body: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE answers
             SET body = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_active = 1;",
            params![id.to_string(), body],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("answer", id));
        }
        Ok(())
    }

    fn soft_delete_answer(&self, id: AnswerId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE answers
             SET is_active = 0,
                 updated_at = CASE
                     WHEN is_active = 1 THEN (strftime('%s', 'now') * 1000)
                     ELSE updated_at
                 END
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("answer", id));
        }
        Ok(())
    }

    fn accept_answer(&self, id: AnswerId, notification: Option<&Notification>) -> RepoResult<()> {
        let answer_id = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let question_id: Option<String> = tx
            .query_row(
                "SELECT a.question_id
                 FROM answers a
                 INNER JOIN questions q ON q.id = a.question_id
                 WHERE a.id = ?1
                   AND a.is_active = 1
                   AND q.is_active = 1;",
                [answer_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(question_id) = question_id else {
            return Err(RepoError::not_found("answer", id));
        };

        tx.execute(
            "UPDATE answers
             SET is_accepted = 0
             WHERE question_id = ?1
               AND is_accepted = 1
               AND id <> ?2;",
            params![question_id.as_str(), answer_id.as_str()],
        )?;
        tx.execute(
            "UPDATE answers SET is_accepted = 1 WHERE id = ?1;",
            [answer_id.as_str()],
        )?;

        if let Some(notification) = notification {
            insert_notification(&tx, notification)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn accepted_answer(&self, question_id: QuestionId) -> RepoResult<Option<AnswerId>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT id
                 FROM answers
                 WHERE question_id = ?1
                   AND is_accepted = 1;",
                [question_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|text| parse_uuid(&text, "answers.id"))
            .transpose()
    }
}

/// Loads active answers of one question with scores.
pub(crate) fn query_active_answers(
    conn: &Connection,
    question_id: QuestionId,
) -> RepoResult<Vec<AnswerRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{ANSWER_SELECT_SQL}
         WHERE a.question_id = ?1
           AND a.is_active = 1
         ORDER BY a.created_at ASC, a.rowid ASC;"
    ))?;
    let mut rows = stmt.query([question_id.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_answer_record_row(row)?);
    }
    Ok(items)
}

fn parse_answer_record_row(row: &Row<'_>) -> RepoResult<AnswerRecord> {
    let id_text: String = row.get("id")?;
    let question_text: String = row.get("question_id")?;
    let author_text: String = row.get("author_id")?;

    Ok(AnswerRecord {
        answer: Answer {
            id: parse_uuid(&id_text, "answers.id")?,
            question_id: parse_uuid(&question_text, "answers.question_id")?,
            author_id: parse_uuid(&author_text, "answers.author_id")?,
            body: row.get("body")?,
            is_accepted: parse_flag(row.get("is_accepted")?, "answers.is_accepted")?,
            is_active: parse_flag(row.get("is_active")?, "answers.is_active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        },
        author_username: row.get("author_username")?,
        score: row.get("score")?,
    })
}

fn parse_question_ref_row(row: &Row<'_>) -> RepoResult<QuestionRef> {
    let id_text: String = row.get("id")?;
    let author_text: String = row.get("author_id")?;
    Ok(QuestionRef {
        id: parse_uuid(&id_text, "questions.id")?,
        author_id: parse_uuid(&author_text, "questions.author_id")?,
        title: row.get("title")?,
        is_active: parse_flag(row.get("is_active")?, "questions.is_active")?,
    })
}
