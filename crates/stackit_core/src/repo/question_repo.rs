//! Question repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist questions together with their tag associations.
//! - Own tag find-or-create and tag-set replacement with atomic semantics.
//! - Provide the atomic view-counter increment and the listing query.
//!
//! # Invariants
//! - Question insert + tag links commit together or not at all.
//! - Tag lookup is exact and case-sensitive (`tags.name` uses BINARY
//!   collation); duplicate names collapse into one link.
//! - Writes on inactive questions fail with `NotFound`.
//! - View increments are a single `UPDATE ... views = views + 1` so
//!   concurrent readers never lose counts.

use crate::model::post::{Question, QuestionId};
use crate::repo::answer_repo::{query_active_answers, AnswerRecord};
use crate::repo::{
    bool_to_int, ensure_connection_ready, like_contains_pattern, parse_flag, parse_uuid,
    AppliedPage, Page, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

const QUESTION_SELECT_SQL: &str = "SELECT
    q.id AS id,
    q.title AS title,
    q.body AS body,
    q.author_id AS author_id,
    q.views AS views,
    q.is_active AS is_active,
    q.created_at AS created_at,
    q.updated_at AS updated_at,
    u.username AS author_username,
    (SELECT COALESCE(SUM(v.value), 0) FROM votes v WHERE v.question_id = q.id) AS score,
    (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id AND a.is_active = 1)
        AS answers_count
FROM questions q
INNER JOIN users u ON u.id = q.author_id";

/// Question read model with fields computed at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRecord {
    pub question: Question,
    pub author_username: String,
    /// Tag names sorted by name.
    pub tags: Vec<String>,
    /// Sum of stored vote values.
    pub score: i64,
    /// Number of active answers.
    pub answers_count: i64,
}

/// Field changes applied by `update_question`; values are pre-validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionChanges<'a> {
    pub title: Option<&'a str>,
    pub body: Option<&'a str>,
    pub tags: Option<&'a [String]>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuestionSort {
    #[default]
    CreatedAt,
    Views,
    Votes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter and ordering options for listing active questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionListQuery {
    /// Substring matched against title or body.
    pub search: Option<String>,
    /// Any-of exact tag name filter. Empty means no filter.
    pub tags: Vec<String>,
    pub sort: QuestionSort,
    pub order: SortOrder,
}

/// Repository interface for questions and their tag links.
pub trait QuestionRepository {
    /// Inserts a question and links `tags` (find-or-create) atomically.
    fn create_question(&self, question: &Question, tags: &[String]) -> RepoResult<()>;
    /// Applies present fields to an active question and refreshes `updated_at`.
    fn update_question(&self, id: QuestionId, changes: &QuestionChanges<'_>) -> RepoResult<()>;
    /// Soft-deletes a question. Idempotent for inactive questions.
    fn soft_delete_question(&self, id: QuestionId) -> RepoResult<()>;
    /// Loads one question; inactive rows only when `include_inactive`.
    fn get_question(
        &self,
        id: QuestionId,
        include_inactive: bool,
    ) -> RepoResult<Option<QuestionRecord>>;
    /// Increments the view counter of an active question by one.
    fn record_view(&self, id: QuestionId) -> RepoResult<()>;
    /// Lists active answers of one question.
    fn list_answers(&self, id: QuestionId) -> RepoResult<Vec<AnswerRecord>>;
    /// Lists active questions matching `query`.
    fn list_questions(
        &self,
        query: &QuestionListQuery,
        page: AppliedPage,
    ) -> RepoResult<Page<QuestionRecord>>;
}

/// SQLite-backed question repository.
pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn create_question(&self, question: &Question, tags: &[String]) -> RepoResult<()> {
        let question_id = question.id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute(
            "INSERT INTO questions (
                id,
                title,
                body,
                author_id,
                views,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                question_id.as_str(),
                question.title.as_str(),
                question.body.as_str(),
                question.author_id.to_string(),
                question.views,
                bool_to_int(question.is_active),
            ],
        )?;
        link_tags(&tx, question_id.as_str(), tags)?;

        tx.commit()?;
        Ok(())
    }

    fn update_question(&self, id: QuestionId, changes: &QuestionChanges<'_>) -> RepoResult<()> {
        let question_id = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let changed = tx.execute(
            "UPDATE questions
             SET title = COALESCE(?2, title),
                 body = COALESCE(?3, body),
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_active = 1;",
            params![question_id.as_str(), changes.title, changes.body],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("question", id));
        }

        if let Some(tags) = changes.tags {
            tx.execute(
                "DELETE FROM question_tags WHERE question_id = ?1;",
                [question_id.as_str()],
            )?;
            link_tags(&tx, question_id.as_str(), tags)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn soft_delete_question(&self, id: QuestionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE questions
             SET is_active = 0,
                 updated_at = CASE
                     WHEN is_active = 1 THEN (strftime('%s', 'now') * 1000)
                     ELSE updated_at
                 END
             WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("question", id));
        }
        Ok(())
    }

    fn get_question(
        &self,
        id: QuestionId,
        include_inactive: bool,
    ) -> RepoResult<Option<QuestionRecord>> {
        self.conn
            .query_row(
                &format!(
                    "{QUESTION_SELECT_SQL}
                     WHERE q.id = ?1
                       AND (?2 = 1 OR q.is_active = 1);"
                ),
                params![id.to_string(), i64::from(include_inactive)],
                |row| Ok(parse_question_record_row(self.conn, row)),
            )
            .optional()?
            .transpose()
    }

    fn record_view(&self, id: QuestionId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE questions
             SET views = views + 1
             WHERE id = ?1
               AND is_active = 1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("question", id));
        }
        Ok(())
    }

    fn list_answers(&self, id: QuestionId) -> RepoResult<Vec<AnswerRecord>> {
        query_active_answers(self.conn, id)
    }

    fn list_questions(
        &self,
        query: &QuestionListQuery,
        page: AppliedPage,
    ) -> RepoResult<Page<QuestionRecord>> {
        let mut filter = String::from(" WHERE q.is_active = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                filter.push_str(
                    " AND (q.title LIKE ? ESCAPE '\\' OR q.body LIKE ? ESCAPE '\\')",
                );
                let pattern = like_contains_pattern(search);
                bind_values.push(Value::Text(pattern.clone()));
                bind_values.push(Value::Text(pattern));
            }
        }

        if !query.tags.is_empty() {
            let placeholders = vec!["?"; query.tags.len()].join(", ");
            filter.push_str(&format!(
                " AND EXISTS (
                    SELECT 1
                    FROM question_tags qt
                    INNER JOIN tags t ON t.id = qt.tag_id
                    WHERE qt.question_id = q.id
                      AND t.name IN ({placeholders})
                )"
            ));
            bind_values.extend(query.tags.iter().cloned().map(Value::Text));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM questions q{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let direction = query.order.as_sql();
        let order_by = match query.sort {
            QuestionSort::CreatedAt => {
                format!("q.created_at {direction}, q.rowid {direction}")
            }
            QuestionSort::Views => format!("q.views {direction}, q.created_at DESC, q.rowid DESC"),
            QuestionSort::Votes => format!("score {direction}, q.created_at DESC, q.rowid DESC"),
        };

        let sql = format!("{QUESTION_SELECT_SQL}{filter} ORDER BY {order_by} LIMIT ? OFFSET ?;");
        bind_values.push(Value::Integer(i64::from(page.per_page)));
        bind_values.push(Value::Integer(page.offset()));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_question_record_row(self.conn, row)?);
        }

        Ok(Page {
            items,
            total: total as u64,
            page: page.page,
            per_page: page.per_page,
        })
    }
}

fn link_tags(tx: &Transaction<'_>, question_id: &str, tags: &[String]) -> RepoResult<()> {
    for tag in tags {
        tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [tag.as_str()])?;
        tx.execute(
            "INSERT OR IGNORE INTO question_tags (question_id, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2;",
            params![question_id, tag.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags_for_question(conn: &Connection, question_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM question_tags qt
         INNER JOIN tags t ON t.id = qt.tag_id
         WHERE qt.question_id = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([question_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

fn parse_question_record_row(conn: &Connection, row: &Row<'_>) -> RepoResult<QuestionRecord> {
    let id_text: String = row.get("id")?;
    let author_text: String = row.get("author_id")?;
    let tags = load_tags_for_question(conn, &id_text)?;

    Ok(QuestionRecord {
        question: Question {
            id: parse_uuid(&id_text, "questions.id")?,
            title: row.get("title")?,
            body: row.get("body")?,
            author_id: parse_uuid(&author_text, "questions.author_id")?,
            views: row.get("views")?,
            is_active: parse_flag(row.get("is_active")?, "questions.is_active")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        },
        author_username: row.get("author_username")?,
        tags,
        score: row.get("score")?,
        answers_count: row.get("answers_count")?,
    })
}
