//! Tag repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `tags.name` is unique and case-sensitive.
//! - `question_count` only counts active questions.

use crate::model::tag::Tag;
use crate::repo::{ensure_connection_ready, like_contains_pattern, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const TAG_SELECT_SQL: &str = "SELECT
    t.id AS id,
    t.name AS name,
    t.description AS description,
    t.created_at AS created_at,
    (
        SELECT COUNT(*)
        FROM question_tags qt
        INNER JOIN questions q ON q.id = qt.question_id
        WHERE qt.tag_id = t.id
          AND q.is_active = 1
    ) AS question_count
FROM tags t";

/// Tag read model with its active question count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub tag: Tag,
    pub question_count: i64,
}

/// Repository interface for tags.
pub trait TagRepository {
    /// Inserts a tag; duplicate names fail with `Conflict`.
    fn create_tag(&self, name: &str, description: Option<&str>) -> RepoResult<TagRecord>;
    /// Loads one tag by exact name.
    fn get_tag(&self, name: &str) -> RepoResult<Option<TagRecord>>;
    /// Lists tags by name, optionally filtered by substring.
    fn list_tags(&self, search: Option<&str>, limit: u32) -> RepoResult<Vec<TagRecord>>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn create_tag(&self, name: &str, description: Option<&str>) -> RepoResult<TagRecord> {
        self.conn.execute(
            "INSERT INTO tags (name, description) VALUES (?1, ?2);",
            params![name, description],
        )?;
        self.get_tag(name)?
            .ok_or_else(|| RepoError::InvalidData("created tag missing on read-back".to_string()))
    }

    fn get_tag(&self, name: &str) -> RepoResult<Option<TagRecord>> {
        self.conn
            .query_row(
                &format!("{TAG_SELECT_SQL} WHERE t.name = ?1;"),
                [name],
                |row| Ok(parse_tag_record_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_tags(&self, search: Option<&str>, limit: u32) -> RepoResult<Vec<TagRecord>> {
        let mut sql = String::from(TAG_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(search) = search.map(str::trim).filter(|value| !value.is_empty()) {
            sql.push_str(" WHERE t.name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_contains_pattern(search)));
        }

        sql.push_str(" ORDER BY t.name ASC LIMIT ?;");
        bind_values.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_tag_record_row(row)?);
        }
        Ok(items)
    }
}

fn parse_tag_record_row(row: &Row<'_>) -> RepoResult<TagRecord> {
    Ok(TagRecord {
        tag: Tag {
            id: row.get("id")?,
            name: row.get("name")?,
            description: row.get("description")?,
            created_at: row.get("created_at")?,
        },
        question_count: row.get("question_count")?,
    })
}
