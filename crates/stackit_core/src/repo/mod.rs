//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts, one trait per aggregate.
//! - Isolate SQLite query details from service/business orchestration.
//! - Run every multi-statement write inside one IMMEDIATE transaction.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.
//! - UNIQUE/PRIMARY KEY violations surface as `RepoError::Conflict`.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Scores are summed from `votes` on every read; nothing is cached.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::validation::ModelValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod answer_repo;
pub mod notification_repo;
pub mod question_repo;
pub mod tag_repo;
pub mod user_repo;
pub mod vote_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for forum persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Referenced row is absent, or inactive where the operation needs an
    /// active row.
    NotFound { entity: &'static str, id: String },
    /// A uniqueness constraint rejected the write.
    Conflict(String),
    InvalidData(String),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl RepoError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflicting write: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Conflict(_) => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_uniqueness_violation(&value) {
            return Self::Conflict(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

fn is_uniqueness_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) => matches!(
            inner.extended_code,
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        ),
        _ => false,
    }
}

/// One-based page request used by listing APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1. `0` is treated as 1.
    pub page: u32,
    /// Page size. `None`/`0` fall back to the listing default; larger values
    /// are clamped to the listing maximum.
    pub per_page: Option<u32>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page: Some(per_page),
        }
    }
}

/// Page request after defaulting and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedPage {
    pub page: u32,
    pub per_page: u32,
}

impl AppliedPage {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

/// Normalizes a page request according to one listing's limits.
pub fn normalize_page(request: PageRequest, default_per_page: u32, max_per_page: u32) -> AppliedPage {
    AppliedPage {
        page: request.page.max(1),
        per_page: normalize_limit(request.per_page, default_per_page, max_per_page),
    }
}

/// Applies default/clamp rules to an optional limit.
pub fn normalize_limit(limit: Option<u32>, default_limit: u32, max_limit: u32) -> u32 {
    match limit {
        Some(0) | None => default_limit,
        Some(value) if value > max_limit => max_limit,
        Some(value) => value,
    }
}

/// One page of listing results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total rows matching the filter, across all pages.
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` rows.
    pub fn pages(&self) -> u64 {
        if self.total == 0 {
            0
        } else {
            self.total.div_ceil(u64::from(self.per_page))
        }
    }
}

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally in
/// `LIKE ... ESCAPE '\'`.
pub(crate) fn like_contains_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::{like_contains_pattern, normalize_limit, normalize_page, Page, PageRequest};

    #[test]
    fn limits_default_and_clamp() {
        assert_eq!(normalize_limit(None, 20, 100), 20);
        assert_eq!(normalize_limit(Some(0), 20, 100), 20);
        assert_eq!(normalize_limit(Some(500), 20, 100), 100);
        assert_eq!(normalize_limit(Some(7), 20, 100), 7);
    }

    #[test]
    fn page_zero_is_first_page() {
        let applied = normalize_page(PageRequest::new(0, 10), 20, 100);
        assert_eq!(applied.page, 1);
        assert_eq!(applied.offset(), 0);
        assert_eq!(normalize_page(PageRequest::new(3, 10), 20, 100).offset(), 20);
    }

    #[test]
    fn pages_rounds_up() {
        let page: Page<()> = Page {
            items: Vec::new(),
            total: 41,
            page: 1,
            per_page: 20,
        };
        assert_eq!(page.pages(), 3);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_contains_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }
}
