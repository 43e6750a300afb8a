//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `username` and `email` uniqueness is enforced by the store; duplicates
//!   surface as `RepoError::Conflict`.
//! - Users are deactivated, never deleted, by core.

use crate::model::user::{User, UserId, UserRole};
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_flag, parse_uuid, AppliedPage, Page, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    credential_hash,
    role,
    is_active,
    created_at
FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Inserts a validated user and returns the stored row.
    fn create_user(&self, user: &User) -> RepoResult<User>;
    /// Loads one user by id regardless of active state.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Loads one user by exact username or email.
    fn find_by_login(&self, username_or_email: &str) -> RepoResult<Option<User>>;
    /// Lists users ordered by creation time.
    fn list_users(&self, page: AppliedPage) -> RepoResult<Page<User>>;
    /// Sets the active flag; `NotFound` when the user does not exist.
    fn set_user_active(&self, id: UserId, is_active: bool) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<User> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (
                id,
                username,
                email,
                credential_hash,
                role,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                user.credential_hash.as_str(),
                user.role.as_str(),
                bool_to_int(user.is_active),
            ],
        )?;

        self.get_user(user.id)?
            .ok_or_else(|| RepoError::InvalidData("created user missing on read-back".to_string()))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_by_login(&self, username_or_email: &str) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1 OR email = ?1 LIMIT 1;"),
                [username_or_email],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_users(&self, page: AppliedPage) -> RepoResult<Page<User>> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;

        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} ORDER BY created_at ASC, rowid ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let mut rows = stmt.query(params![i64::from(page.per_page), page.offset()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_user_row(row)?);
        }

        Ok(Page {
            items,
            total: total as u64,
            page: page.page,
            per_page: page.per_page,
        })
    }

    fn set_user_active(&self, id: UserId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users SET is_active = ?2 WHERE id = ?1;",
            params![id.to_string(), bool_to_int(is_active)],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("user", id));
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let role_text: String = row.get("role")?;
    let role = UserRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        credential_hash: row.get("credential_hash")?,
        role,
        is_active: parse_flag(row.get("is_active")?, "users.is_active")?,
        created_at: row.get("created_at")?,
    })
}
