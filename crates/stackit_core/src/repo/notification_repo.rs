//! Notification repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Act as the notification sink for answer/accept events.
//! - Provide recipient-scoped listing and read-flag updates.
//!
//! # Invariants
//! - Listing order is newest first: `created_at DESC, rowid DESC`.
//! - Read-flag updates never touch another recipient's rows.

use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::user::UserId;
use crate::repo::{
    bool_to_int, ensure_connection_ready, parse_flag, parse_uuid, AppliedPage, Page, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    recipient_id,
    kind,
    message,
    payload,
    is_read,
    created_at
FROM notifications";

/// Repository interface for notifications.
pub trait NotificationRepository {
    /// Stores one notification for its recipient.
    fn emit(&self, notification: &Notification) -> RepoResult<()>;
    /// Lists one recipient's notifications, newest first.
    fn list_for_recipient(
        &self,
        recipient_id: UserId,
        page: AppliedPage,
    ) -> RepoResult<Page<Notification>>;
    /// Counts unread notifications of one recipient.
    fn unread_count(&self, recipient_id: UserId) -> RepoResult<u64>;
    /// Marks one notification read; `NotFound` unless owned by recipient.
    fn mark_read(&self, recipient_id: UserId, id: NotificationId) -> RepoResult<Notification>;
    /// Marks every unread notification of the recipient read.
    fn mark_all_read(&self, recipient_id: UserId) -> RepoResult<usize>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn emit(&self, notification: &Notification) -> RepoResult<()> {
        insert_notification(self.conn, notification)
    }

    fn list_for_recipient(
        &self,
        recipient_id: UserId,
        page: AppliedPage,
    ) -> RepoResult<Page<Notification>> {
        let recipient = recipient_id.to_string();
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1;",
            [recipient.as_str()],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE recipient_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![
            recipient.as_str(),
            i64::from(page.per_page),
            page.offset()
        ])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_notification_row(row)?);
        }

        Ok(Page {
            items,
            total: total as u64,
            page: page.page,
            per_page: page.per_page,
        })
    }

    fn unread_count(&self, recipient_id: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM notifications
             WHERE recipient_id = ?1
               AND is_read = 0;",
            [recipient_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn mark_read(&self, recipient_id: UserId, id: NotificationId) -> RepoResult<Notification> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET is_read = 1
             WHERE id = ?1
               AND recipient_id = ?2;",
            params![id.to_string(), recipient_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found("notification", id));
        }

        self.conn
            .query_row(
                &format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_notification_row(row)),
            )
            .optional()?
            .transpose()?
            .ok_or_else(|| RepoError::not_found("notification", id))
    }

    fn mark_all_read(&self, recipient_id: UserId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET is_read = 1
             WHERE recipient_id = ?1
               AND is_read = 0;",
            [recipient_id.to_string()],
        )?;
        Ok(changed)
    }
}

/// Inserts one notification on the given connection or transaction.
///
/// Answer and acceptance writes call this inside their own transaction so the
/// event and its notification commit or roll back together.
pub(crate) fn insert_notification(
    conn: &Connection,
    notification: &Notification,
) -> RepoResult<()> {
    let payload = serde_json::to_string(&notification.payload)
        .map_err(|err| RepoError::InvalidData(format!("unserializable payload: {err}")))?;
    conn.execute(
        "INSERT INTO notifications (
            id,
            recipient_id,
            kind,
            message,
            payload,
            is_read
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            notification.id.to_string(),
            notification.recipient_id.to_string(),
            notification.kind.as_str(),
            notification.message.as_str(),
            payload,
            bool_to_int(notification.is_read),
        ],
    )?;
    Ok(())
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let recipient_text: String = row.get("recipient_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = NotificationKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid notification kind `{kind_text}` in notifications.kind"
        ))
    })?;
    let payload_text: String = row.get("payload")?;
    let payload = serde_json::from_str(&payload_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid json in notifications.payload: {err}"))
    })?;

    Ok(Notification {
        id: parse_uuid(&id_text, "notifications.id")?,
        recipient_id: parse_uuid(&recipient_text, "notifications.recipient_id")?,
        kind,
        message: row.get("message")?,
        payload,
        is_read: parse_flag(row.get("is_read")?, "notifications.is_read")?,
        created_at: row.get("created_at")?,
    })
}
