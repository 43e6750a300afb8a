//! Notification inbox use-cases.
//!
//! # Responsibility
//! - Emit standalone notifications for collaborators (e.g. mentions).
//! - List an actor's inbox newest first with its unread count.
//! - Mark one or all notifications as read.
//!
//! # Invariants
//! - Actors only ever see or change their own notifications.

use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::user::UserId;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::{normalize_page, Page, PageRequest};
use crate::service::{log_failure, Actor, ServiceResult};
use log::info;
use serde_json::Value;

pub const NOTIFICATIONS_DEFAULT_PER_PAGE: u32 = 20;
pub const NOTIFICATIONS_MAX_PER_PAGE: u32 = 100;

/// One inbox page plus the unread total across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFeed {
    pub page: Page<Notification>,
    pub unread_count: u64,
}

/// Notification service facade over repository implementations.
pub struct NotificationService<R: NotificationRepository> {
    repo: R,
}

impl<R: NotificationRepository> NotificationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores one unread notification for `recipient_id`.
    ///
    /// Messages longer than the model limit are truncated.
    pub fn notify(
        &self,
        recipient_id: UserId,
        kind: NotificationKind,
        message: &str,
        payload: Value,
    ) -> ServiceResult<Notification> {
        let notification = Notification::new(recipient_id, kind, message, payload);
        match self.repo.emit(&notification) {
            Ok(()) => {
                info!(
                    "event=notification_emit module=notification status=ok notification_id={} recipient_id={recipient_id} kind={}",
                    notification.id,
                    kind.as_str()
                );
                Ok(notification)
            }
            Err(err) => {
                let err = err.into();
                log_failure("notification_emit", "notification", &err);
                Err(err)
            }
        }
    }

    /// Lists the actor's notifications, newest first.
    pub fn list_notifications(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> ServiceResult<NotificationFeed> {
        let applied = normalize_page(
            page,
            NOTIFICATIONS_DEFAULT_PER_PAGE,
            NOTIFICATIONS_MAX_PER_PAGE,
        );
        let page = self.repo.list_for_recipient(actor.user_id, applied)?;
        let unread_count = self.repo.unread_count(actor.user_id)?;
        Ok(NotificationFeed { page, unread_count })
    }

    /// Marks one of the actor's notifications as read.
    ///
    /// Notifications of other recipients are reported as `NotFound`.
    pub fn mark_read(
        &self,
        actor: &Actor,
        notification_id: NotificationId,
    ) -> ServiceResult<Notification> {
        Ok(self.repo.mark_read(actor.user_id, notification_id)?)
    }

    /// Marks every unread notification of the actor as read.
    ///
    /// Returns the number of notifications that changed.
    pub fn mark_all_read(&self, actor: &Actor) -> ServiceResult<usize> {
        let changed = self.repo.mark_all_read(actor.user_id)?;
        info!(
            "event=notification_mark_all_read module=notification status=ok recipient_id={} changed={changed}",
            actor.user_id
        );
        Ok(changed)
    }
}
