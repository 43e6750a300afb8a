//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into forum use-cases.
//! - Enforce ownership and role rules for a resolved [`Actor`].
//! - Translate storage failures into [`ServiceError`] values.

pub mod acceptance_service;
pub mod answer_service;
pub mod error;
pub mod notification_service;
pub mod question_service;
pub mod tag_service;
pub mod user_service;
pub mod vote_ledger;

pub use error::{ServiceError, ServiceResult};
pub use user_service::Actor;

/// Logs one failed use-case without echoing user input.
pub(crate) fn log_failure(event: &str, module: &str, err: &ServiceError) {
    match err {
        ServiceError::Persistence(_) => log::error!(
            "event={event} module={module} status=error error_code={} error={err}",
            err.code()
        ),
        _ => log::warn!(
            "event={event} module={module} status=rejected error_code={}",
            err.code()
        ),
    }
}
