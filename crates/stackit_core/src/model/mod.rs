//! Forum domain model.
//!
//! # Responsibility
//! - Define canonical records for users, questions, answers, tags, votes and
//!   notifications.
//! - Hold field-level validation rules shared by repositories and services.
//!
//! # Invariants
//! - Relationships are plain foreign-key fields; no record owns a pointer to
//!   another record.
//! - Questions and answers are never hard-deleted; `is_active` is the
//!   tombstone flag.

pub mod notification;
pub mod post;
pub mod tag;
pub mod user;
pub mod validation;
pub mod vote;
