//! Core domain logic for the StackIt Q&A forum.
//! This crate is the single source of truth for forum invariants: one vote
//! per user and target, one accepted answer per question, scores computed on
//! read.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sanitize;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::notification::{Notification, NotificationId, NotificationKind};
pub use model::post::{Answer, AnswerId, Question, QuestionId, QuestionPatch};
pub use model::tag::{Tag, TagId};
pub use model::user::{User, UserId, UserRole};
pub use model::validation::ModelValidationError;
pub use model::vote::{Vote, VoteDirection, VoteTarget};
pub use repo::answer_repo::{AnswerRecord, AnswerRepository, SqliteAnswerRepository};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::question_repo::{
    QuestionListQuery, QuestionRecord, QuestionRepository, QuestionSort, SortOrder,
    SqliteQuestionRepository,
};
pub use repo::tag_repo::{SqliteTagRepository, TagRecord, TagRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::vote_repo::{SqliteVoteRepository, VoteRepository};
pub use repo::{Page, PageRequest, RepoError, RepoResult};
pub use sanitize::{HtmlSanitizer, Sanitizer};
pub use service::acceptance_service::AcceptanceService;
pub use service::answer_service::AnswerService;
pub use service::notification_service::{NotificationFeed, NotificationService};
pub use service::question_service::{QuestionDetail, QuestionService};
pub use service::tag_service::TagService;
pub use service::user_service::{Actor, UserService};
pub use service::vote_ledger::{VoteLedger, VoteOutcome};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
