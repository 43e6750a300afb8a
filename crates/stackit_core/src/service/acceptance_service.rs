//! Accepted-answer state machine.
//!
//! # Responsibility
//! - Move the accepted mark of a question onto one answer.
//! - Notify the answer author when their answer is accepted.
//!
//! # Invariants
//! - At most one answer per question has `is_accepted = true`.
//! - Only the question author may accept; admins do not bypass this.
//! - There is no un-accept. Accepting another answer moves the mark, and
//!   re-accepting the current answer is a no-op apart from the notification.
//! - Clearing, setting and notifying commit in one transaction.

use crate::model::notification::{Notification, NotificationKind};
use crate::model::post::{AnswerId, QuestionId};
use crate::repo::answer_repo::{AnswerRecord, AnswerRepository};
use crate::repo::RepoError;
use crate::service::{log_failure, Actor, ServiceError, ServiceResult};
use log::info;
use serde_json::json;

/// Acceptance service facade over repository implementations.
pub struct AcceptanceService<R: AnswerRepository> {
    repo: R,
}

impl<R: AnswerRepository> AcceptanceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Marks `answer_id` as the accepted answer of its question.
    ///
    /// Returns the reloaded answer with `is_accepted = true`.
    pub fn accept_answer(
        &self,
        requester: &Actor,
        answer_id: AnswerId,
    ) -> ServiceResult<AnswerRecord> {
        let result = self.accept_answer_inner(requester, answer_id);
        match &result {
            Ok(record) => info!(
                "event=answer_accept module=acceptance status=ok answer_id={answer_id} question_id={} requester_id={}",
                record.answer.question_id, requester.user_id
            ),
            Err(err) => log_failure("answer_accept", "acceptance", err),
        }
        result
    }

    fn accept_answer_inner(
        &self,
        requester: &Actor,
        answer_id: AnswerId,
    ) -> ServiceResult<AnswerRecord> {
        let answer = self
            .repo
            .get_answer(answer_id, false)?
            .ok_or_else(|| ServiceError::not_found("answer", answer_id))?
            .answer;
        let question = self
            .repo
            .parent_question(answer.question_id)?
            .filter(|question| question.is_active)
            .ok_or_else(|| ServiceError::not_found("question", answer.question_id))?;

        if question.author_id != requester.user_id {
            return Err(ServiceError::permission(
                "only the question author can accept answers",
            ));
        }

        let notification = (answer.author_id != requester.user_id).then(|| {
            Notification::new(
                answer.author_id,
                NotificationKind::Accept,
                format!("Your answer was accepted for: {}", question.title),
                json!({
                    "question_id": question.id,
                    "answer_id": answer_id,
                }),
            )
        });

        self.repo.accept_answer(answer_id, notification.as_ref())?;
        self.repo.get_answer(answer_id, false)?.ok_or_else(|| {
            ServiceError::Persistence(RepoError::InvalidData(
                "accepted answer missing in read-back".to_string(),
            ))
        })
    }

    /// Id of the currently accepted answer of a question, if any.
    pub fn accepted_answer(&self, question_id: QuestionId) -> ServiceResult<Option<AnswerId>> {
        Ok(self.repo.accepted_answer(question_id)?)
    }
}
