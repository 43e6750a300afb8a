//! Answer aggregate use-case service.
//!
//! # Responsibility
//! - Post, edit, soft-delete and read answers.
//! - Notify the question author about new answers.
//!
//! # Invariants
//! - New answers require an active parent question.
//! - The answer row and its notification commit together or not at all.
//! - Only the author or an admin may edit or delete an answer.

use crate::model::notification::{Notification, NotificationKind};
use crate::model::post::{Answer, AnswerId, QuestionId};
use crate::model::validation::ModelValidationError;
use crate::repo::answer_repo::{AnswerRecord, AnswerRepository, QuestionRef};
use crate::repo::RepoError;
use crate::sanitize::{HtmlSanitizer, Sanitizer};
use crate::service::{log_failure, Actor, ServiceError, ServiceResult};
use log::info;
use serde_json::json;

/// Answer service facade over repository implementations.
pub struct AnswerService<R: AnswerRepository, S: Sanitizer = HtmlSanitizer> {
    repo: R,
    sanitizer: S,
}

impl<R: AnswerRepository> AnswerService<R> {
    /// Creates a service with the default HTML sanitizer.
    pub fn new(repo: R) -> Self {
        Self::with_sanitizer(repo, HtmlSanitizer)
    }
}

impl<R: AnswerRepository, S: Sanitizer> AnswerService<R, S> {
    pub fn with_sanitizer(repo: R, sanitizer: S) -> Self {
        Self { repo, sanitizer }
    }

    /// Posts an answer under an active question.
    ///
    /// The question author receives an `answer` notification unless they
    /// answered their own question.
    pub fn create_answer(
        &self,
        author: &Actor,
        question_id: QuestionId,
        body: &str,
    ) -> ServiceResult<AnswerRecord> {
        let result = self.create_answer_inner(author, question_id, body);
        match &result {
            Ok(record) => info!(
                "event=answer_create module=answer status=ok answer_id={} question_id={question_id} author_id={}",
                record.answer.id, author.user_id
            ),
            Err(err) => log_failure("answer_create", "answer", err),
        }
        result
    }

    fn create_answer_inner(
        &self,
        author: &Actor,
        question_id: QuestionId,
        body: &str,
    ) -> ServiceResult<AnswerRecord> {
        let question = self.active_question(question_id)?;
        let body = self.clean_body(body)?;

        let answer = Answer::new(question_id, author.user_id, body);
        let notification = (question.author_id != author.user_id).then(|| {
            Notification::new(
                question.author_id,
                NotificationKind::Answer,
                format!("{} answered your question: {}", author.username, question.title),
                json!({
                    "question_id": question_id,
                    "answer_id": answer.id,
                }),
            )
        });

        self.repo.create_answer(&answer, notification.as_ref())?;
        self.read_back(answer.id, "created answer missing in read-back")
    }

    /// Replaces the body of an active answer. Author or admin only.
    pub fn update_answer(
        &self,
        requester: &Actor,
        answer_id: AnswerId,
        body: &str,
    ) -> ServiceResult<AnswerRecord> {
        let result = self.update_answer_inner(requester, answer_id, body);
        match &result {
            Ok(_) => info!(
                "event=answer_update module=answer status=ok answer_id={answer_id} requester_id={}",
                requester.user_id
            ),
            Err(err) => log_failure("answer_update", "answer", err),
        }
        result
    }

    fn update_answer_inner(
        &self,
        requester: &Actor,
        answer_id: AnswerId,
        body: &str,
    ) -> ServiceResult<AnswerRecord> {
        let current = self
            .repo
            .get_answer(answer_id, false)?
            .ok_or_else(|| ServiceError::not_found("answer", answer_id))?;
        if !requester.can_modify(current.answer.author_id) {
            return Err(ServiceError::permission(
                "only the author or an admin can edit this answer",
            ));
        }

        let body = self.clean_body(body)?;
        self.repo.update_answer_body(answer_id, &body)?;
        self.read_back(answer_id, "updated answer missing in read-back")
    }

    /// Soft-deletes an answer. Author or admin only; idempotent.
    pub fn delete_answer(&self, requester: &Actor, answer_id: AnswerId) -> ServiceResult<()> {
        let result = self.delete_answer_inner(requester, answer_id);
        match &result {
            Ok(()) => info!(
                "event=answer_delete module=answer status=ok answer_id={answer_id} requester_id={}",
                requester.user_id
            ),
            Err(err) => log_failure("answer_delete", "answer", err),
        }
        result
    }

    fn delete_answer_inner(&self, requester: &Actor, answer_id: AnswerId) -> ServiceResult<()> {
        let current = self
            .repo
            .get_answer(answer_id, true)?
            .ok_or_else(|| ServiceError::not_found("answer", answer_id))?;
        if !requester.can_modify(current.answer.author_id) {
            return Err(ServiceError::permission(
                "only the author or an admin can delete this answer",
            ));
        }
        Ok(self.repo.soft_delete_answer(answer_id)?)
    }

    /// Reads one answer directly, even when its question was soft-deleted.
    pub fn get_answer(
        &self,
        answer_id: AnswerId,
        include_inactive: bool,
    ) -> ServiceResult<AnswerRecord> {
        self.repo
            .get_answer(answer_id, include_inactive)?
            .ok_or_else(|| ServiceError::not_found("answer", answer_id))
    }

    /// Lists active answers of an active question, oldest first.
    pub fn list_answers(&self, question_id: QuestionId) -> ServiceResult<Vec<AnswerRecord>> {
        self.active_question(question_id)?;
        Ok(self.repo.list_answers(question_id)?)
    }

    fn active_question(&self, question_id: QuestionId) -> ServiceResult<QuestionRef> {
        self.repo
            .parent_question(question_id)?
            .filter(|question| question.is_active)
            .ok_or_else(|| ServiceError::not_found("question", question_id))
    }

    fn clean_body(&self, body: &str) -> ServiceResult<String> {
        let cleaned = self.sanitizer.sanitize(body);
        if cleaned.trim().is_empty() {
            return Err(ModelValidationError::Blank("body").into());
        }
        Ok(cleaned)
    }

    fn read_back(&self, answer_id: AnswerId, details: &str) -> ServiceResult<AnswerRecord> {
        self.repo
            .get_answer(answer_id, false)?
            .ok_or_else(|| ServiceError::Persistence(RepoError::InvalidData(details.to_string())))
    }
}
