//! Question aggregate use-case service.
//!
//! # Responsibility
//! - Create, edit, soft-delete and read questions with their tags.
//! - Count views and assemble question detail with active answers.
//! - Expose the paginated question listing.
//!
//! # Invariants
//! - Titles are trimmed and bodies sanitized before the non-empty check.
//! - Only the author or an admin may edit or delete a question.
//! - Writes treat soft-deleted questions as absent.
//! - A successful `get_question` increments `views` by exactly one.

use crate::model::post::{normalize_tag_names, normalize_title, Question, QuestionId, QuestionPatch};
use crate::model::validation::ModelValidationError;
use crate::repo::answer_repo::AnswerRecord;
use crate::repo::question_repo::{
    QuestionChanges, QuestionListQuery, QuestionRecord, QuestionRepository,
};
use crate::repo::{normalize_page, Page, PageRequest, RepoError};
use crate::sanitize::{HtmlSanitizer, Sanitizer};
use crate::service::{log_failure, Actor, ServiceError, ServiceResult};
use log::info;

pub const QUESTIONS_DEFAULT_PER_PAGE: u32 = 20;
pub const QUESTIONS_MAX_PER_PAGE: u32 = 100;

/// Question with its active answers, returned by `get_question`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDetail {
    pub question: QuestionRecord,
    /// Active answers, oldest first.
    pub answers: Vec<AnswerRecord>,
}

/// Question service facade over repository implementations.
pub struct QuestionService<R: QuestionRepository, S: Sanitizer = HtmlSanitizer> {
    repo: R,
    sanitizer: S,
}

impl<R: QuestionRepository> QuestionService<R> {
    /// Creates a service with the default HTML sanitizer.
    pub fn new(repo: R) -> Self {
        Self::with_sanitizer(repo, HtmlSanitizer)
    }
}

impl<R: QuestionRepository, S: Sanitizer> QuestionService<R, S> {
    pub fn with_sanitizer(repo: R, sanitizer: S) -> Self {
        Self { repo, sanitizer }
    }

    /// Creates one question and links its tags, creating unknown tags.
    pub fn create_question(
        &self,
        author: &Actor,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> ServiceResult<QuestionRecord> {
        let result = self.create_question_inner(author, title, body, tags);
        match &result {
            Ok(record) => info!(
                "event=question_create module=question status=ok question_id={} author_id={} tag_count={}",
                record.question.id,
                author.user_id,
                record.tags.len()
            ),
            Err(err) => log_failure("question_create", "question", err),
        }
        result
    }

    fn create_question_inner(
        &self,
        author: &Actor,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> ServiceResult<QuestionRecord> {
        let title = normalize_title(title)?;
        let body = self.clean_body(body)?;
        let tags = normalize_tag_names(tags)?;

        let question = Question::new(author.user_id, title, body);
        self.repo.create_question(&question, &tags)?;
        self.read_back(question.id, "created question missing in read-back")
    }

    /// Applies a partial update. Author or admin only.
    ///
    /// Absent patch fields stay untouched; `tags` replaces the whole set.
    /// `updated_at` is refreshed even for an empty patch.
    pub fn update_question(
        &self,
        requester: &Actor,
        question_id: QuestionId,
        patch: &QuestionPatch,
    ) -> ServiceResult<QuestionRecord> {
        let result = self.update_question_inner(requester, question_id, patch);
        match &result {
            Ok(_) => info!(
                "event=question_update module=question status=ok question_id={question_id} requester_id={}",
                requester.user_id
            ),
            Err(err) => log_failure("question_update", "question", err),
        }
        result
    }

    fn update_question_inner(
        &self,
        requester: &Actor,
        question_id: QuestionId,
        patch: &QuestionPatch,
    ) -> ServiceResult<QuestionRecord> {
        let current = self
            .repo
            .get_question(question_id, false)?
            .ok_or_else(|| ServiceError::not_found("question", question_id))?;
        if !requester.can_modify(current.question.author_id) {
            return Err(ServiceError::permission(
                "only the author or an admin can edit this question",
            ));
        }

        let title = patch.title.as_deref().map(normalize_title).transpose()?;
        let body = patch
            .body
            .as_deref()
            .map(|body| self.clean_body(body))
            .transpose()?;
        let tags = patch
            .tags
            .as_deref()
            .map(normalize_tag_names)
            .transpose()?;

        let changes = QuestionChanges {
            title: title.as_deref(),
            body: body.as_deref(),
            tags: tags.as_deref(),
        };
        self.repo.update_question(question_id, &changes)?;
        self.read_back(question_id, "updated question missing in read-back")
    }

    /// Soft-deletes a question. Author or admin only.
    ///
    /// Deleting an already inactive question succeeds without changes.
    /// Answers and votes are left in place.
    pub fn delete_question(&self, requester: &Actor, question_id: QuestionId) -> ServiceResult<()> {
        let result = self.delete_question_inner(requester, question_id);
        match &result {
            Ok(()) => info!(
                "event=question_delete module=question status=ok question_id={question_id} requester_id={}",
                requester.user_id
            ),
            Err(err) => log_failure("question_delete", "question", err),
        }
        result
    }

    fn delete_question_inner(&self, requester: &Actor, question_id: QuestionId) -> ServiceResult<()> {
        let current = self
            .repo
            .get_question(question_id, true)?
            .ok_or_else(|| ServiceError::not_found("question", question_id))?;
        if !requester.can_modify(current.question.author_id) {
            return Err(ServiceError::permission(
                "only the author or an admin can delete this question",
            ));
        }
        Ok(self.repo.soft_delete_question(question_id)?)
    }

    /// Reads an active question with its answers and counts one view.
    pub fn get_question(&self, question_id: QuestionId) -> ServiceResult<QuestionDetail> {
        let result = self.get_question_inner(question_id);
        match &result {
            Ok(detail) => info!(
                "event=question_view module=question status=ok question_id={question_id} views={}",
                detail.question.question.views
            ),
            Err(err) => log_failure("question_view", "question", err),
        }
        result
    }

    fn get_question_inner(&self, question_id: QuestionId) -> ServiceResult<QuestionDetail> {
        self.repo.record_view(question_id)?;
        let question = self
            .repo
            .get_question(question_id, false)?
            .ok_or_else(|| ServiceError::not_found("question", question_id))?;
        let answers = self.repo.list_answers(question_id)?;
        Ok(QuestionDetail { question, answers })
    }

    /// Reads one question without counting a view.
    pub fn find_question(
        &self,
        question_id: QuestionId,
        include_inactive: bool,
    ) -> ServiceResult<Option<QuestionRecord>> {
        Ok(self.repo.get_question(question_id, include_inactive)?)
    }

    /// Lists active questions with optional search, tag filter and ordering.
    ///
    /// Blank search text and blank tag names are ignored.
    pub fn list_questions(
        &self,
        query: &QuestionListQuery,
        page: PageRequest,
    ) -> ServiceResult<Page<QuestionRecord>> {
        let query = QuestionListQuery {
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            tags: query
                .tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            sort: query.sort,
            order: query.order,
        };
        let applied = normalize_page(page, QUESTIONS_DEFAULT_PER_PAGE, QUESTIONS_MAX_PER_PAGE);
        Ok(self.repo.list_questions(&query, applied)?)
    }

    fn clean_body(&self, body: &str) -> ServiceResult<String> {
        let cleaned = self.sanitizer.sanitize(body);
        if cleaned.trim().is_empty() {
            return Err(ModelValidationError::Blank("body").into());
        }
        Ok(cleaned)
    }

    fn read_back(&self, question_id: QuestionId, details: &str) -> ServiceResult<QuestionRecord> {
        self.repo
            .get_question(question_id, false)?
            .ok_or_else(|| ServiceError::Persistence(RepoError::InvalidData(details.to_string())))
    }
}
