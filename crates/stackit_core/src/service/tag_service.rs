//! Tag catalogue use-cases.

use crate::model::validation::{required_text, TAG_NAME_MAX_CHARS};
use crate::repo::normalize_limit;
use crate::repo::tag_repo::{TagRecord, TagRepository};
use crate::service::{log_failure, Actor, ServiceError, ServiceResult};
use log::info;

pub const TAGS_DEFAULT_LIMIT: u32 = 50;
pub const TAGS_MAX_LIMIT: u32 = 100;

/// Tag service facade over repository implementations.
pub struct TagService<R: TagRepository> {
    repo: R,
}

impl<R: TagRepository> TagService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists tags by name with their active question counts.
    ///
    /// `limit` defaults to 50 and is clamped to 100.
    pub fn list_tags(&self, search: Option<&str>, limit: Option<u32>) -> ServiceResult<Vec<TagRecord>> {
        let search = search.map(str::trim).filter(|value| !value.is_empty());
        let limit = normalize_limit(limit, TAGS_DEFAULT_LIMIT, TAGS_MAX_LIMIT);
        Ok(self.repo.list_tags(search, limit)?)
    }

    /// Looks up one tag by exact, case-sensitive name.
    pub fn get_tag(&self, name: &str) -> ServiceResult<Option<TagRecord>> {
        Ok(self.repo.get_tag(name.trim())?)
    }

    /// Creates a tag with an optional description. Admin only.
    pub fn create_tag(
        &self,
        requester: &Actor,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<TagRecord> {
        let result = self.create_tag_inner(requester, name, description);
        match &result {
            Ok(record) => info!(
                "event=tag_create module=tag status=ok tag_id={} admin_id={}",
                record.tag.id, requester.user_id
            ),
            Err(err) => log_failure("tag_create", "tag", err),
        }
        result
    }

    fn create_tag_inner(
        &self,
        requester: &Actor,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<TagRecord> {
        requester.require_admin("create tags")?;
        let name = required_text("tag", name, Some(TAG_NAME_MAX_CHARS))?;
        let description = description.map(str::trim).filter(|value| !value.is_empty());
        self.repo
            .create_tag(&name, description)
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::Conflict(_) => {
                    ServiceError::Conflict(format!("tag `{name}` already exists"))
                }
                other => other,
            })
    }
}
