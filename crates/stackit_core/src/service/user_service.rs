//! User account use-cases and actor resolution.
//!
//! # Responsibility
//! - Register accounts issued by the identity collaborator.
//! - Resolve an authenticated user id into an [`Actor`].
//! - Provide admin-only listing and ban operations.
//!
//! # Invariants
//! - Banned (inactive) users never resolve into an actor.
//! - Username and email stay unique; duplicates surface as `Conflict`.

use crate::model::user::{User, UserId, UserRole};
use crate::repo::user_repo::UserRepository;
use crate::repo::{normalize_page, Page, PageRequest};
use crate::service::{log_failure, ServiceError, ServiceResult};
use log::info;

pub const USERS_DEFAULT_PER_PAGE: u32 = 20;
pub const USERS_MAX_PER_PAGE: u32 = 100;

/// Resolved, active user performing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owner-or-admin rule used by edit and delete operations.
    pub(crate) fn can_modify(&self, owner_id: UserId) -> bool {
        self.user_id == owner_id || self.is_admin()
    }

    pub(crate) fn require_admin(&self, action: &str) -> ServiceResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::permission(format!("only admins can {action}")))
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// User service facade over repository implementations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new account.
    ///
    /// `credential_hash` is opaque to core; the identity collaborator owns
    /// hashing and verification.
    pub fn register_user(
        &self,
        username: &str,
        email: &str,
        credential_hash: &str,
        role: UserRole,
    ) -> ServiceResult<User> {
        let user = User::new(username.trim(), email.trim(), credential_hash, role);
        let result = self
            .repo
            .create_user(&user)
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::Conflict(_) => {
                    ServiceError::Conflict("username or email already registered".to_string())
                }
                other => other,
            });
        match result {
            Ok(created) => {
                info!(
                    "event=user_register module=user status=ok user_id={} role={}",
                    created.id,
                    created.role.as_str()
                );
                Ok(created)
            }
            Err(err) => {
                log_failure("user_register", "user", &err);
                Err(err)
            }
        }
    }

    /// Turns an authenticated user id into an actor.
    ///
    /// Unknown ids are `NotFound`; banned users are `Permission`.
    pub fn resolve_actor(&self, user_id: UserId) -> ServiceResult<Actor> {
        let user = self
            .repo
            .get_user(user_id)?
            .ok_or_else(|| ServiceError::not_found("user", user_id))?;
        if !user.is_active {
            return Err(ServiceError::permission("account is deactivated"));
        }
        Ok(Actor::from(&user))
    }

    /// Loads one user by id regardless of active state.
    pub fn get_user(&self, user_id: UserId) -> ServiceResult<Option<User>> {
        Ok(self.repo.get_user(user_id)?)
    }

    /// Loads one user by exact username or email.
    pub fn find_by_login(&self, username_or_email: &str) -> ServiceResult<Option<User>> {
        let login = username_or_email.trim();
        if login.is_empty() {
            return Ok(None);
        }
        Ok(self.repo.find_by_login(login)?)
    }

    /// Lists all accounts, oldest first. Admin only.
    pub fn list_users(&self, requester: &Actor, page: PageRequest) -> ServiceResult<Page<User>> {
        requester.require_admin("list users")?;
        let applied = normalize_page(page, USERS_DEFAULT_PER_PAGE, USERS_MAX_PER_PAGE);
        Ok(self.repo.list_users(applied)?)
    }

    /// Deactivates an account. Admin only; banning twice is a no-op.
    pub fn ban_user(&self, requester: &Actor, user_id: UserId) -> ServiceResult<()> {
        let result = requester
            .require_admin("ban users")
            .and_then(|_| Ok(self.repo.set_user_active(user_id, false)?));
        match result {
            Ok(()) => {
                info!(
                    "event=user_ban module=user status=ok user_id={user_id} admin_id={}",
                    requester.user_id
                );
                Ok(())
            }
            Err(err) => {
                log_failure("user_ban", "user", &err);
                Err(err)
            }
        }
    }
}
