use async_trait::async_trait;
use mongodb::bson::{DateTime, oid::ObjectId};

use crate::error::UserResult;
use crate::models::{User, UserQuery};

/// Name changes applied by an update; `None` leaves the field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Repository trait for User persistence
///
/// Conditional writes (`mark_deleted`, `restore`) return `None` when no
/// document matched the condition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a taken email is `UserError::DuplicateEmail`
    async fn insert(&self, user: User) -> UserResult<User>;

    /// Get a user by ID, deleted or not
    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>>;

    /// List users matching the query
    async fn find(&self, query: UserQuery) -> UserResult<Vec<User>>;

    /// Apply name changes and stamp `lastModifiedAt`
    async fn update(
        &self,
        id: ObjectId,
        changes: UserChanges,
        modified_at: DateTime,
    ) -> UserResult<Option<User>>;

    /// Set `deletedAt` on an active user
    async fn mark_deleted(&self, id: ObjectId, deleted_at: DateTime) -> UserResult<Option<User>>;

    /// Remove `deletedAt` from a deleted user
    async fn restore(&self, id: ObjectId, modified_at: DateTime) -> UserResult<Option<User>>;
}
