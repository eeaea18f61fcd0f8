//! User Service - lifecycle rules over a UserRepository

use axum_helpers::{FieldError, validation::Source};
use mongodb::bson::{DateTime, oid::ObjectId};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{NewUser, UPDATE_REQUIRES_FIELD, UpdateUser, User, UserQuery};
use crate::repository::{UserChanges, UserRepository};

/// User service providing the user lifecycle
///
/// A user is active until soft-deleted and can be restored once per
/// deletion. Every mutation moves `lastModifiedAt` strictly forward.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// List users; deleted users only when the query asks for them
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: UserQuery) -> UserResult<Vec<User>> {
        self.repository.find(query).await
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: NewUser) -> UserResult<User> {
        self.repository.insert(User::new(input, DateTime::now())).await
    }

    /// Get a user by ID, including soft-deleted users
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: ObjectId) -> UserResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound)
    }

    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: ObjectId, input: UpdateUser) -> UserResult<User> {
        if input.is_empty() {
            return Err(UserError::Validation(vec![FieldError::new(
                Source::Body.path("updateData"),
                UPDATE_REQUIRES_FIELD,
            )]));
        }

        let existing = self.get_user(id).await?;
        let changes = UserChanges {
            first_name: input.first_name,
            last_name: input.last_name,
        };

        self.repository
            .update(id, changes, existing.next_modified_at(DateTime::now()))
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Soft-delete a user. Deleting a deleted user changes nothing.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: ObjectId) -> UserResult<()> {
        let existing = self.get_user(id).await?;
        if existing.is_deleted() {
            tracing::debug!(user_id = %id, "User already deleted");
            return Ok(());
        }

        // A concurrent delete may win the conditional write; the outcome is the same.
        self.repository
            .mark_deleted(id, existing.next_modified_at(DateTime::now()))
            .await?;
        Ok(())
    }

    /// Restore a soft-deleted user
    #[instrument(skip(self))]
    pub async fn restore_user(&self, id: ObjectId) -> UserResult<User> {
        let existing = self
            .repository
            .find_by_id(id)
            .await?
            .filter(User::is_deleted)
            .ok_or(UserError::NotRestorable)?;

        self.repository
            .restore(id, existing.next_modified_at(DateTime::now()))
            .await?
            .ok_or(UserError::NotRestorable)
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
