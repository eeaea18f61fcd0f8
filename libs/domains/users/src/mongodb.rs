//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{DateTime, Document, doc, oid::ObjectId},
    options::{FindOptions, IndexOptions, ReturnDocument},
};
use tracing::instrument;

use crate::error::UserResult;
use crate::models::{SortOrder, User, UserQuery};
use crate::repository::{UserChanges, UserRepository};

pub const COLLECTION: &str = "users";

/// MongoDB implementation of the UserRepository
#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    /// ```ignore
    /// let client = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoUserRepository::new(client.database("users_api"));
    /// repo.init_indexes().await?;
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<User>(collection_name);
        Self { collection }
    }

    pub fn collection(&self) -> &Collection<User> {
        &self.collection
    }

    /// Create the unique index on `email`. Safe to call on every start.
    #[instrument(skip(self))]
    pub async fn init_indexes(&self) -> UserResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        tracing::info!(collection = COLLECTION, "User indexes ensured");
        Ok(())
    }

    /// Build a MongoDB filter document from UserQuery
    fn build_filter(query: &UserQuery) -> Document {
        let mut filter = doc! {};

        if !query.include_deleted {
            filter.insert("deletedAt", doc! { "$exists": false });
        }

        for (field, value) in [
            ("firstName", &query.first_name),
            ("lastName", &query.last_name),
            ("email", &query.email),
        ] {
            if let Some(value) = value {
                filter.insert(
                    field,
                    doc! { "$regex": regex::escape(value), "$options": "i" },
                );
            }
        }

        filter
    }

    fn build_options(query: &UserQuery) -> FindOptions {
        let mut options = FindOptions::default();
        options.limit = query.limit;
        options.skip = query.offset;
        options.sort = query.sort.map(|(field, order)| {
            let direction = match order {
                SortOrder::Asc => 1,
                SortOrder::Desc => -1,
            };
            let mut sort = Document::new();
            sort.insert(field.to_string(), direction);
            sort
        });
        options
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> UserResult<User> {
        self.collection.insert_one(&user).await?;

        tracing::info!(user_id = %user.id, "User created successfully");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find(&self, query: UserQuery) -> UserResult<Vec<User>> {
        let cursor = self
            .collection
            .find(Self::build_filter(&query))
            .with_options(Self::build_options(&query))
            .await?;
        let users: Vec<User> = cursor.try_collect().await?;

        Ok(users)
    }

    #[instrument(skip(self, changes))]
    async fn update(
        &self,
        id: ObjectId,
        changes: UserChanges,
        modified_at: DateTime,
    ) -> UserResult<Option<User>> {
        let mut set = doc! { "lastModifiedAt": modified_at };
        if let Some(first_name) = changes.first_name {
            set.insert("firstName", first_name);
        }
        if let Some(last_name) = changes.last_name {
            set.insert("lastName", last_name);
        }

        let user = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?;

        if user.is_some() {
            tracing::info!(user_id = %id, "User updated successfully");
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn mark_deleted(&self, id: ObjectId, deleted_at: DateTime) -> UserResult<Option<User>> {
        let user = self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "deletedAt": { "$exists": false } },
                doc! { "$set": { "deletedAt": deleted_at, "lastModifiedAt": deleted_at } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        if user.is_some() {
            tracing::info!(user_id = %id, "User soft-deleted");
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn restore(&self, id: ObjectId, modified_at: DateTime) -> UserResult<Option<User>> {
        let user = self
            .collection
            .find_one_and_update(
                doc! { "_id": id, "deletedAt": { "$exists": true } },
                doc! {
                    "$unset": { "deletedAt": "" },
                    "$set": { "lastModifiedAt": modified_at },
                },
            )
            .return_document(ReturnDocument::After)
            .await?;

        if user.is_some() {
            tracing::info!(user_id = %id, "User restored");
        }
        Ok(user)
    }
}
