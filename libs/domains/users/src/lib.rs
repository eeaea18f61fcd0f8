//! Users Domain
//!
//! User lifecycle over MongoDB: create, read, update, soft delete, restore
//! and filtered listing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, validation gate
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Lifecycle rules (soft delete / restore)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB implementation)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entity, view, request schemas
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{handlers, mongodb::MongoUserRepository, service::UserService};
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let repository = MongoUserRepository::new(client.database("users_api"));
//! repository.init_indexes().await?;
//!
//! let router = handlers::router(UserService::new(repository));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{
    CreateUser, NewUser, SortField, SortOrder, UpdateUser, User, UserFilter, UserQuery, UserView,
};
pub use crate::mongodb::MongoUserRepository;
pub use repository::{UserChanges, UserRepository};
pub use service::UserService;
