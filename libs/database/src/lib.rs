//! Database plumbing for the document store.
//!
//! Connection setup, retry with backoff for startup, and health probes.
//! Repositories live in the domain crates; this crate only hands them a
//! connected [`mongodb::Database`].
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB connector and health checks
//! - `config` - `core_config::FromEnv` for [`mongodb::MongoConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//! use database::common::RetryConfig;
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config_with_retry(&config, Some(RetryConfig::new())).await?;
//! let db = client.database(config.database_name());
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
