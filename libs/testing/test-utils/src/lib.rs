//! Shared test utilities for domain testing
//!
//! - `TestMongo`: MongoDB container with automatic cleanup (feature: "mongo")
//! - `TestDataBuilder`: Deterministic test data generation (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestMongo};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_mongo_test() {
//!     let mongo = TestMongo::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_mongo_test");
//!
//!     let db = mongo.database(&builder.database_name());
//!     let email = builder.email("owner");
//! }
//! ```

use mongodb::bson::oid::ObjectId;

#[cfg(feature = "mongo")]
mod mongo;

#[cfg(feature = "mongo")]
pub use mongo::TestMongo;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by deriving every value from a seed.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_user");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic ObjectId
    pub fn object_id(&self) -> ObjectId {
        let bytes = self.seed.to_be_bytes();
        let mut id = [0u8; 12];
        id[..8].copy_from_slice(&bytes);
        id[8..].copy_from_slice(&bytes[..4]);
        ObjectId::from_bytes(id)
    }

    /// Unique email address, e.g. `owner.12345@example.test`
    pub fn email(&self, local: &str) -> String {
        format!("{}.{}@example.test", local, self.seed)
    }

    /// Database name unique to this builder
    pub fn database_name(&self) -> String {
        format!("test_{}", self.seed)
    }
}

/// Test assertion helpers
pub mod assertions {
    use mongodb::bson::oid::ObjectId;

    /// Assert that two ObjectIds are equal with a nice error message
    pub fn assert_object_id_eq(actual: ObjectId, expected: ObjectId, context: &str) {
        assert_eq!(
            actual, expected,
            "{}: expected ObjectId {}, got {}",
            context, expected, actual
        );
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
