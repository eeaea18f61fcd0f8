#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_first_of, env_or_default};

/// Database name used when none is configured.
pub const DEFAULT_DATABASE: &str = "users_api";

/// MongoDB connection settings.
///
/// ```ignore
/// let config = MongoConfig::new("mongodb://localhost:27017")
///     .database("users_api")
///     .app_name("users-api");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MongoConfig {
    /// Format: mongodb://[username:password@]host[:port][/database][?options]
    pub url: String,
    pub database: String,
    /// Reported to the server in its connection logs
    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn pool_size(mut self, min: u32, max: u32) -> Self {
        self.min_pool_size = min;
        self.max_pool_size = max;
        self
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: DEFAULT_DATABASE.to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

#[cfg(feature = "config")]
fn parse_var<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        })
}

/// Environment variables:
/// - `MONGODB_URL`, `MONGO_URL` or `MONGODB_URI` (required)
/// - `MONGODB_DATABASE` or `MONGO_DATABASE` (default: `users_api`)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_MAX_POOL_SIZE` (default: 100), `MONGODB_MIN_POOL_SIZE` (default: 5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = env_first_of(&["MONGODB_URL", "MONGO_URL", "MONGODB_URI"])?;
        let database = env_first_of(&["MONGODB_DATABASE", "MONGO_DATABASE"])
            .unwrap_or_else(|_| DEFAULT_DATABASE.to_string());

        Ok(Self {
            url,
            database,
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size: parse_var("MONGODB_MAX_POOL_SIZE", "100")?,
            min_pool_size: parse_var("MONGODB_MIN_POOL_SIZE", "5")?,
            connect_timeout_secs: parse_var("MONGODB_CONNECT_TIMEOUT_SECS", "10")?,
            server_selection_timeout_secs: parse_var(
                "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
                "30",
            )?,
        })
    }
}
