pub mod server;
pub mod tracing;

use std::env;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Deployment classification.
///
/// Loaded once at startup from `APP_ENV` and passed to every component that
/// changes behavior with it (log format, error verbosity). Only the exact
/// value `production`, compared case-insensitively, selects
/// [`Environment::Production`]; anything else, including an unset variable,
/// is treated as development.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const VAR: &'static str = "APP_ENV";

    pub fn from_env() -> Self {
        let app_env = env_or_default(Self::VAR, "development");
        Self::classify(&app_env)
    }

    /// Classify a raw environment name.
    pub fn classify(value: &str) -> Self {
        if value.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Name and version of the running binary, reported by the health endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// Build an [`AppInfo`] from the calling crate's Cargo metadata.
#[macro_export]
macro_rules! app_info {
    () => {
        $crate::AppInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    };
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// First variable in `keys` that is set, in order.
pub fn env_first_of(keys: &[&str]) -> Result<String, ConfigError> {
    keys.iter()
        .find_map(|key| env::var(key).ok())
        .ok_or_else(|| ConfigError::MissingEnvVar(keys.join(" | ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production() {
        temp_env::with_var("APP_ENV", Some("production"), || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Production);
            assert!(env.is_production());
            assert!(!env.is_development());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        for value in ["PRODUCTION", "Production", "pRoDuCtIoN"] {
            temp_env::with_var("APP_ENV", Some(value), || {
                assert_eq!(Environment::from_env(), Environment::Production);
            });
        }
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        for value in ["staging", "test", "prod", ""] {
            temp_env::with_var("APP_ENV", Some(value), || {
                assert_eq!(Environment::from_env(), Environment::Development);
            });
        }
    }

    #[test]
    fn test_environment_classification_is_exact() {
        assert_eq!(Environment::classify("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::classify(" production "), Environment::Development);
        assert_eq!(Environment::classify("production-eu"), Environment::Development);
        assert_eq!(Environment::default(), Environment::Development);
    }

    #[test]
    fn test_app_info_macro() {
        let info = app_info!();
        assert_eq!(info.name, "core_config");
        assert!(!info.version.is_empty());
    }

    #[test]
    fn test_env_or_default_with_value() {
        temp_env::with_var("TEST_VAR", Some("test_value"), || {
            let result = env_or_default("TEST_VAR", "default");
            assert_eq!(result, "test_value");
        });
    }

    #[test]
    fn test_env_or_default_without_value() {
        temp_env::with_var_unset("MISSING_VAR", || {
            let result = env_or_default("MISSING_VAR", "default_value");
            assert_eq!(result, "default_value");
        });
    }

    #[test]
    fn test_env_required_success() {
        temp_env::with_var("REQUIRED_VAR", Some("required_value"), || {
            let result = env_required("REQUIRED_VAR");
            assert!(result.is_ok());
            assert_eq!(result.unwrap(), "required_value");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let result = env_required("MISSING_REQUIRED");
            assert!(result.is_err());
            let err = result.unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_first_of_prefers_earlier_keys() {
        temp_env::with_vars(
            [("FIRST_KEY", Some("one")), ("SECOND_KEY", Some("two"))],
            || {
                assert_eq!(env_first_of(&["FIRST_KEY", "SECOND_KEY"]).unwrap(), "one");
            },
        );
        temp_env::with_vars(
            [("FIRST_KEY", None), ("SECOND_KEY", Some("two"))],
            || {
                assert_eq!(env_first_of(&["FIRST_KEY", "SECOND_KEY"]).unwrap(), "two");
            },
        );
    }

    #[test]
    fn test_env_first_of_reports_all_keys() {
        temp_env::with_vars_unset(["FIRST_KEY", "SECOND_KEY"], || {
            let err = env_first_of(&["FIRST_KEY", "SECOND_KEY"]).unwrap_err();
            assert!(err.to_string().contains("FIRST_KEY | SECOND_KEY"));
        });
    }
}
