//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `APPWRITE_ENDPOINT` - API endpoint (e.g., <https://cloud.appwrite.io/v1>)
//! - `APPWRITE_PROJECT_ID` - Project ID
//! - `APPWRITE_DATABASE_ID` - Database holding the catalog and user collections
//!
//! ## Optional
//! - `APPWRITE_PLATFORM` - Platform identifier (default: com.company.foodorder)
//! - `APPWRITE_USER_COLLECTION` - User profiles (default: user)
//! - `APPWRITE_CATEGORY_COLLECTION` - Categories (default: categories)
//! - `APPWRITE_MENU_COLLECTION` - Menu items (default: menu)
//! - `APPWRITE_CUSTOMIZATION_COLLECTION` - Customizations (default: customization)
//! - `APPWRITE_MENU_CUSTOMIZATION_COLLECTION` - Menu/customization join (default: `menu_customization`)
//! - `APPWRITE_ASSET_BUCKET` - Storage bucket for avatars (required for uploads)
//! - `APPWRITE_API_KEY` - Server API key, for trusted tooling only
//! - `CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_PLATFORM: &str = "com.company.foodorder";
const DEFAULT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Appwrite connection settings
    pub appwrite: AppwriteConfig,
    /// How long catalog reads stay cached
    pub catalog_cache_ttl: Duration,
    /// Error tracking settings
    pub sentry: SentryConfig,
}

/// Sentry settings. Loaded on their own for offline runs, which have no
/// backend configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN for error tracking
    pub dsn: Option<String>,
    /// Sentry environment name
    pub environment: Option<String>,
}

impl SentryConfig {
    /// Read `SENTRY_DSN` and `SENTRY_ENVIRONMENT`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            dsn: get_optional_env("SENTRY_DSN"),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
        }
    }
}

/// Collection ids inside the Appwrite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub user: String,
    pub categories: String,
    pub menu: String,
    pub customization: String,
    pub menu_customization: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            user: "user".to_string(),
            categories: "categories".to_string(),
            menu: "menu".to_string(),
            customization: "customization".to_string(),
            menu_customization: "menu_customization".to_string(),
        }
    }
}

/// Appwrite connection configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct AppwriteConfig {
    /// API endpoint, including the `/v1` path
    pub endpoint: Url,
    /// Project ID sent with every request
    pub project_id: String,
    /// Platform identifier registered in the project
    pub platform: String,
    /// Database ID
    pub database_id: String,
    /// Collection IDs
    pub collections: Collections,
    /// Storage bucket for uploaded images
    pub asset_bucket: Option<String>,
    /// Server API key (never needed by end-user sessions)
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("project_id", &self.project_id)
            .field("platform", &self.platform)
            .field("database_id", &self.database_id)
            .field("collections", &self.collections)
            .field("asset_bucket", &self.asset_bucket)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let appwrite = AppwriteConfig::from_env()?;
        let ttl_secs = get_env_or_default("CATALOG_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CATALOG_CACHE_TTL_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            appwrite,
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
            sentry: SentryConfig::from_env(),
        })
    }
}

impl AppwriteConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint("APPWRITE_ENDPOINT", &get_required_env("APPWRITE_ENDPOINT")?)?,
            project_id: get_required_env("APPWRITE_PROJECT_ID")?,
            platform: get_env_or_default("APPWRITE_PLATFORM", DEFAULT_PLATFORM),
            database_id: get_required_env("APPWRITE_DATABASE_ID")?,
            collections: Collections::from_env(),
            asset_bucket: get_optional_env("APPWRITE_ASSET_BUCKET"),
            api_key: get_optional_env("APPWRITE_API_KEY").map(SecretString::from),
        })
    }

    /// Build a URL for an API path such as `account/sessions/email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined onto the endpoint.
    pub fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.endpoint.join(path.trim_start_matches('/'))
    }
}

impl Collections {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            user: get_env_or_default("APPWRITE_USER_COLLECTION", &defaults.user),
            categories: get_env_or_default("APPWRITE_CATEGORY_COLLECTION", &defaults.categories),
            menu: get_env_or_default("APPWRITE_MENU_COLLECTION", &defaults.menu),
            customization: get_env_or_default(
                "APPWRITE_CUSTOMIZATION_COLLECTION",
                &defaults.customization,
            ),
            menu_customization: get_env_or_default(
                "APPWRITE_MENU_CUSTOMIZATION_COLLECTION",
                &defaults.menu_customization,
            ),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnvVar(key.to_string())),
    }
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse the endpoint, making sure it ends with `/` so relative joins keep `/v1`.
fn parse_endpoint(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut value = value.trim().to_string();
    if !value.ends_with('/') {
        value.push('/');
    }
    let url = Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> AppwriteConfig {
        AppwriteConfig {
            endpoint: parse_endpoint("TEST", "https://cloud.appwrite.io/v1").unwrap(),
            project_id: "food-order".to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            database_id: "68d177bb002675c010d4".to_string(),
            collections: Collections::default(),
            asset_bucket: Some("avatars".to_string()),
            api_key: Some(SecretString::from("standard_super_secret_key")),
        }
    }

    #[test]
    fn test_parse_endpoint_adds_trailing_slash() {
        let url = parse_endpoint("TEST", "https://cloud.appwrite.io/v1").unwrap();
        assert_eq!(url.as_str(), "https://cloud.appwrite.io/v1/");
    }

    #[test]
    fn test_parse_endpoint_rejects_bad_values() {
        assert!(matches!(
            parse_endpoint("TEST", "not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            parse_endpoint("TEST", "ftp://cloud.appwrite.io/v1"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_url_keeps_version_prefix() {
        let config = config();
        assert_eq!(
            config.url("/account/sessions/email").unwrap().as_str(),
            "https://cloud.appwrite.io/v1/account/sessions/email"
        );
        assert_eq!(
            config.url("databases/db/collections/menu/documents").unwrap().as_str(),
            "https://cloud.appwrite.io/v1/databases/db/collections/menu/documents"
        );
    }

    #[test]
    fn test_default_collections() {
        let collections = Collections::default();
        assert_eq!(collections.user, "user");
        assert_eq!(collections.menu_customization, "menu_customization");
    }

    #[test]
    fn test_appwrite_config_debug_redacts_secrets() {
        let debug_output = format!("{:?}", config());

        assert!(debug_output.contains("food-order"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("standard_super_secret_key"));
    }

    #[test]
    fn test_required_env_missing() {
        let err = get_required_env("FOOD_ORDER_TEST_SURELY_UNSET_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "FOOD_ORDER_TEST_SURELY_UNSET_VAR"));
    }

    #[test]
    fn test_env_or_default_falls_back() {
        assert_eq!(
            get_env_or_default("FOOD_ORDER_TEST_SURELY_UNSET_VAR", "fallback"),
            "fallback"
        );
    }
}
