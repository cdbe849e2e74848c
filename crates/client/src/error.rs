//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` for presentation layers. Use
//! [`AppError::report`] before showing [`AppError::user_message`] so that
//! unexpected failures reach Sentry while users only see a short message.

use thiserror::Error;

use crate::backend::BackendError;
use crate::config::ConfigError;
use crate::services::ProfileError;
use crate::store::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Profile operation failed.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Returns true for failures the user cannot fix themselves.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Backend(err)
            | Self::Auth(AuthError::Backend(err))
            | Self::Profile(ProfileError::Backend(err)) => matches!(
                err,
                BackendError::Http(_)
                    | BackendError::Api { .. }
                    | BackendError::Parse(_)
                    | BackendError::InvalidPayload(_)
                    | BackendError::Url(_)
            ),
            Self::Profile(ProfileError::Io(_)) => true,
            _ => false,
        }
    }

    /// Capture unexpected errors to Sentry and log them.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Unexpected error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
    }

    /// A message safe to show to users.
    ///
    /// Internal details (URLs, payloads, status codes) are never included.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => "The app is not configured correctly".to_string(),
            Self::Backend(err) => backend_message(err),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_) => "Please enter a valid email address".to_string(),
                AuthError::WeakPassword(e) => format!("Please choose a different password: {e}"),
                AuthError::MissingName => "Please enter your name".to_string(),
                AuthError::Backend(BackendError::Unauthorized) => {
                    "Invalid email or password".to_string()
                }
                AuthError::Backend(BackendError::Api { status: 409, .. }) => {
                    "An account with this email already exists".to_string()
                }
                AuthError::Backend(err) => backend_message(err),
            },
            Self::Profile(err) => match err {
                ProfileError::EmptyName => "Name cannot be empty".to_string(),
                ProfileError::NotSignedIn => "Please sign in first".to_string(),
                ProfileError::Io(_) => "Could not read the selected image".to_string(),
                ProfileError::Backend(err) => backend_message(err),
            },
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

fn backend_message(err: &BackendError) -> String {
    match err {
        BackendError::Unauthorized => "Please sign in again".to_string(),
        BackendError::NotFound(_) => "We couldn't find that".to_string(),
        BackendError::RateLimited(secs) => {
            format!("Too many requests, please try again in {secs} seconds")
        }
        BackendError::Unsupported(_) => "This feature is not available".to_string(),
        BackendError::Io(_) => "Could not read the file".to_string(),
        _ => "Something went wrong, please try again".to_string(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("item_id", "burger")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Backend(BackendError::NotFound("menu item burger".to_string()));
        assert_eq!(err.to_string(), "Backend error: Not found: menu item burger");

        let err = AppError::BadRequest("quantity must be positive".to_string());
        assert_eq!(err.to_string(), "Bad request: quantity must be positive");
    }

    #[test]
    fn test_user_message_hides_internals() {
        let err = AppError::Backend(BackendError::Api {
            status: 500,
            code: "general_unknown".to_string(),
            message: "stack trace at databases.rs:42".to_string(),
        });
        let message = err.user_message();
        assert!(!message.contains("databases.rs"));
        assert!(!message.contains("500"));
        assert!(err.is_unexpected());
    }

    #[test]
    fn test_auth_messages() {
        let err = AppError::Auth(AuthError::Backend(BackendError::Unauthorized));
        assert_eq!(err.user_message(), "Invalid email or password");
        assert!(!err.is_unexpected());

        let err = AppError::Auth(AuthError::MissingName);
        assert_eq!(err.user_message(), "Please enter your name");
    }

    #[test]
    fn test_profile_messages() {
        assert_eq!(
            AppError::Profile(ProfileError::EmptyName).user_message(),
            "Name cannot be empty"
        );
        assert!(!AppError::Profile(ProfileError::NotSignedIn).is_unexpected());
    }

    #[test]
    fn test_rate_limit_message() {
        let err = AppError::Backend(BackendError::RateLimited(5));
        assert_eq!(
            err.user_message(),
            "Too many requests, please try again in 5 seconds"
        );
        assert!(!err.is_unexpected());
    }
}
