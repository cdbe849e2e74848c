//! Backend service: accounts, catalog documents and file storage.
//!
//! # Architecture
//!
//! - [`BackendService`] is the seam between the app and the hosted backend
//! - [`AppwriteClient`] talks to the Appwrite REST API with `reqwest`
//! - [`InMemoryBackend`] serves fixture data for tests and offline runs
//! - [`Backend`] picks one of the two at runtime
//!
//! Catalog reads (menu, categories, customizations) are cached for a few
//! minutes by the Appwrite client. Account and profile operations are never
//! cached.

mod appwrite;
mod cache;
mod memory;
pub mod types;

pub use appwrite::AppwriteClient;
pub use memory::{Fixture, InMemoryBackend};
pub use types::*;

use std::future::Future;
use std::path::Path;

use food_order_core::{CategoryId, Email, MenuItemId, Password, UserId};
use thiserror::Error;
use url::Url;

use crate::store::AuthError;

/// Default number of menu items returned by a search.
pub const DEFAULT_MENU_LIMIT: u32 = 10;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// No session, or the session has expired.
    #[error("Unauthorized")]
    Unauthorized,

    /// Document not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// A response did not describe a valid record.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend is not configured for this operation.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

// =============================================================================
// Requests
// =============================================================================

/// Credentials for opening a session.
#[derive(Debug, Clone)]
pub struct SignInForm {
    pub email: Email,
    pub password: Password,
}

impl SignInForm {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or password is rejected.
    pub fn parse(email: &str, password: &str) -> Result<Self, AuthError> {
        Ok(Self {
            email: Email::parse(email)?,
            password: Password::parse(password)?,
        })
    }
}

/// Details for creating an account.
#[derive(Debug, Clone)]
pub struct SignUpForm {
    pub name: String,
    pub email: Email,
    pub password: Password,
}

impl SignUpForm {
    /// Validate raw form input. The name is trimmed and must not be empty.
    ///
    /// # Errors
    ///
    /// Returns an error if any field is missing or rejected.
    pub fn parse(name: &str, email: &str, password: &str) -> Result<Self, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        Ok(Self {
            name: name.to_owned(),
            email: Email::parse(email)?,
            password: Password::parse(password)?,
        })
    }

    /// The credentials used to sign in after the account is created.
    #[must_use]
    pub fn sign_in_form(&self) -> SignInForm {
        SignInForm {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

/// Menu listing filter. Empty fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MenuFilter {
    pub category: Option<CategoryId>,
    /// Full-text search on the item name.
    pub query: Option<String>,
    pub limit: Option<u32>,
}

impl MenuFilter {
    /// Returns true if `item` satisfies the category and query constraints.
    ///
    /// Used by backends that filter locally; the query is matched as a
    /// case-insensitive substring of the name.
    #[must_use]
    pub fn matches(&self, item: &MenuItem) -> bool {
        let category_ok = self
            .category
            .as_ref()
            .is_none_or(|c| item.category_id.as_ref() == Some(c));
        let query_ok = self
            .query
            .as_deref()
            .is_none_or(|q| item.name.to_lowercase().contains(&q.to_lowercase()));
        category_ok && query_ok
    }
}

/// Profile fields to change. `None` and empty values are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Change only the name.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            avatar_url: None,
        }
    }

    /// Change only the avatar.
    #[must_use]
    pub fn avatar(url: impl Into<String>) -> Self {
        Self {
            name: None,
            avatar_url: Some(url.into()),
        }
    }

    /// The name to send, if non-empty.
    #[must_use]
    pub fn name_to_send(&self) -> Option<&str> {
        self.name.as_deref().filter(|s| !s.is_empty())
    }

    /// The avatar URL to send, if non-empty.
    #[must_use]
    pub fn avatar_to_send(&self) -> Option<&str> {
        self.avatar_url.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns true if nothing would be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name_to_send().is_none() && self.avatar_to_send().is_none()
    }
}

/// An image file to store.
#[derive(Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Wrap file contents, deriving the content type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = image_content_type(&file_name);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

/// Content type for an image file name: png, webp, otherwise jpeg.
#[must_use]
pub fn image_content_type(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

// =============================================================================
// BackendService
// =============================================================================

/// Operations the app needs from the hosted backend.
pub trait BackendService: Send + Sync {
    /// The profile of the signed-in user, or `None` without a session.
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, BackendError>> + Send;

    /// Create an account, open a session and create its profile document.
    fn create_account(
        &self,
        form: &SignUpForm,
    ) -> impl Future<Output = Result<User, BackendError>> + Send;

    /// Open a session with email and password.
    fn sign_in(&self, form: &SignInForm) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// End the current session.
    fn sign_out(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Menu items matching `filter`.
    fn list_menu(
        &self,
        filter: &MenuFilter,
    ) -> impl Future<Output = Result<Vec<MenuItem>, BackendError>> + Send;

    /// All categories.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, BackendError>> + Send;

    /// One category.
    fn get_category(
        &self,
        id: &CategoryId,
    ) -> impl Future<Output = Result<Category, BackendError>> + Send;

    /// One menu item.
    fn get_menu_item(
        &self,
        id: &MenuItemId,
    ) -> impl Future<Output = Result<MenuItem, BackendError>> + Send;

    /// Customizations offered for a menu item. An empty id yields an empty list.
    fn list_customizations(
        &self,
        menu_id: &MenuItemId,
    ) -> impl Future<Output = Result<Vec<Customization>, BackendError>> + Send;

    /// Change profile fields and return the updated record.
    fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<User, BackendError>> + Send;

    /// Store an image and return a URL that serves it.
    fn upload_image(
        &self,
        upload: ImageUpload,
    ) -> impl Future<Output = Result<Url, BackendError>> + Send;
}

/// A backend chosen at runtime.
#[derive(Debug, Clone)]
pub enum Backend {
    Appwrite(AppwriteClient),
    Memory(InMemoryBackend),
}

impl From<AppwriteClient> for Backend {
    fn from(client: AppwriteClient) -> Self {
        Self::Appwrite(client)
    }
}

impl From<InMemoryBackend> for Backend {
    fn from(backend: InMemoryBackend) -> Self {
        Self::Memory(backend)
    }
}

impl BackendService for Backend {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        match self {
            Self::Appwrite(b) => b.current_user().await,
            Self::Memory(b) => b.current_user().await,
        }
    }

    async fn create_account(&self, form: &SignUpForm) -> Result<User, BackendError> {
        match self {
            Self::Appwrite(b) => b.create_account(form).await,
            Self::Memory(b) => b.create_account(form).await,
        }
    }

    async fn sign_in(&self, form: &SignInForm) -> Result<(), BackendError> {
        match self {
            Self::Appwrite(b) => b.sign_in(form).await,
            Self::Memory(b) => b.sign_in(form).await,
        }
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        match self {
            Self::Appwrite(b) => b.sign_out().await,
            Self::Memory(b) => b.sign_out().await,
        }
    }

    async fn list_menu(&self, filter: &MenuFilter) -> Result<Vec<MenuItem>, BackendError> {
        match self {
            Self::Appwrite(b) => b.list_menu(filter).await,
            Self::Memory(b) => b.list_menu(filter).await,
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        match self {
            Self::Appwrite(b) => b.list_categories().await,
            Self::Memory(b) => b.list_categories().await,
        }
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Category, BackendError> {
        match self {
            Self::Appwrite(b) => b.get_category(id).await,
            Self::Memory(b) => b.get_category(id).await,
        }
    }

    async fn get_menu_item(&self, id: &MenuItemId) -> Result<MenuItem, BackendError> {
        match self {
            Self::Appwrite(b) => b.get_menu_item(id).await,
            Self::Memory(b) => b.get_menu_item(id).await,
        }
    }

    async fn list_customizations(
        &self,
        menu_id: &MenuItemId,
    ) -> Result<Vec<Customization>, BackendError> {
        match self {
            Self::Appwrite(b) => b.list_customizations(menu_id).await,
            Self::Memory(b) => b.list_customizations(menu_id).await,
        }
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, BackendError> {
        match self {
            Self::Appwrite(b) => b.update_profile(user_id, update).await,
            Self::Memory(b) => b.update_profile(user_id, update).await,
        }
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<Url, BackendError> {
        match self {
            Self::Appwrite(b) => b.upload_image(upload).await,
            Self::Memory(b) => b.upload_image(upload).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::NotFound("menu item burger".to_string());
        assert_eq!(err.to_string(), "Not found: menu item burger");

        let err = BackendError::RateLimited(3);
        assert_eq!(err.to_string(), "Rate limited, retry after 3 seconds");
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("me.png"), "image/png");
        assert_eq!(image_content_type("me.PNG"), "image/png");
        assert_eq!(image_content_type("me.webp"), "image/webp");
        assert_eq!(image_content_type("me.jpg"), "image/jpeg");
        assert_eq!(image_content_type("me.heic"), "image/jpeg");
        assert_eq!(image_content_type("no-extension"), "image/jpeg");
    }

    #[test]
    fn test_profile_update_skips_empty_fields() {
        let update = ProfileUpdate {
            name: Some(String::new()),
            avatar_url: Some("https://cdn.example/a.png".to_string()),
        };
        assert_eq!(update.name_to_send(), None);
        assert_eq!(update.avatar_to_send(), Some("https://cdn.example/a.png"));
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
        assert!(ProfileUpdate::name("").is_empty());
    }

    #[test]
    fn test_sign_up_form_requires_every_field() {
        assert!(matches!(
            SignUpForm::parse("   ", "a@b.com", "password1"),
            Err(AuthError::MissingName)
        ));
        assert!(matches!(
            SignUpForm::parse("Ada", "", "password1"),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            SignUpForm::parse("Ada", "a@b.com", ""),
            Err(AuthError::WeakPassword(_))
        ));
        let form = SignUpForm::parse(" Ada ", "Ada@B.com", "password1").unwrap();
        assert_eq!(form.name, "Ada");
        assert_eq!(form.sign_in_form().email.as_str(), "ada@b.com");
    }

    #[test]
    fn test_menu_filter_matches() {
        let item = MenuItem {
            id: MenuItemId::from("burger"),
            name: "Classic Cheeseburger".to_string(),
            description: String::new(),
            image_url: String::new(),
            price: food_order_core::Price::ZERO,
            rating: 0.0,
            calories: 0,
            protein: 0,
            category_id: Some(CategoryId::from("burgers")),
            customization_ids: vec![],
        };
        assert!(MenuFilter::default().matches(&item));
        assert!(
            MenuFilter {
                query: Some("cheese".to_string()),
                ..MenuFilter::default()
            }
            .matches(&item)
        );
        assert!(
            !MenuFilter {
                category: Some(CategoryId::from("pizzas")),
                ..MenuFilter::default()
            }
            .matches(&item)
        );
    }
}
