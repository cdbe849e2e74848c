//! In-memory backend for tests and offline runs.
//!
//! Serves a fixed catalog loaded from a [`Fixture`] and keeps accounts,
//! the session and uploaded files in process memory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use food_order_core::{AccountId, CategoryId, Email, MenuItemId, UserId, unique_id};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use url::Url;

use super::types::{Category, Customization, MenuItem, User};
use super::{BackendError, BackendService, ImageUpload, MenuFilter, ProfileUpdate, SignInForm, SignUpForm};

const BASE_URL: &str = "memory://food-order/";

/// Catalog and accounts to seed an [`InMemoryBackend`] with.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub categories: Vec<Category>,
    pub customizations: Vec<Customization>,
    pub menu: Vec<MenuItem>,
    pub accounts: Vec<FixtureAccount>,
}

/// A pre-registered account.
#[derive(Clone, Deserialize)]
pub struct FixtureAccount {
    pub name: String,
    pub email: Email,
    pub password: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl std::fmt::Debug for FixtureAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureAccount")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Fixture {
    /// Parse a YAML fixture.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidPayload`] if the document does not parse.
    pub fn from_yaml(yaml: &str) -> Result<Self, BackendError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| BackendError::InvalidPayload(format!("fixture: {e}")))
    }

    /// Read and parse a YAML fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub async fn load(path: &Path) -> Result<Self, BackendError> {
        let yaml = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&yaml)
    }
}

struct Account {
    user: User,
    password: SecretString,
}

#[derive(Default)]
struct MemoryState {
    accounts: Vec<Account>,
    session: Option<AccountId>,
    files: HashMap<String, ImageUpload>,
}

impl MemoryState {
    fn register(&mut self, name: &str, email: &Email, password: SecretString, avatar: Option<String>) -> User {
        let avatar_url = avatar.unwrap_or_else(|| initials_url(name));
        let user = User {
            id: UserId::unique(),
            account_id: AccountId::unique(),
            name: name.to_owned(),
            email: email.clone(),
            avatar_url,
        };
        self.accounts.push(Account {
            user: user.clone(),
            password,
        });
        user
    }

    fn session_user(&self) -> Option<&User> {
        let account_id = self.session.as_ref()?;
        self.accounts
            .iter()
            .map(|a| &a.user)
            .find(|u| &u.account_id == account_id)
    }
}

fn initials_url(name: &str) -> String {
    Url::parse(BASE_URL)
        .and_then(|base| base.join("avatars/initials"))
        .map(|mut url| {
            url.query_pairs_mut().append_pair("name", name);
            url.to_string()
        })
        .unwrap_or_default()
}

/// A [`BackendService`] over fixture data.
///
/// Cheaply cloneable; clones share accounts, session and files.
#[derive(Clone)]
pub struct InMemoryBackend {
    catalog: Arc<Fixture>,
    state: Arc<RwLock<MemoryState>>,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("menu_items", &self.catalog.menu.len())
            .field("categories", &self.catalog.categories.len())
            .field("customizations", &self.catalog.customizations.len())
            .finish_non_exhaustive()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(Fixture::default())
    }
}

impl InMemoryBackend {
    /// Create a backend seeded with `fixture`.
    #[must_use]
    pub fn new(fixture: Fixture) -> Self {
        let mut state = MemoryState::default();
        for account in &fixture.accounts {
            state.register(
                &account.name,
                &account.email,
                SecretString::from(account.password.clone()),
                account.avatar_url.clone(),
            );
        }
        Self {
            catalog: Arc::new(Fixture {
                accounts: Vec::new(),
                ..fixture
            }),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Create a backend from a YAML fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub async fn from_fixture_file(path: &Path) -> Result<Self, BackendError> {
        Ok(Self::new(Fixture::load(path).await?))
    }

    /// Number of files uploaded so far.
    pub async fn uploaded_files(&self) -> usize {
        self.state.read().await.files.len()
    }

    fn base_url(path: &str) -> Result<Url, BackendError> {
        Ok(Url::parse(BASE_URL)?.join(path)?)
    }
}

impl BackendService for InMemoryBackend {
    async fn current_user(&self) -> Result<Option<User>, BackendError> {
        Ok(self.state.read().await.session_user().cloned())
    }

    #[instrument(skip(self, form), fields(email = %form.email))]
    async fn create_account(&self, form: &SignUpForm) -> Result<User, BackendError> {
        let mut state = self.state.write().await;
        if state.accounts.iter().any(|a| a.user.email == form.email) {
            return Err(BackendError::Api {
                status: 409,
                code: "user_already_exists".to_string(),
                message: "A user with the same email already exists".to_string(),
            });
        }
        let password = SecretString::from(form.password.expose().to_owned());
        let user = state.register(&form.name, &form.email, password, None);
        state.session = Some(user.account_id.clone());
        debug!(user_id = %user.id, "Account created");
        Ok(user)
    }

    #[instrument(skip(self, form), fields(email = %form.email))]
    async fn sign_in(&self, form: &SignInForm) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        let account_id = state
            .accounts
            .iter()
            .find(|a| {
                a.user.email == form.email && a.password.expose_secret() == form.password.expose()
            })
            .map(|a| a.user.account_id.clone())
            .ok_or(BackendError::Unauthorized)?;
        state.session = Some(account_id);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        match state.session.take() {
            Some(_) => Ok(()),
            None => Err(BackendError::Unauthorized),
        }
    }

    async fn list_menu(&self, filter: &MenuFilter) -> Result<Vec<MenuItem>, BackendError> {
        let limit = filter
            .limit
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        Ok(self
            .catalog
            .menu
            .iter()
            .filter(|item| filter.matches(item))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        Ok(self.catalog.categories.clone())
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Category, BackendError> {
        self.catalog
            .categories
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("category {id}")))
    }

    async fn get_menu_item(&self, id: &MenuItemId) -> Result<MenuItem, BackendError> {
        self.catalog
            .menu
            .iter()
            .find(|item| &item.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("menu item {id}")))
    }

    async fn list_customizations(
        &self,
        menu_id: &MenuItemId,
    ) -> Result<Vec<Customization>, BackendError> {
        let Some(item) = self.catalog.menu.iter().find(|item| &item.id == menu_id) else {
            return Ok(Vec::new());
        };
        Ok(self
            .catalog
            .customizations
            .iter()
            .filter(|c| item.customization_ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, BackendError> {
        let mut state = self.state.write().await;
        let account = state
            .accounts
            .iter_mut()
            .find(|a| &a.user.id == user_id)
            .ok_or_else(|| BackendError::NotFound(format!("user {user_id}")))?;
        if let Some(name) = update.name_to_send() {
            account.user.name = name.to_owned();
        }
        if let Some(avatar) = update.avatar_to_send() {
            account.user.avatar_url = avatar.to_owned();
        }
        Ok(account.user.clone())
    }

    #[instrument(skip(self, upload), fields(file_name = %upload.file_name))]
    async fn upload_image(&self, upload: ImageUpload) -> Result<Url, BackendError> {
        let file_id = unique_id();
        let url = Self::base_url(&format!("storage/files/{file_id}/view"))?;
        self.state.write().await.files.insert(file_id, upload);
        Ok(url)
    }
}
