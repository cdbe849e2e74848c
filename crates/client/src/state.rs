//! Application state shared by a session.

use std::sync::Arc;

use crate::backend::{AppwriteClient, Backend, BackendError};
use crate::config::AppConfig;
use crate::store::{AuthState, AuthStore, CartStore};

/// Everything one client session needs: configuration, the backend, the
/// cart and the session state.
///
/// This struct is cheaply cloneable via `Arc`. Tests build one per case
/// with [`AppState::with_backend`].
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: Option<AppConfig>,
    backend: Backend,
    cart: CartStore,
    auth: AuthStore,
}

impl AppState {
    /// Create state backed by the configured Appwrite project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self, BackendError> {
        let client = AppwriteClient::new(&config.appwrite, config.catalog_cache_ttl)?;
        Ok(Self::build(Some(config), client.into()))
    }

    /// Create state over an explicit backend, without configuration.
    #[must_use]
    pub fn with_backend(backend: impl Into<Backend>) -> Self {
        Self::build(None, backend.into())
    }

    fn build(config: Option<AppConfig>, backend: Backend) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                cart: CartStore::new(),
                auth: AuthStore::new(),
            }),
        }
    }

    /// Get the configuration, if the state was built from one.
    #[must_use]
    pub fn config(&self) -> Option<&AppConfig> {
        self.inner.config.as_ref()
    }

    /// Get a reference to the backend.
    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    /// Get a reference to the cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the session state.
    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    /// Load the current user into the session state.
    pub async fn restore_session(&self) -> Arc<AuthState> {
        self.inner
            .auth
            .fetch_authenticated_user(&self.inner.backend)
            .await
    }
}
