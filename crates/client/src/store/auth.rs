//! Session authentication state.
//!
//! [`AuthStore`] starts in [`AuthStatus::Loading`] and settles on
//! `Authenticated` or `Anonymous` once the backend has been asked for the
//! current user. Lookup failures are logged and treated as anonymous.

use std::sync::Arc;

use food_order_core::{EmailError, PasswordError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::backend::{BackendError, BackendService, SignInForm, SignUpForm, User};
use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};

/// Errors that can occur during sign in, sign up and sign out.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email was rejected.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password was rejected.
    #[error("Weak password: {0}")]
    WeakPassword(#[from] PasswordError),

    /// Name was empty.
    #[error("Name is required")]
    MissingName,

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Loading,
    Authenticated,
    Anonymous,
}

/// A snapshot of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
}

impl AuthState {
    const fn loading(user: Option<User>) -> Self {
        Self {
            status: AuthStatus::Loading,
            user,
        }
    }

    const fn anonymous() -> Self {
        Self {
            status: AuthStatus::Anonymous,
            user: None,
        }
    }

    const fn authenticated(user: User) -> Self {
        Self {
            status: AuthStatus::Authenticated,
            user: Some(user),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }
}

/// Owner of the session state. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct AuthStore {
    sender: Arc<watch::Sender<Arc<AuthState>>>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("state", &self.snapshot())
            .finish()
    }
}

impl AuthStore {
    /// Create a store in the `Loading` state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(AuthState::loading(None)));
        Self {
            sender: Arc::new(sender),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<AuthState> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receive every state published after this call.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.sender.borrow().user.clone()
    }

    fn publish(&self, state: AuthState) -> Arc<AuthState> {
        let state = Arc::new(state);
        self.sender.send_replace(Arc::clone(&state));
        state
    }

    /// Ask the backend who is signed in and publish the result.
    ///
    /// Never fails: a missing session or any backend error leaves the store
    /// `Anonymous`. The store is `Loading` only while the request is in flight.
    #[instrument(skip_all)]
    pub async fn fetch_authenticated_user<B: BackendService>(&self, backend: &B) -> Arc<AuthState> {
        let previous = self.user();
        self.publish(AuthState::loading(previous));

        match backend.current_user().await {
            Ok(Some(user)) => {
                debug!(user_id = %user.id, "Session restored");
                set_sentry_user(&user.id, Some(user.email.as_str()));
                self.publish(AuthState::authenticated(user))
            }
            Ok(None) => {
                debug!("No active session");
                clear_sentry_user();
                self.publish(AuthState::anonymous())
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch current user");
                clear_sentry_user();
                self.publish(AuthState::anonymous())
            }
        }
    }

    /// Open a session and load the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the credentials.
    pub async fn sign_in<B: BackendService>(
        &self,
        backend: &B,
        form: &SignInForm,
    ) -> Result<Arc<AuthState>, AuthError> {
        backend.sign_in(form).await?;
        add_breadcrumb("auth", "Signed in", None);
        Ok(self.fetch_authenticated_user(backend).await)
    }

    /// Create an account, which also opens a session, and load the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the account.
    pub async fn sign_up<B: BackendService>(
        &self,
        backend: &B,
        form: &SignUpForm,
    ) -> Result<Arc<AuthState>, AuthError> {
        let user = backend.create_account(form).await?;
        add_breadcrumb("auth", "Account created", Some(&[("user_id", user.id.as_str())]));
        Ok(self.fetch_authenticated_user(backend).await)
    }

    /// End the session. A session that had already expired is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails for any other reason.
    pub async fn sign_out<B: BackendService>(&self, backend: &B) -> Result<(), AuthError> {
        match backend.sign_out().await {
            Ok(()) | Err(BackendError::Unauthorized) => {}
            Err(e) => return Err(e.into()),
        }
        clear_sentry_user();
        add_breadcrumb("auth", "Signed out", None);
        self.publish(AuthState::anonymous());
        Ok(())
    }

    /// Replace the user record, e.g. after a profile edit.
    pub fn set_user(&self, user: User) {
        self.publish(AuthState::authenticated(user));
    }
}

/// A stream of session states.
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: watch::Receiver<Arc<AuthState>>,
}

impl AuthSubscription {
    /// Wait for the next published state. `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<AuthState>> {
        self.receiver.changed().await.ok()?;
        Some(Arc::clone(&self.receiver.borrow_and_update()))
    }

    /// The latest state, marking it as seen.
    pub fn latest(&mut self) -> Arc<AuthState> {
        Arc::clone(&self.receiver.borrow_and_update())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::{Fixture, InMemoryBackend};

    const FIXTURE: &str = r"
accounts:
  - name: Ada
    email: ada@example.com
    password: correct-horse
";

    fn backend() -> InMemoryBackend {
        InMemoryBackend::new(Fixture::from_yaml(FIXTURE).unwrap())
    }

    #[test]
    fn test_starts_loading() {
        let store = AuthStore::new();
        let state = store.snapshot();
        assert!(state.is_loading());
        assert!(state.user.is_none());
    }

    #[tokio::test]
    async fn test_fetch_without_session_is_anonymous() {
        let store = AuthStore::new();
        let state = store.fetch_authenticated_user(&backend()).await;
        assert_eq!(state.status, AuthStatus::Anonymous);
        assert!(!store.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_sign_in_authenticates() {
        let store = AuthStore::new();
        let backend = backend();
        let form = SignInForm::parse("ada@example.com", "correct-horse").unwrap();

        let state = store.sign_in(&backend, &form).await.unwrap();
        assert!(state.is_authenticated());
        assert_eq!(store.user().unwrap().name, "Ada");
    }

    #[tokio::test]
    async fn test_failed_sign_in_returns_error() {
        let store = AuthStore::new();
        let form = SignInForm::parse("ada@example.com", "wrong-password").unwrap();
        let err = store.sign_in(&backend(), &form).await.unwrap_err();
        assert!(matches!(err, AuthError::Backend(BackendError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_out() {
        let store = AuthStore::new();
        let backend = backend();
        let form = SignUpForm::parse("Grace", "grace@example.com", "hopper-1906").unwrap();

        let state = store.sign_up(&backend, &form).await.unwrap();
        assert!(state.is_authenticated());
        assert_eq!(state.user.as_ref().unwrap().email.as_str(), "grace@example.com");

        store.sign_out(&backend).await.unwrap();
        assert_eq!(store.snapshot().status, AuthStatus::Anonymous);
        assert!(store.user().is_none());

        // Already signed out: still succeeds.
        store.sign_out(&backend).await.unwrap();
    }

    #[tokio::test]
    async fn test_subscription_sees_loading_then_settled() {
        let store = AuthStore::new();
        let mut subscription = store.subscribe();
        store.fetch_authenticated_user(&backend()).await;

        let latest = subscription.latest();
        assert_eq!(latest.status, AuthStatus::Anonymous);
    }
}
