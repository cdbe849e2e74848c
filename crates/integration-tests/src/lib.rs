//! Integration tests for the Food Order client.
//!
//! # Running Tests
//!
//! ```bash
//! # Offline tests (in-memory backend, sample catalog)
//! cargo test -p food-order-integration-tests
//!
//! # Live tests against an Appwrite project (APPWRITE_* variables set)
//! cargo test -p food-order-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_flow` - browsing, customizing and editing the cart
//! - `session_flow` - sign up, sign in, profile edits
//! - `appwrite_live` - the same flows against a real project

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::{Path, PathBuf};

use food_order_client::backend::{BackendError, InMemoryBackend};
use food_order_client::state::AppState;

/// Path of the sample catalog shipped with the client crate.
#[must_use]
pub fn sample_catalog_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../client/fixtures/catalog.yaml")
}

/// Email and password of the account in the sample catalog.
pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "demo-password";

/// App state over the sample catalog.
///
/// # Errors
///
/// Returns an error if the fixture cannot be read or parsed.
pub async fn offline_state() -> Result<AppState, BackendError> {
    let backend = InMemoryBackend::from_fixture_file(&sample_catalog_path()).await?;
    Ok(AppState::with_backend(backend))
}

/// A unique email address for accounts created by tests.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", uuid::Uuid::new_v4().simple())
}
