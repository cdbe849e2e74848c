//! Integration tests against a live Appwrite project.
//!
//! These tests require `APPWRITE_ENDPOINT`, `APPWRITE_PROJECT_ID` and
//! `APPWRITE_DATABASE_ID` (plus the collection ids, if not the defaults),
//! with the catalog seeded.
//!
//! Run with: `cargo test -p food-order-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use food_order_client::backend::{BackendError, BackendService, SignUpForm};
use food_order_client::config::AppConfig;
use food_order_client::services::{ItemSelection, MenuQuery, save_name};
use food_order_client::state::AppState;
use food_order_client::store::AuthStatus;
use food_order_core::MenuItemId;
use food_order_integration_tests::unique_email;

fn live_state() -> AppState {
    let config = AppConfig::from_env().expect("APPWRITE_* environment not configured");
    AppState::new(config).expect("Failed to build Appwrite client")
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires APPWRITE_* environment"]
async fn test_list_categories_and_menu() {
    let state = live_state();

    let categories = state.backend().list_categories().await.unwrap();
    assert!(!categories.is_empty(), "Catalog has no categories");

    let first = categories.first().unwrap();
    let category = state.backend().get_category(&first.id).await.unwrap();
    assert_eq!(category.name, first.name);

    let items = MenuQuery::new()
        .with_category(first.id.as_str())
        .run(state.backend())
        .await
        .unwrap();
    assert!(items.iter().all(|i| i.category_id.as_ref() == Some(&first.id)));
}

#[tokio::test]
#[ignore = "Requires APPWRITE_* environment"]
async fn test_add_first_item_to_cart() {
    let state = live_state();
    let items = MenuQuery::new().run(state.backend()).await.unwrap();
    let item = items.first().expect("Catalog has no menu items");

    let mut selection = ItemSelection::load(state.backend(), &item.id).await.unwrap();
    if let Some(id) = selection.available().first().map(|c| c.id.clone()) {
        selection.toggle(&id);
    }
    selection.add_to_cart(state.cart());
    selection.add_to_cart(state.cart());

    assert_eq!(state.cart().snapshot().len(), 1);
    assert_eq!(state.cart().total_items(), 2);
    assert_eq!(state.cart().total_price(), selection.unit_price() * 2);
}

#[tokio::test]
#[ignore = "Requires APPWRITE_* environment"]
async fn test_missing_item_is_not_found() {
    let state = live_state();
    let result = state
        .backend()
        .get_menu_item(&MenuItemId::from("does-not-exist"))
        .await;
    assert!(matches!(result, Err(BackendError::NotFound(_))));
}

// ============================================================================
// Account Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires APPWRITE_* environment"]
async fn test_sign_up_rename_sign_out() {
    let state = live_state();
    let form = SignUpForm::parse("Integration Test", &unique_email(), "integration-password").unwrap();

    let auth = state.auth().sign_up(state.backend(), &form).await.unwrap();
    assert_eq!(auth.status, AuthStatus::Authenticated);

    let user = save_name(state.backend(), state.auth(), "Integration Renamed")
        .await
        .unwrap();
    assert_eq!(user.name, "Integration Renamed");

    state.auth().sign_out(state.backend()).await.unwrap();
    let restored = state.restore_session().await;
    assert_eq!(restored.status, AuthStatus::Anonymous);
}
