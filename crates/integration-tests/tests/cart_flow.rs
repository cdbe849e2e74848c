//! Integration tests for browsing the menu and building a cart.
//!
//! Runs against the in-memory backend seeded with the sample catalog.

#![allow(clippy::unwrap_used)]

use food_order_client::backend::BackendService;
use food_order_client::services::{ItemSelection, MenuQuery, load_category_options};
use food_order_client::store::CartChange;
use food_order_core::{CustomizationId, MenuItemId, Price};
use food_order_integration_tests::offline_state;

fn price(s: &str) -> Price {
    Price::parse(s).unwrap()
}

fn id(s: &str) -> CustomizationId {
    CustomizationId::from(s)
}

// ============================================================================
// Browsing
// ============================================================================

#[tokio::test]
async fn test_category_filter_and_search() {
    let state = offline_state().await.unwrap();

    let burgers = MenuQuery::new()
        .with_category("burgers")
        .run(state.backend())
        .await
        .unwrap();
    assert_eq!(burgers.len(), 2);

    let everything = MenuQuery::new()
        .with_category("all")
        .run(state.backend())
        .await
        .unwrap();
    assert_eq!(everything.len(), 5);

    let pizza = MenuQuery::new()
        .with_text("PIZZA")
        .run(state.backend())
        .await
        .unwrap();
    assert_eq!(pizza.len(), 1);
    assert_eq!(pizza.first().unwrap().id, MenuItemId::from("pepperoni-pizza"));

    let none = MenuQuery::new()
        .with_category("pizzas")
        .with_text("burger")
        .run(state.backend())
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_category_options() {
    let state = offline_state().await.unwrap();
    let options = load_category_options(state.backend()).await.unwrap();
    let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
    assert_eq!(values, ["all", "burgers", "pizzas", "burritos", "sides"]);
}

#[tokio::test]
async fn test_item_without_customizations() {
    let state = offline_state().await.unwrap();
    let rings = MenuItemId::from("onion-rings");
    let customizations = state.backend().list_customizations(&rings).await.unwrap();
    assert!(customizations.is_empty());
    assert!(
        state
            .backend()
            .list_customizations(&MenuItemId::from(""))
            .await
            .unwrap()
            .is_empty()
    );
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_same_selection_merges_into_one_line() {
    let state = offline_state().await.unwrap();
    let burger = MenuItemId::from("classic-cheeseburger");

    let mut first = ItemSelection::load(state.backend(), &burger).await.unwrap();
    assert_eq!(first.toppings().count(), 3);
    assert_eq!(first.sides().count(), 2);
    assert!(first.toggle(&id("extra-cheese")));
    assert!(first.toggle(&id("fries")));
    assert_eq!(first.unit_price(), price("30.99"));
    assert_eq!(first.add_to_cart(state.cart()), CartChange::Inserted);

    // Picked in the opposite order: same line.
    let mut second = ItemSelection::load(state.backend(), &burger).await.unwrap();
    second.toggle(&id("fries"));
    second.toggle(&id("extra-cheese"));
    second.increment();
    assert_eq!(second.add_to_cart(state.cart()), CartChange::Incremented);

    let cart = state.cart().snapshot();
    assert_eq!(cart.len(), 1);
    assert_eq!(state.cart().total_items(), 3);
    assert_eq!(state.cart().total_price(), price("92.97"));
}

#[tokio::test]
async fn test_different_selections_stay_separate() {
    let state = offline_state().await.unwrap();
    let burger = MenuItemId::from("classic-cheeseburger");

    let plain = ItemSelection::load(state.backend(), &burger).await.unwrap();
    plain.add_to_cart(state.cart());

    let mut loaded = ItemSelection::load(state.backend(), &burger).await.unwrap();
    loaded.toggle(&id("bacon"));
    loaded.add_to_cart(state.cart());

    let pizza = ItemSelection::load(state.backend(), &MenuItemId::from("pepperoni-pizza"))
        .await
        .unwrap();
    pizza.add_to_cart(state.cart());

    assert_eq!(state.cart().snapshot().len(), 3);
    assert_eq!(state.cart().total_items(), 3);
    // 25.99 + 27.99 + 30.99
    assert_eq!(state.cart().total_price(), price("84.97"));
}

#[tokio::test]
async fn test_edit_line_into_existing_line_merges() {
    let state = offline_state().await.unwrap();
    let burger = MenuItemId::from("classic-cheeseburger");

    let mut cheese = ItemSelection::load(state.backend(), &burger).await.unwrap();
    cheese.toggle(&id("extra-cheese"));
    cheese.add_to_cart(state.cart());

    let plain = ItemSelection::load(state.backend(), &burger).await.unwrap();
    plain.add_to_cart(state.cart());

    // Edit the plain line to add cheese: it folds into the cheese line.
    let cart = state.cart().snapshot();
    let plain_line = cart
        .lines()
        .iter()
        .find(|l| l.customizations.is_empty())
        .unwrap();
    let item = state.backend().get_menu_item(&burger).await.unwrap();
    let available = state.backend().list_customizations(&burger).await.unwrap();
    let mut edit = ItemSelection::for_line(item, available, plain_line);
    assert!(edit.is_editing());
    edit.toggle(&id("extra-cheese"));
    assert_eq!(edit.save_to_cart(state.cart()), CartChange::Merged);

    let cart = state.cart().snapshot();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines().first().unwrap().quantity, 2);
}

#[tokio::test]
async fn test_quantity_controls_and_clear() {
    let state = offline_state().await.unwrap();
    let rings = MenuItemId::from("onion-rings");
    let selection = ItemSelection::load(state.backend(), &rings).await.unwrap();
    selection.add_to_cart(state.cart());

    let none = selection.customizations();
    assert_eq!(state.cart().increase_qty(&rings, &none), CartChange::Incremented);
    assert_eq!(state.cart().total_price(), price("9.00"));
    assert_eq!(state.cart().decrease_qty(&rings, &none), CartChange::Decremented);
    assert_eq!(state.cart().decrease_qty(&rings, &none), CartChange::Removed);
    assert!(state.cart().snapshot().is_empty());
    assert_eq!(state.cart().decrease_qty(&rings, &none), CartChange::NotFound);

    selection.add_to_cart(state.cart());
    assert_eq!(state.cart().clear_cart(), CartChange::Cleared);
    assert_eq!(state.cart().total_items(), 0);
    assert_eq!(state.cart().total_price(), Price::ZERO);
}

#[tokio::test]
async fn test_subscribers_see_each_change() {
    let state = offline_state().await.unwrap();
    let mut subscription = state.cart().subscribe();
    assert!(!subscription.has_changed());

    let rings = ItemSelection::load(state.backend(), &MenuItemId::from("onion-rings"))
        .await
        .unwrap();
    rings.add_to_cart(state.cart());

    let cart = subscription.changed().await.unwrap();
    assert_eq!(cart.total_items(), 1);

    // No-op mutations are not published.
    state.cart().remove_item(&MenuItemId::from("nope"), &rings.customizations());
    assert!(!subscription.has_changed());
}
