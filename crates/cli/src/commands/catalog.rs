//! Menu browsing commands.

use food_order_client::Result;
use food_order_client::backend::{BackendService, MenuItem};
use food_order_client::services::{ItemSelection, MenuQuery, load_category_options};
use food_order_client::state::AppState;
use food_order_core::MenuItemId;

/// List menu items matching the filters.
#[allow(clippy::print_stdout)]
pub async fn menu(
    state: &AppState,
    category: Option<&str>,
    text: Option<&str>,
    limit: Option<u32>,
) -> Result<()> {
    let mut query = MenuQuery::new();
    if let Some(category) = category {
        query.set_category(category);
    }
    if let Some(text) = text {
        query.set_text(text);
    }
    if let Some(limit) = limit {
        query.set_limit(limit);
    }

    let items = query.run(state.backend()).await?;
    tracing::info!(count = items.len(), "Menu loaded");

    if items.is_empty() {
        println!("No items match.");
        return Ok(());
    }
    for item in &items {
        println!("{}", menu_row(item));
    }
    Ok(())
}

/// List categories, starting with the "all" pseudo-category.
#[allow(clippy::print_stdout)]
pub async fn categories(state: &AppState) -> Result<()> {
    for option in load_category_options(state.backend()).await? {
        println!("{:<16} {}", option.value, option.name);
    }
    Ok(())
}

/// Show an item with its toppings and sides.
#[allow(clippy::print_stdout)]
pub async fn item(state: &AppState, id: &str) -> Result<()> {
    let id = MenuItemId::from(id);
    let selection = ItemSelection::load(state.backend(), &id).await?;
    let item = selection.item();

    println!("{} ({})", item.name, item.price);
    if !item.description.is_empty() {
        println!("  {}", item.description);
    }
    println!(
        "  {} kcal, {}g protein, rated {:.1}",
        item.calories, item.protein, item.rating
    );
    if let Some(category_id) = &item.category_id {
        if let Ok(category) = state.backend().get_category(category_id).await {
            println!("  Category: {}", category.name);
        }
    }

    for (title, options) in [
        ("Toppings", selection.toppings().collect::<Vec<_>>()),
        ("Sides", selection.sides().collect::<Vec<_>>()),
    ] {
        if options.is_empty() {
            continue;
        }
        println!("{title}:");
        for option in options {
            println!("  {:<16} {:<20} +{}", option.id.as_str(), option.name, option.price);
        }
    }
    Ok(())
}

fn menu_row(item: &MenuItem) -> String {
    format!("{:<24} {:<28} {:>8}", item.id.as_str(), item.name, item.price.to_string())
}
