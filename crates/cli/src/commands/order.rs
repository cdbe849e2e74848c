//! Build a cart in-process and print it.
//!
//! Every positional item id adds one unit. Units of the same item share
//! the customizations given with `--with`, so they merge into one line.

use std::collections::HashMap;

use food_order_client::services::ItemSelection;
use food_order_client::state::AppState;
use food_order_client::store::{Cart, CartLine};
use food_order_client::{AppError, Result};
use food_order_core::{CustomizationId, MenuItemId};
use thiserror::Error;

/// Errors in `--with` arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtraArgError {
    #[error("Expected <item-id>:<customization-id>, got {0:?}")]
    Malformed(String),
}

/// A customization requested for every unit of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraChoice {
    pub item: MenuItemId,
    pub customization: CustomizationId,
}

/// Parse `<item-id>:<customization-id>` pairs.
///
/// # Errors
///
/// Returns an error for a value without a `:` or with an empty side.
pub fn parse_customizations(
    values: &[String],
) -> std::result::Result<Vec<ExtraChoice>, ExtraArgError> {
    values
        .iter()
        .map(|value| {
            let (item, customization) = value
                .split_once(':')
                .map(|(i, c)| (i.trim(), c.trim()))
                .filter(|(i, c)| !i.is_empty() && !c.is_empty())
                .ok_or_else(|| ExtraArgError::Malformed(value.clone()))?;
            Ok(ExtraChoice {
                item: MenuItemId::from(item),
                customization: CustomizationId::from(customization),
            })
        })
        .collect()
}

/// Add each item to the cart and print the result.
pub async fn order(state: &AppState, items: &[String], extras: &[ExtraChoice]) -> Result<()> {
    let mut selections: HashMap<MenuItemId, ItemSelection> = HashMap::new();
    for id in items {
        let id = MenuItemId::from(id.as_str());
        if !selections.contains_key(&id) {
            let selection = ItemSelection::load(state.backend(), &id).await?;
            selections.insert(id, selection);
        }
    }

    for extra in extras {
        let selection = selections.get_mut(&extra.item).ok_or_else(|| {
            AppError::BadRequest(format!("{} is not in the order", extra.item))
        })?;
        if !selection.is_selected(&extra.customization) && !selection.toggle(&extra.customization) {
            return Err(AppError::BadRequest(format!(
                "{} does not offer {}",
                extra.item, extra.customization
            )));
        }
    }

    for id in items {
        if let Some(selection) = selections.get(&MenuItemId::from(id.as_str())) {
            let change = selection.add_to_cart(state.cart());
            tracing::debug!(item_id = %id, ?change, "Added to cart");
        }
    }

    print_cart(&state.cart().snapshot());
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_cart(cart: &Cart) {
    for line in cart.lines() {
        println!("{}", line_row(line));
    }
    println!("Items: {}", cart.total_items());
    println!("Total: {}", cart.total_price());
}

fn line_row(line: &CartLine) -> String {
    let extras: Vec<&str> = line.customizations.iter().map(|c| c.name.as_str()).collect();
    let name = if extras.is_empty() {
        line.name.clone()
    } else {
        format!("{} ({})", line.name, extras.join(", "))
    };
    format!("{:>3} x {:<48} {:>9}", line.quantity, name, line.line_total().to_string())
}
