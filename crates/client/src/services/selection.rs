//! Customizing a menu item before it goes into the cart.
//!
//! [`ItemSelection`] backs both the item details screen (new line) and the
//! edit dialog for an existing line. It tracks which customizations are
//! picked and how many units, and commits the result to a [`CartStore`].

use food_order_core::{CustomizationId, Price};
use tracing::debug;

use crate::backend::{BackendError, BackendService, Customization, CustomizationKind, MenuItem};
use crate::store::{CartChange, CartCustomization, CartLine, CartStore, CustomizationSet};

/// A menu item with a customization selection and a quantity.
#[derive(Debug, Clone)]
pub struct ItemSelection {
    item: MenuItem,
    available: Vec<Customization>,
    selected: Vec<CustomizationId>,
    quantity: u32,
    /// Identity of the cart line being edited, if any.
    editing: Option<CustomizationSet>,
}

impl ItemSelection {
    /// Start a fresh selection: nothing picked, one unit.
    #[must_use]
    pub const fn new(item: MenuItem, available: Vec<Customization>) -> Self {
        Self {
            item,
            available,
            selected: Vec::new(),
            quantity: 1,
            editing: None,
        }
    }

    /// Fetch an item and its customizations and start a fresh selection.
    ///
    /// # Errors
    ///
    /// Returns an error if either backend call fails.
    pub async fn load<B: BackendService>(
        backend: &B,
        id: &food_order_core::MenuItemId,
    ) -> Result<Self, BackendError> {
        let item = backend.get_menu_item(id).await?;
        let available = backend.list_customizations(id).await?;
        Ok(Self::new(item, available))
    }

    /// Edit an existing cart line.
    ///
    /// The line's customizations are pre-selected, except those the item no
    /// longer offers. The line's quantity is kept.
    #[must_use]
    pub fn for_line(item: MenuItem, available: Vec<Customization>, line: &CartLine) -> Self {
        let selected = line
            .customizations
            .iter()
            .filter(|c| available.iter().any(|a| a.id == c.id))
            .map(|c| c.id.clone())
            .collect();
        Self {
            item,
            available,
            selected,
            quantity: line.quantity.max(1),
            editing: Some(line.customizations.clone()),
        }
    }

    #[must_use]
    pub const fn item(&self) -> &MenuItem {
        &self.item
    }

    #[must_use]
    pub fn available(&self) -> &[Customization] {
        &self.available
    }

    /// Offered customizations of one kind.
    pub fn of_kind<'a>(
        &'a self,
        kind: &'a CustomizationKind,
    ) -> impl Iterator<Item = &'a Customization> {
        self.available.iter().filter(move |c| &c.kind == kind)
    }

    pub fn toppings(&self) -> impl Iterator<Item = &Customization> {
        self.available
            .iter()
            .filter(|c| c.kind == CustomizationKind::Topping)
    }

    pub fn sides(&self) -> impl Iterator<Item = &Customization> {
        self.available
            .iter()
            .filter(|c| c.kind == CustomizationKind::Side)
    }

    #[must_use]
    pub fn is_selected(&self, id: &CustomizationId) -> bool {
        self.selected.contains(id)
    }

    /// Returns true if this selection edits an existing cart line.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Select or deselect a customization. Returns whether it is now selected.
    ///
    /// Ids the item does not offer are ignored.
    pub fn toggle(&mut self, id: &CustomizationId) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
            return false;
        }
        if self.available.iter().any(|c| &c.id == id) {
            self.selected.push(id.clone());
            return true;
        }
        debug!(customization_id = %id, item_id = %self.item.id, "Ignoring unknown customization");
        false
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    pub const fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    /// Decrease the quantity, never below one.
    pub fn decrement(&mut self) {
        self.quantity = self.quantity.saturating_sub(1).max(1);
    }

    /// Set the quantity, clamped to at least one.
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.max(1);
    }

    /// The selected customizations, in the order they were picked.
    #[must_use]
    pub fn customizations(&self) -> CustomizationSet {
        self.selected
            .iter()
            .filter_map(|id| self.available.iter().find(|c| &c.id == id))
            .map(CartCustomization::from)
            .collect()
    }

    /// Base price plus selected customization prices.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.item.price + self.customizations().total_price()
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.unit_price() * self.quantity
    }

    /// Add the selection to the cart as new units.
    pub fn add_to_cart(&self, cart: &CartStore) -> CartChange {
        cart.add_quantity(self.item.to_cart_item(), self.customizations(), self.quantity)
    }

    /// Write the selection back to the line it was opened from.
    ///
    /// A selection not opened with [`ItemSelection::for_line`] is added as new units.
    pub fn save_to_cart(&self, cart: &CartStore) -> CartChange {
        match &self.editing {
            Some(old) => cart.update_item(
                &self.item.id,
                old,
                self.customizations(),
                Some(self.quantity),
            ),
            None => self.add_to_cart(cart),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use food_order_core::MenuItemId;

    fn price(s: &str) -> Price {
        Price::parse(s).unwrap()
    }

    fn item() -> MenuItem {
        MenuItem {
            id: MenuItemId::from("burger"),
            name: "Classic Burger".to_string(),
            description: String::new(),
            image_url: "https://img.example/burger.png".to_string(),
            price: price("5"),
            rating: 4.5,
            calories: 550,
            protein: 25,
            category_id: None,
            customization_ids: vec![],
        }
    }

    fn customization(id: &str, cost: &str, kind: CustomizationKind) -> Customization {
        Customization {
            id: CustomizationId::from(id),
            name: id.to_string(),
            price: price(cost),
            kind,
        }
    }

    fn available() -> Vec<Customization> {
        vec![
            customization("cheese", "1", CustomizationKind::Topping),
            customization("bacon", "2", CustomizationKind::Topping),
            customization("fries", "3", CustomizationKind::Side),
        ]
    }

    fn id(s: &str) -> CustomizationId {
        CustomizationId::from(s)
    }

    #[test]
    fn test_groups_by_kind() {
        let selection = ItemSelection::new(item(), available());
        assert_eq!(selection.toppings().count(), 2);
        assert_eq!(selection.sides().count(), 1);
        assert_eq!(
            selection
                .of_kind(&CustomizationKind::Other("sauce".to_string()))
                .count(),
            0
        );
    }

    #[test]
    fn test_toggle() {
        let mut selection = ItemSelection::new(item(), available());
        assert!(selection.toggle(&id("cheese")));
        assert!(selection.is_selected(&id("cheese")));
        assert!(!selection.toggle(&id("cheese")));
        assert!(!selection.is_selected(&id("cheese")));
        assert!(!selection.toggle(&id("pineapple")));
        assert!(selection.customizations().is_empty());
    }

    #[test]
    fn test_quantity_floor() {
        let mut selection = ItemSelection::new(item(), available());
        assert_eq!(selection.quantity(), 1);
        selection.decrement();
        assert_eq!(selection.quantity(), 1);
        selection.increment();
        selection.increment();
        assert_eq!(selection.quantity(), 3);
        selection.set_quantity(0);
        assert_eq!(selection.quantity(), 1);
    }

    #[test]
    fn test_total_price() {
        let mut selection = ItemSelection::new(item(), available());
        selection.toggle(&id("cheese"));
        selection.toggle(&id("bacon"));
        selection.increment();
        assert_eq!(selection.unit_price(), price("8"));
        assert_eq!(selection.total_price(), price("16"));
    }

    #[test]
    fn test_add_to_cart_uses_quantity() {
        let cart = CartStore::new();
        let mut selection = ItemSelection::new(item(), available());
        selection.toggle(&id("fries"));
        selection.set_quantity(3);

        assert_eq!(selection.add_to_cart(&cart), CartChange::Inserted);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_price(), price("24"));
        assert_eq!(
            cart.snapshot().lines()[0].customizations.iter().next().unwrap().kind.as_deref(),
            Some("side")
        );
    }

    #[test]
    fn test_for_line_drops_withdrawn_customizations() {
        let cart = CartStore::new();
        let line_set: CustomizationSet = [
            CartCustomization::new("cheese", "cheese", price("1")),
            CartCustomization::new("truffle", "truffle", price("9")),
        ]
        .into_iter()
        .collect();
        cart.add_quantity(item().to_cart_item(), line_set, 2);
        let line = cart.snapshot().lines()[0].clone();

        let selection = ItemSelection::for_line(item(), available(), &line);
        assert!(selection.is_editing());
        assert!(selection.is_selected(&id("cheese")));
        assert!(!selection.is_selected(&id("truffle")));
        assert_eq!(selection.quantity(), 2);
    }

    #[test]
    fn test_save_to_cart_replaces_line() {
        let cart = CartStore::new();
        let mut fresh = ItemSelection::new(item(), available());
        fresh.toggle(&id("cheese"));
        fresh.add_to_cart(&cart);
        let line = cart.snapshot().lines()[0].clone();

        let mut edit = ItemSelection::for_line(item(), available(), &line);
        edit.toggle(&id("cheese"));
        edit.toggle(&id("bacon"));
        edit.increment();
        assert_eq!(edit.save_to_cart(&cart), CartChange::Replaced);

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.lines()[0].customizations.contains(&id("bacon")));
        assert_eq!(snapshot.lines()[0].quantity, 2);
    }

    #[test]
    fn test_save_to_cart_merges_with_matching_line() {
        let cart = CartStore::new();
        let mut plain = ItemSelection::new(item(), available());
        plain.set_quantity(2);
        plain.add_to_cart(&cart);
        let mut cheesy = ItemSelection::new(item(), available());
        cheesy.toggle(&id("cheese"));
        cheesy.add_to_cart(&cart);

        let line = cart.snapshot().lines()[1].clone();
        let mut edit = ItemSelection::for_line(item(), available(), &line);
        edit.toggle(&id("cheese"));
        assert_eq!(edit.save_to_cart(&cart), CartChange::Merged);
        assert_eq!(cart.snapshot().len(), 1);
        assert_eq!(cart.total_items(), 3);
    }
}
