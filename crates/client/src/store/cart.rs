//! Session cart.
//!
//! A cart line is identified by the pair (menu item id, set of customization
//! ids). Adding an item whose identity already exists bumps that line's
//! quantity; editing a line's customizations so that it collides with
//! another line merges the two. The cart never holds two lines with the same
//! identity, and never holds a line with quantity zero.
//!
//! [`CartStore`] owns the cart and publishes an immutable [`Cart`] snapshot
//! after every applied mutation. Each mutator clones the current snapshot,
//! applies the change to the clone and swaps it in while holding the
//! channel's write lock, so concurrent callers are serialized and readers
//! only ever see whole snapshots.

use std::sync::Arc;

use food_order_core::{CustomizationId, MenuItemId, Price};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

// =============================================================================
// Customizations
// =============================================================================

/// An add-on selected for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCustomization {
    /// Catalog customization id.
    pub id: CustomizationId,
    /// Display name.
    pub name: String,
    /// Price added to every unit of the line.
    pub price: Price,
    /// Free-form grouping such as "topping" or "side".
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl CartCustomization {
    /// Create a customization with no kind.
    #[must_use]
    pub fn new(id: impl Into<CustomizationId>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            kind: None,
        }
    }

    /// Set the kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// The customizations chosen for one cart line.
///
/// Two sets are equal when they hold the same customization ids, in any
/// order. Names and prices are not compared. Duplicate ids are collapsed on
/// construction, keeping the first occurrence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CartCustomization>", into = "Vec<CartCustomization>")]
pub struct CustomizationSet(Vec<CartCustomization>);

impl CustomizationSet {
    /// The empty selection.
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Number of customizations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartCustomization> {
        self.0.iter()
    }

    /// Returns true if a customization with `id` is selected.
    #[must_use]
    pub fn contains(&self, id: &CustomizationId) -> bool {
        self.0.iter().any(|c| &c.id == id)
    }

    /// Customizations whose kind equals `kind`.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a CartCustomization> {
        self.0.iter().filter(move |c| c.kind.as_deref() == Some(kind))
    }

    /// Sum of the customization prices.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.0.iter().map(|c| c.price).sum()
    }

    fn sorted_ids(&self) -> Vec<&CustomizationId> {
        let mut ids: Vec<_> = self.0.iter().map(|c| &c.id).collect();
        ids.sort_unstable();
        ids
    }
}

impl PartialEq for CustomizationSet {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.sorted_ids() == other.sorted_ids()
    }
}

impl Eq for CustomizationSet {}

impl FromIterator<CartCustomization> for CustomizationSet {
    fn from_iter<I: IntoIterator<Item = CartCustomization>>(iter: I) -> Self {
        let mut selected: Vec<CartCustomization> = Vec::new();
        for customization in iter {
            if !selected.iter().any(|c| c.id == customization.id) {
                selected.push(customization);
            }
        }
        Self(selected)
    }
}

impl From<Vec<CartCustomization>> for CustomizationSet {
    fn from(customizations: Vec<CartCustomization>) -> Self {
        customizations.into_iter().collect()
    }
}

impl From<CustomizationSet> for Vec<CartCustomization> {
    fn from(set: CustomizationSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a CustomizationSet {
    type Item = &'a CartCustomization;
    type IntoIter = std::slice::Iter<'a, CartCustomization>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Lines
// =============================================================================

/// The menu item fields copied into a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Menu item id.
    pub id: MenuItemId,
    /// Image shown next to the line.
    pub image_url: String,
    /// Display name.
    pub name: String,
    /// Base unit price, without customizations.
    pub price: Price,
}

/// One row of the cart: `quantity` units of an item with one customization selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Menu item id.
    pub id: MenuItemId,
    /// Image shown next to the line.
    pub image_url: String,
    /// Display name.
    pub name: String,
    /// Base unit price, without customizations.
    pub price: Price,
    /// Always at least 1.
    pub quantity: u32,
    /// Selected add-ons.
    pub customizations: CustomizationSet,
}

impl CartLine {
    fn new(item: CartItem, customizations: CustomizationSet, quantity: u32) -> Self {
        Self {
            id: item.id,
            image_url: item.image_url,
            name: item.name,
            price: item.price,
            quantity,
            customizations,
        }
    }

    /// Returns true if this line has the identity (`id`, `customizations`).
    #[must_use]
    pub fn matches(&self, id: &MenuItemId, customizations: &CustomizationSet) -> bool {
        &self.id == id && &self.customizations == customizations
    }

    /// Base price plus customization prices for a single unit.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.price + self.customizations.total_price()
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price() * self.quantity
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Inserted,
    /// An existing line's quantity went up.
    Incremented,
    /// An existing line's quantity went down but stayed positive.
    Decremented,
    /// A line was removed.
    Removed,
    /// A line was edited in place.
    Replaced,
    /// A line was folded into another line with the same identity.
    Merged,
    /// Every line was removed.
    Cleared,
    /// The request was valid but changed nothing.
    Unchanged,
    /// No line has the requested identity.
    NotFound,
}

impl CartChange {
    /// Returns true if the cart contents changed.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        !matches!(self, Self::Unchanged | Self::NotFound)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// An immutable view of the cart lines, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// The lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line with identity (`id`, `customizations`).
    #[must_use]
    pub fn find(&self, id: &MenuItemId, customizations: &CustomizationSet) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(id, customizations))
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |total, line| total.saturating_add(line.quantity))
    }

    /// Sum of `quantity × (base price + customization prices)` across all lines.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    fn position(&self, id: &MenuItemId, customizations: &CustomizationSet) -> Option<usize> {
        self.lines.iter().position(|l| l.matches(id, customizations))
    }

    fn add(&mut self, item: CartItem, customizations: CustomizationSet, quantity: u32) -> CartChange {
        if quantity == 0 {
            return CartChange::Unchanged;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(&item.id, &customizations))
        {
            line.quantity = line.quantity.saturating_add(quantity);
            return CartChange::Incremented;
        }
        self.lines
            .push(CartLine::new(item, customizations, quantity));
        CartChange::Inserted
    }

    fn remove(&mut self, id: &MenuItemId, customizations: &CustomizationSet) -> CartChange {
        match self.position(id, customizations) {
            Some(idx) => {
                self.lines.remove(idx);
                CartChange::Removed
            }
            None => CartChange::NotFound,
        }
    }

    fn increase(&mut self, id: &MenuItemId, customizations: &CustomizationSet) -> CartChange {
        match self.lines.iter_mut().find(|l| l.matches(id, customizations)) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                CartChange::Incremented
            }
            None => CartChange::NotFound,
        }
    }

    fn decrease(&mut self, id: &MenuItemId, customizations: &CustomizationSet) -> CartChange {
        let Some(idx) = self.position(id, customizations) else {
            return CartChange::NotFound;
        };
        let Some(line) = self.lines.get_mut(idx) else {
            return CartChange::NotFound;
        };
        line.quantity = line.quantity.saturating_sub(1);
        if line.quantity == 0 {
            self.lines.remove(idx);
            CartChange::Removed
        } else {
            CartChange::Decremented
        }
    }

    fn update(
        &mut self,
        id: &MenuItemId,
        old: &CustomizationSet,
        new: CustomizationSet,
        new_quantity: Option<u32>,
    ) -> CartChange {
        let Some(idx) = self.position(id, old) else {
            return CartChange::NotFound;
        };
        let Some(current) = self.lines.get(idx) else {
            return CartChange::NotFound;
        };
        let quantity = new_quantity.unwrap_or(current.quantity);

        if quantity == 0 {
            self.lines.remove(idx);
            return CartChange::Removed;
        }

        let collision = if old == &new {
            None
        } else {
            self.lines
                .iter()
                .enumerate()
                .position(|(i, l)| i != idx && l.matches(id, &new))
        };

        if let Some(target) = collision {
            if let Some(line) = self.lines.get_mut(target) {
                line.quantity = line.quantity.saturating_add(quantity);
            }
            self.lines.remove(idx);
            return CartChange::Merged;
        }

        match self.lines.get_mut(idx) {
            Some(line) => {
                line.customizations = new;
                line.quantity = quantity;
                CartChange::Replaced
            }
            None => CartChange::NotFound,
        }
    }

    fn clear(&mut self) -> CartChange {
        self.lines.clear();
        CartChange::Cleared
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// Owner of the session cart.
///
/// Cheaply cloneable; all clones share the same cart. Construct one per
/// session (see [`crate::state::AppState`]) or one per test.
#[derive(Clone)]
pub struct CartStore {
    sender: Arc<watch::Sender<Arc<Cart>>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.snapshot())
            .finish()
    }
}

impl CartStore {
    /// Create a store with an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(Cart::default()));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// The current cart.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Cart> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receive every snapshot published after this call.
    #[must_use]
    pub fn subscribe(&self) -> CartSubscription {
        CartSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Apply `mutation` to a copy of the cart and publish it if anything changed.
    fn apply(&self, mutation: impl FnOnce(&mut Cart) -> CartChange) -> CartChange {
        let mut change = CartChange::Unchanged;
        self.sender.send_if_modified(|current| {
            let mut next = Cart::clone(current);
            change = mutation(&mut next);
            if change.is_applied() {
                *current = Arc::new(next);
                true
            } else {
                false
            }
        });
        change
    }

    /// Add one unit of `item` with `customizations`.
    ///
    /// Increments the matching line if there is one, otherwise appends a new
    /// line with quantity 1. A customization id listed twice is kept once and
    /// charged once.
    pub fn add_item(&self, item: CartItem, customizations: CustomizationSet) -> CartChange {
        self.add_quantity(item, customizations, 1)
    }

    /// Add `quantity` units of `item` with `customizations`.
    ///
    /// Same merge rule as [`CartStore::add_item`]. A quantity of zero changes nothing.
    pub fn add_quantity(
        &self,
        item: CartItem,
        customizations: CustomizationSet,
        quantity: u32,
    ) -> CartChange {
        let id = item.id.clone();
        let change = self.apply(|cart| cart.add(item, customizations, quantity));
        debug!(item_id = %id, quantity, ?change, "cart add");
        change
    }

    /// Remove the line with identity (`id`, `customizations`).
    pub fn remove_item(&self, id: &MenuItemId, customizations: &CustomizationSet) -> CartChange {
        let change = self.apply(|cart| cart.remove(id, customizations));
        debug!(item_id = %id, ?change, "cart remove");
        change
    }

    /// Increment the matching line by one.
    pub fn increase_qty(&self, id: &MenuItemId, customizations: &CustomizationSet) -> CartChange {
        let change = self.apply(|cart| cart.increase(id, customizations));
        debug!(item_id = %id, ?change, "cart increase");
        change
    }

    /// Decrement the matching line by one, removing it when it reaches zero.
    pub fn decrease_qty(&self, id: &MenuItemId, customizations: &CustomizationSet) -> CartChange {
        let change = self.apply(|cart| cart.decrease(id, customizations));
        debug!(item_id = %id, ?change, "cart decrease");
        change
    }

    /// Edit the customizations and/or quantity of the line (`id`, `old`).
    ///
    /// If the edit changes the customization set and another line already
    /// has identity (`id`, `new`), the edited line's quantity is added to
    /// that line and the edited line is removed. The surviving line keeps its
    /// own customization records. Otherwise the line is replaced in place.
    /// A `new_quantity` of zero removes the line.
    pub fn update_item(
        &self,
        id: &MenuItemId,
        old: &CustomizationSet,
        new: CustomizationSet,
        new_quantity: Option<u32>,
    ) -> CartChange {
        let change = self.apply(|cart| cart.update(id, old, new, new_quantity));
        debug!(item_id = %id, ?new_quantity, ?change, "cart update");
        change
    }

    /// Remove every line.
    pub fn clear_cart(&self) -> CartChange {
        let change = self.apply(Cart::clear);
        debug!("cart cleared");
        change
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.sender.borrow().total_items()
    }

    /// Total price of the cart.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.sender.borrow().total_price()
    }
}

/// A stream of cart snapshots.
#[derive(Debug)]
pub struct CartSubscription {
    receiver: watch::Receiver<Arc<Cart>>,
}

impl CartSubscription {
    /// Wait for the next published snapshot.
    ///
    /// Returns `None` once every [`CartStore`] clone has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Cart>> {
        self.receiver.changed().await.ok()?;
        Some(Arc::clone(&self.receiver.borrow_and_update()))
    }

    /// Returns true if a snapshot was published since the last one was seen.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }
}
