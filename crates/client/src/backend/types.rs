//! Catalog and account records returned by a [`super::BackendService`].

use core::fmt;

use food_order_core::{AccountId, CategoryId, CustomizationId, Email, MenuItemId, Price, UserId};
use serde::{Deserialize, Serialize};

use crate::store::{CartCustomization, CartItem};

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: String,
    /// Base price, without customizations.
    pub price: Price,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub calories: u32,
    /// Grams of protein.
    #[serde(default)]
    pub protein: u32,
    pub category_id: Option<CategoryId>,
    /// Customizations offered for this item.
    #[serde(default)]
    pub customization_ids: Vec<CustomizationId>,
}

impl MenuItem {
    /// The fields copied into a cart line.
    #[must_use]
    pub fn to_cart_item(&self) -> CartItem {
        CartItem {
            id: self.id.clone(),
            image_url: self.image_url.clone(),
            name: self.name.clone(),
            price: self.price,
        }
    }
}

impl From<&MenuItem> for CartItem {
    fn from(item: &MenuItem) -> Self {
        item.to_cart_item()
    }
}

/// A menu category such as "Burgers".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// How a customization is grouped on the item screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomizationKind {
    Topping,
    Side,
    Other(String),
}

impl CustomizationKind {
    /// The name stored by the backend.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Topping => "topping",
            Self::Side => "side",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for CustomizationKind {
    fn from(kind: String) -> Self {
        match kind.trim().to_lowercase().as_str() {
            "topping" | "toppings" => Self::Topping,
            "side" | "sides" => Self::Side,
            _ => Self::Other(kind),
        }
    }
}

impl From<CustomizationKind> for String {
    fn from(kind: CustomizationKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for CustomizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An add-on that can be attached to a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    pub id: CustomizationId,
    pub name: String,
    pub price: Price,
    #[serde(rename = "type")]
    pub kind: CustomizationKind,
}

impl From<&Customization> for CartCustomization {
    fn from(customization: &Customization) -> Self {
        Self::new(
            customization.id.clone(),
            customization.name.clone(),
            customization.price,
        )
        .with_kind(customization.kind.as_str())
    }
}

/// A signed-in user's profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Profile document id.
    pub id: UserId,
    /// Account the profile belongs to.
    pub account_id: AccountId,
    pub name: String,
    pub email: Email,
    pub avatar_url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_backend_names() {
        assert_eq!(CustomizationKind::from("topping".to_string()), CustomizationKind::Topping);
        assert_eq!(CustomizationKind::from("Sides".to_string()), CustomizationKind::Side);
        assert_eq!(
            CustomizationKind::from("sauce".to_string()),
            CustomizationKind::Other("sauce".to_string())
        );
        assert_eq!(CustomizationKind::Other("sauce".to_string()).as_str(), "sauce");
    }

    #[test]
    fn test_customization_into_cart_customization() {
        let customization = Customization {
            id: CustomizationId::from("cheese"),
            name: "Extra Cheese".to_string(),
            price: Price::from_cents(150).unwrap(),
            kind: CustomizationKind::Topping,
        };
        let selected = CartCustomization::from(&customization);
        assert_eq!(selected.id, customization.id);
        assert_eq!(selected.price, customization.price);
        assert_eq!(selected.kind.as_deref(), Some("topping"));
    }

    #[test]
    fn test_menu_item_into_cart_item() {
        let item = MenuItem {
            id: MenuItemId::from("burger"),
            name: "Classic Burger".to_string(),
            description: String::new(),
            image_url: "https://img.example/burger.png".to_string(),
            price: Price::from_cents(599).unwrap(),
            rating: 4.5,
            calories: 550,
            protein: 25,
            category_id: None,
            customization_ids: vec![],
        };
        let cart_item = CartItem::from(&item);
        assert_eq!(cart_item.id, item.id);
        assert_eq!(cart_item.name, "Classic Burger");
        assert_eq!(cart_item.price, item.price);
    }
}
