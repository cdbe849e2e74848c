//! Cache types for catalog responses.

use food_order_core::{CategoryId, MenuItemId};

use super::MenuFilter;
use super::types::{Category, Customization, MenuItem};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Menu(MenuFilter),
    MenuItem(MenuItemId),
    Categories,
    Category(CategoryId),
    Customizations(MenuItemId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Menu(Vec<MenuItem>),
    MenuItem(Box<MenuItem>),
    Categories(Vec<Category>),
    Category(Category),
    Customizations(Vec<Customization>),
}
