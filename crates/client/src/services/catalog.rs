//! Menu browsing: category filter and search text.

use food_order_core::CategoryId;
use tracing::instrument;

use crate::backend::{
    BackendError, BackendService, Category, DEFAULT_MENU_LIMIT, MenuFilter, MenuItem,
};

/// Pseudo-category that shows every item.
pub const ALL_CATEGORIES: &str = "all";

/// The user's current menu filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuQuery {
    category: Option<CategoryId>,
    text: Option<String>,
    limit: u32,
}

impl Default for MenuQuery {
    fn default() -> Self {
        Self {
            category: None,
            text: None,
            limit: DEFAULT_MENU_LIMIT,
        }
    }
}

impl MenuQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a category. `"all"` or an empty value clears the filter.
    pub fn set_category(&mut self, category: &str) {
        let category = category.trim();
        self.category = if category.is_empty() || category.eq_ignore_ascii_case(ALL_CATEGORIES) {
            None
        } else {
            Some(CategoryId::from(category))
        };
    }

    /// Set the search text. Surrounding whitespace is ignored; empty clears it.
    pub fn set_text(&mut self, text: &str) {
        let text = text.trim();
        self.text = (!text.is_empty()).then(|| text.to_owned());
    }

    /// Set the maximum number of results. Zero restores the default.
    pub fn set_limit(&mut self, limit: u32) {
        self.limit = if limit == 0 { DEFAULT_MENU_LIMIT } else { limit };
    }

    #[must_use]
    pub fn with_category(mut self, category: &str) -> Self {
        self.set_category(category);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    #[must_use]
    pub const fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// The backend filter for this query.
    #[must_use]
    pub fn to_filter(&self) -> MenuFilter {
        MenuFilter {
            category: self.category.clone(),
            query: self.text.clone(),
            limit: Some(self.limit),
        }
    }

    /// Run the query.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(backend))]
    pub async fn run<B: BackendService>(&self, backend: &B) -> Result<Vec<MenuItem>, BackendError> {
        backend.list_menu(&self.to_filter()).await
    }
}

/// An entry in the category filter bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOption {
    /// Value passed to [`MenuQuery::set_category`].
    pub value: String,
    pub name: String,
}

impl From<&Category> for CategoryOption {
    fn from(category: &Category) -> Self {
        Self {
            value: category.id.to_string(),
            name: category.name.clone(),
        }
    }
}

/// Backend categories with an "All" entry first.
#[must_use]
pub fn category_options(categories: &[Category]) -> Vec<CategoryOption> {
    std::iter::once(CategoryOption {
        value: ALL_CATEGORIES.to_string(),
        name: "All".to_string(),
    })
    .chain(categories.iter().map(CategoryOption::from))
    .collect()
}

/// Fetch the categories and build the filter bar entries.
///
/// # Errors
///
/// Returns an error if the backend call fails.
pub async fn load_category_options<B: BackendService>(
    backend: &B,
) -> Result<Vec<CategoryOption>, BackendError> {
    let categories = backend.list_categories().await?;
    Ok(category_options(&categories))
}
