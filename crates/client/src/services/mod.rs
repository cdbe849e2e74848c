//! Screen-level workflows built on the stores and the backend.

pub mod catalog;
pub mod profile;
pub mod selection;

pub use catalog::{ALL_CATEGORIES, CategoryOption, MenuQuery, category_options, load_category_options};
pub use profile::{ProfileError, save_name, upload_avatar};
pub use selection::ItemSelection;
