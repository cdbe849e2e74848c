//! Food Order client library.
//!
//! Session state and backend access for the Food Order app:
//!
//! - [`store::CartStore`]: the cart, with merge-on-identity semantics
//! - [`store::AuthStore`]: who is signed in
//! - [`backend::BackendService`]: accounts, catalog and storage, implemented
//!   for Appwrite and for in-memory fixtures
//! - [`services`]: item customization, menu browsing and profile edits
//! - [`state::AppState`]: one session's worth of the above
//!
//! # Example
//!
//! ```rust,ignore
//! use food_order_client::backend::{BackendService, InMemoryBackend};
//! use food_order_client::services::ItemSelection;
//! use food_order_client::state::AppState;
//!
//! let state = AppState::with_backend(InMemoryBackend::from_fixture_file(path).await?);
//! let mut selection = ItemSelection::load(state.backend(), &item_id).await?;
//! selection.toggle(&cheese_id);
//! selection.add_to_cart(state.cart());
//! println!("{}", state.cart().total_price());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod store;

pub use error::{AppError, Result};
