//! Observable client-side state: the cart and the session.

pub mod auth;
pub mod cart;

pub use auth::{AuthError, AuthState, AuthStatus, AuthStore, AuthSubscription};
pub use cart::{
    Cart, CartChange, CartCustomization, CartItem, CartLine, CartStore, CartSubscription,
    CustomizationSet,
};
