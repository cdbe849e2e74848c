//! Food Order Core - Shared types library.
//!
//! This crate provides common types used across all Food Order components:
//! - `client` - Cart store, auth store and the backend service clients
//! - `cli` - Command-line presentation layer
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! Everything here is validated on construction so the rest of the workspace
//! can rely on well-formed values.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and passwords

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
