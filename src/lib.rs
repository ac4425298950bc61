//! # datastore
//!
//! A minimal observable state container for Rust.
//!
//! A [`DataStore`] holds a JSON object as its state. Partial updates are
//! shallow-merged into it, and every successful update notifies the
//! listeners registered under the store's change event, synchronously and
//! in registration order.
//!
//! ## Store
//!
//! - `DataStore::set_state` - merge a partial object and notify listeners
//! - `DataStore::watch` / `unwatch` - register and remove listeners by event name
//! - `DataStore::get_state` - immutable snapshot of the current state
//!
//! ## Component adapter
//!
//! - `Connected` - re-renders a view from the store when it changes
//!
//! ## Utilities
//!
//! - `util::merge`, `util::is_object`, `util::uuid`

pub mod component;
pub mod config;
pub mod error;
pub(crate) mod runtime;
pub mod store;
pub mod util;

/// The state held by a store: a JSON object.
pub type StateMap = serde_json::Map<String, serde_json::Value>;

// Re-export main types for convenience
pub use component::Connected;
pub use config::{Reentrancy, StoreConfig, STATE_CHANGED};
pub use error::{Result, StoreError};
pub use store::{DataStore, WatchGuard, WatchHandle};
