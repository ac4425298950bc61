//! The observable data store.
//!
//! A store holds a JSON object, merges partial updates into it and notifies
//! listeners keyed by event name.

mod store;

pub use store::{DataStore, WatchGuard, WatchHandle};
