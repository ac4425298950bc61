//! Helpers shared by the store and its adapters.
//!
//! - `merge` / `is_object`: shallow object handling used by `set_state`
//! - `uuid`: random identifiers for tagging listener registrations

mod id;
mod object;

pub use id::uuid;
pub use object::{empty_object, is_object, json_kind, merge};
