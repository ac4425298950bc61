//! Adapter for driving a render function from a store.

mod connected;

pub use connected::Connected;
