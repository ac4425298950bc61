//! Dispatch support for stores.
//!
//! This module keeps the listener registry and tracks the notification
//! cycles a store is running, so re-entrant updates can be queued or capped.

mod context;

pub(crate) use context::{Admission, DispatchContext, Listener, ListenerRegistry, Nesting};
