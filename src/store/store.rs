use crate::config::{Reentrancy, StoreConfig};
use crate::error::{Result, StoreError};
use crate::runtime::{Admission, DispatchContext, Listener, ListenerRegistry, Nesting};
use crate::util::{empty_object, json_kind, merge};
use crate::StateMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

/// Shared internals behind every clone of a [`DataStore`].
pub(crate) struct StoreInner {
    state: RwLock<Arc<StateMap>>,
    listeners: RwLock<ListenerRegistry>,
    dispatch: Mutex<DispatchContext>,
    config: StoreConfig,
}

impl StoreInner {
    fn unwatch(&self, handle: &WatchHandle) -> bool {
        // The write guard is released at the end of this statement, before the
        // removed callback (and any guards it owns) is dropped.
        let removed = self.listeners.write().remove(&handle.event, &handle.id);
        let Some(callback) = removed else {
            return false;
        };
        tracing::debug!(event = %handle.event, id = %handle.id, "listener removed");
        drop(callback);
        true
    }
}

/// An observable key/value state container.
///
/// The state is a JSON object. [`set_state`](Self::set_state) shallow-merges a
/// partial object into it and then notifies every listener registered under
/// the change event (`"stateChanged"` by default), in registration order, on
/// the calling thread.
///
/// Each successful update installs a brand-new snapshot. Snapshots handed out
/// by [`get_state`](Self::get_state) are immutable and keep showing the state
/// as it was when they were taken.
///
/// Cloning a store yields another handle to the same state and listeners.
///
/// # Examples
///
/// ```
/// use datastore::DataStore;
/// use serde_json::json;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let store = DataStore::new(json!({ "count": 0 }));
/// let calls = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&calls);
/// store.watch("stateChanged", move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert!(store.set_state(json!({ "count": 1 })));
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// assert_eq!(store.get("count"), Some(json!(1)));
/// ```
///
/// Listeners that capture a clone of their own store keep it alive for as
/// long as they stay registered.
#[derive(Clone)]
pub struct DataStore {
    inner: Arc<StoreInner>,
}

impl DataStore {
    /// Create a store with default configuration.
    ///
    /// `initial` becomes the state when it is an object; anything else
    /// (including `Value::Null` for "no initial state") yields an empty state.
    pub fn new(initial: impl Into<Value>) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    /// Create a store, refusing an `initial` value that is not an object.
    pub fn try_new(initial: impl Into<Value>) -> Result<Self> {
        match initial.into() {
            Value::Object(map) => Ok(Self::from_parts(map, StoreConfig::default())),
            other => Err(StoreError::NotAnObject {
                kind: json_kind(&other),
            }),
        }
    }

    /// Create a store with explicit configuration.
    pub fn with_config(initial: impl Into<Value>, config: StoreConfig) -> Self {
        let state = match initial.into() {
            Value::Object(map) => map,
            other => {
                if !other.is_null() {
                    tracing::debug!(
                        kind = json_kind(&other),
                        "initial state is not an object, starting empty"
                    );
                }
                empty_object()
            }
        };
        Self::from_parts(state, config)
    }

    fn from_parts(state: StateMap, config: StoreConfig) -> Self {
        tracing::debug!(
            keys = state.len(),
            change_event = %config.change_event,
            reentrancy = ?config.reentrancy,
            "store created"
        );
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Arc::new(state)),
                listeners: RwLock::new(ListenerRegistry::new()),
                dispatch: Mutex::new(DispatchContext::new()),
                config,
            }),
        }
    }

    /// The current snapshot.
    ///
    /// The returned map is shared, not copied. It never changes; after a
    /// successful update, call this again to see the new state.
    pub fn get_state(&self) -> Arc<StateMap> {
        self.inner.state.read().clone()
    }

    /// Clone of a single top-level value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.state.read().get(key).cloned()
    }

    /// Configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Event name notified after each update.
    pub fn change_event(&self) -> &str {
        &self.inner.config.change_event
    }

    /// Merge `partial` into the state and notify change listeners.
    ///
    /// Returns `false`, leaving the state untouched and notifying no one,
    /// when `partial` is not an object or the update was refused by the
    /// re-entrancy limits. Never panics on bad input.
    pub fn set_state(&self, partial: impl Into<Value>) -> bool {
        self.try_set_state(partial).is_ok()
    }

    /// Like [`set_state`](Self::set_state), but reports why an update was
    /// refused.
    ///
    /// Under [`Reentrancy::Queue`], an update issued from inside a listener
    /// returns `Ok(())` once queued; it is applied after the running
    /// notification cycle completes.
    pub fn try_set_state(&self, partial: impl Into<Value>) -> Result<()> {
        let partial = match partial.into() {
            Value::Object(map) => map,
            other => {
                let kind = json_kind(&other);
                tracing::debug!(kind, "ignoring update that is not an object");
                return Err(StoreError::NotAnObject { kind });
            }
        };

        match self.inner.config.reentrancy {
            Reentrancy::Queue => self.apply_queued(partial),
            Reentrancy::Recurse => self.apply_nested(partial),
        }
    }

    fn apply_queued(&self, partial: StateMap) -> Result<()> {
        let limit = self.inner.config.max_cascade.max(1);
        let first = match self.inner.dispatch.lock().admit(partial, limit) {
            Admission::Lead(partial) => partial,
            Admission::Queued => {
                tracing::trace!("update queued behind running notification cycle");
                return Ok(());
            }
            Admission::Refused => {
                tracing::warn!(limit, "update cascade limit reached, dropping update");
                return Err(StoreError::CascadeLimit { limit });
            }
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut next = Some(first);
            let mut cycles = 0usize;
            while let Some(partial) = next {
                self.commit(&partial);
                self.notify(&self.inner.config.change_event);
                cycles += 1;
                next = self.inner.dispatch.lock().next_pending();
            }
            if cycles > 1 {
                tracing::debug!(cycles, "flushed queued updates");
            }
        }));

        if let Err(payload) = result {
            let dropped = self.inner.dispatch.lock().end_cascade();
            tracing::warn!(dropped, "listener panicked, queued updates discarded");
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    fn nesting(&self) -> Nesting {
        Nesting::new(Arc::as_ptr(&self.inner) as usize)
    }

    fn apply_nested(&self, partial: StateMap) -> Result<()> {
        let limit = self.inner.config.max_depth.max(1);
        let nesting = self.nesting();
        let Some(depth) = nesting.enter(limit) else {
            tracing::warn!(limit, "dispatch depth limit reached, rejecting update");
            return Err(StoreError::DepthLimit { limit });
        };
        tracing::trace!(depth, "nested update");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.commit(&partial);
            self.notify(&self.inner.config.change_event);
        }));

        nesting.leave();
        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
        Ok(())
    }

    /// Install `merge(current, partial)` as the new snapshot.
    fn commit(&self, partial: &StateMap) {
        let mut state = self.inner.state.write();
        let next = merge(&state, partial);
        tracing::trace!(changed = partial.len(), keys = next.len(), "state replaced");
        *state = Arc::new(next);
    }

    /// Register `callback` under `event`.
    ///
    /// Listeners accumulate: registering the same event twice keeps both.
    /// The returned handle removes this one registration via
    /// [`unwatch`](Self::unwatch).
    pub fn watch<F>(&self, event: &str, callback: F) -> WatchHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let callback: Listener = Arc::new(callback);
        let id = self.inner.listeners.write().register(event, callback);
        tracing::debug!(event, id = %id, "listener registered");
        WatchHandle {
            id,
            event: event.to_string(),
        }
    }

    /// Register `callback` under `event` for as long as the returned guard
    /// lives.
    pub fn watch_scoped<F>(&self, event: &str, callback: F) -> WatchGuard
    where
        F: Fn() + Send + Sync + 'static,
    {
        WatchGuard {
            handle: self.watch(event, callback),
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Remove the registration behind `handle`.
    ///
    /// Returns whether it was still registered.
    pub fn unwatch(&self, handle: &WatchHandle) -> bool {
        self.inner.unwatch(handle)
    }

    /// Invoke every listener registered under `event`, in registration order.
    ///
    /// Listeners registered or removed while this runs take effect from the
    /// next notification. Returns how many listeners were invoked.
    pub fn notify(&self, event: &str) -> usize {
        let listeners = self.inner.listeners.read().snapshot(event);
        tracing::trace!(event, listeners = listeners.len(), "notifying");
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }

    /// Number of listeners registered under `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.listeners.read().count(event)
    }

    /// Whether a notification cycle started by an update is running.
    ///
    /// Queued cascades are visible from every thread; nested cycles under
    /// [`Reentrancy::Recurse`] only from the thread running them.
    pub fn is_dispatching(&self) -> bool {
        self.inner.dispatch.lock().is_flushing() || self.nesting().depth() > 0
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("state", &*self.get_state())
            .field("listeners", &self.inner.listeners.read().total())
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Identifies one listener registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchHandle {
    id: String,
    event: String,
}

impl WatchHandle {
    /// Unique id (a v4 UUID) of this registration.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Event name the listener was registered under.
    pub fn event(&self) -> &str {
        &self.event
    }
}

/// RAII guard for store listeners.
///
/// Dropping the guard unregisters the listener. The guard does not keep the
/// store alive.
pub struct WatchGuard {
    handle: WatchHandle,
    store: Weak<StoreInner>,
}

impl WatchGuard {
    /// Handle of the guarded registration.
    pub fn handle(&self) -> &WatchHandle {
        &self.handle
    }

    /// Keep the listener registered and hand back a plain handle.
    pub fn detach(mut self) -> WatchHandle {
        self.store = Weak::new();
        self.handle.clone()
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.unwatch(&self.handle);
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard")
            .field("handle", &self.handle)
            .finish()
    }
}
