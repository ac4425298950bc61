use crate::store::{DataStore, WatchGuard};
use crate::StateMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Binds a render function to a [`DataStore`].
///
/// On construction the adapter takes the store's current snapshot as its
/// local state and watches the store's change event. Every change marks the
/// adapter dirty; the owner decides when to call [`render`](Self::render),
/// which refreshes the local snapshot and produces new output.
///
/// The adapter only reads from the store. Dropping it removes its listener.
///
/// # Examples
///
/// ```
/// use datastore::{Connected, DataStore};
/// use serde_json::json;
///
/// let store = DataStore::new(json!({ "count": 0 }));
/// let mut view = Connected::new(&store, |state| format!("count = {}", state["count"]));
///
/// assert_eq!(view.render(), "count = 0");
/// store.set_state(json!({ "count": 5 }));
/// assert!(view.needs_render());
/// assert_eq!(view.render(), "count = 5");
/// ```
pub struct Connected<R> {
    store: DataStore,
    snapshot: Arc<StateMap>,
    dirty: Arc<AtomicBool>,
    render: R,
    _watch: WatchGuard,
}

impl<R> Connected<R> {
    /// Connect `render` to `store`, seeding the snapshot from its current state.
    pub fn new<T>(store: &DataStore, render: R) -> Self
    where
        R: Fn(&StateMap) -> T,
    {
        let dirty = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&dirty);
        let watch = store.watch_scoped(store.change_event(), move || {
            flag.store(true, Ordering::Release);
        });
        tracing::debug!(id = %watch.handle().id(), "component connected");

        Self {
            store: store.clone(),
            snapshot: store.get_state(),
            dirty,
            render,
            _watch: watch,
        }
    }

    /// Local snapshot as of the last render (or construction).
    pub fn snapshot(&self) -> &StateMap {
        &self.snapshot
    }

    /// Whether the store changed since the last render.
    pub fn needs_render(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// The store this view reads from.
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Pick up the latest snapshot and run the render function on it.
    pub fn render<T>(&mut self) -> T
    where
        R: Fn(&StateMap) -> T,
    {
        self.dirty.store(false, Ordering::Release);
        self.snapshot = self.store.get_state();
        (self.render)(&*self.snapshot)
    }

    /// Render only if the store changed since the last render.
    pub fn render_if_needed<T>(&mut self) -> Option<T>
    where
        R: Fn(&StateMap) -> T,
    {
        if self.needs_render() {
            Some(self.render())
        } else {
            None
        }
    }
}
