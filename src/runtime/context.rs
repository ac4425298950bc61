use crate::util::uuid;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::StateMap;

/// A registered zero-argument callback.
pub(crate) type Listener = Arc<dyn Fn() + Send + Sync>;

struct Registration {
    id: String,
    callback: Listener,
}

/// Listeners grouped by event name, kept in registration order.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    by_event: HashMap<String, Vec<Registration>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener under `event` and return its registration id.
    pub fn register(&mut self, event: &str, callback: Listener) -> String {
        let id = uuid();
        self.by_event
            .entry(event.to_string())
            .or_default()
            .push(Registration {
                id: id.clone(),
                callback,
            });
        id
    }

    /// Remove a single registration and hand its callback back.
    ///
    /// The callback may own guards for this same registry, so callers must
    /// drop it only after releasing their lock.
    pub fn remove(&mut self, event: &str, id: &str) -> Option<Listener> {
        let registrations = self.by_event.get_mut(event)?;
        let position = registrations.iter().position(|r| r.id == id)?;
        let removed = registrations.remove(position);
        if registrations.is_empty() {
            self.by_event.remove(event);
        }
        Some(removed.callback)
    }

    /// Clone out the callbacks for `event` so they can run without the
    /// registry borrowed.
    pub fn snapshot(&self, event: &str) -> Vec<Listener> {
        self.by_event
            .get(event)
            .map(|registrations| {
                registrations
                    .iter()
                    .map(|r| Arc::clone(&r.callback))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, event: &str) -> usize {
        self.by_event.get(event).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.by_event.values().map(Vec::len).sum()
    }
}

/// Bookkeeping for the notification cycles currently running on a store.
#[derive(Default)]
pub(crate) struct DispatchContext {
    /// A queued cascade is being flushed.
    flushing: bool,
    /// Cycles scheduled by the current cascade, the running one included.
    scheduled: usize,
    /// Updates waiting for the running cycle to finish.
    pending: VecDeque<StateMap>,
}

/// Outcome of asking to start a queued update.
pub(crate) enum Admission {
    /// No cascade is running; the caller owns the flush loop and applies
    /// the returned update first.
    Lead(StateMap),
    /// Appended to the running cascade.
    Queued,
    /// The cascade is full.
    Refused,
}

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit `partial` into the queued cascade.
    pub fn admit(&mut self, partial: StateMap, max_cascade: usize) -> Admission {
        if !self.flushing {
            self.flushing = true;
            self.scheduled = 1;
            return Admission::Lead(partial);
        }
        if self.scheduled >= max_cascade {
            return Admission::Refused;
        }
        self.scheduled += 1;
        self.pending.push_back(partial);
        Admission::Queued
    }

    /// Take the next queued update, ending the cascade when none is left.
    pub fn next_pending(&mut self) -> Option<StateMap> {
        let next = self.pending.pop_front();
        if next.is_none() {
            self.end_cascade();
        }
        next
    }

    /// Abandon the running cascade, discarding anything still queued.
    pub fn end_cascade(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.flushing = false;
        self.scheduled = 0;
        dropped
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing
    }
}

// Nesting of recursive cycles, per thread and per store.
thread_local! {
    static NESTING: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());
}

/// Nested-cycle counter for one store on the current thread.
///
/// Updates issued on other threads never count toward this thread's depth.
pub(crate) struct Nesting {
    key: usize,
}

impl Nesting {
    pub fn new(key: usize) -> Self {
        Self { key }
    }

    /// Enter a nested cycle and return the new depth, or `None` when
    /// `max_depth` cycles are already open on this thread.
    pub fn enter(&self, max_depth: usize) -> Option<usize> {
        NESTING.with(|nesting| {
            let mut nesting = nesting.borrow_mut();
            let depth = nesting.entry(self.key).or_insert(0);
            if *depth >= max_depth {
                return None;
            }
            *depth += 1;
            Some(*depth)
        })
    }

    pub fn leave(&self) {
        NESTING.with(|nesting| {
            let mut nesting = nesting.borrow_mut();
            if let Some(depth) = nesting.get_mut(&self.key) {
                *depth = depth.saturating_sub(1);
                if *depth == 0 {
                    nesting.remove(&self.key);
                }
            }
        });
    }

    /// Cycles currently open on this thread.
    pub fn depth(&self) -> usize {
        NESTING.with(|nesting| nesting.borrow().get(&self.key).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> Listener {
        Arc::new(|| {})
    }

    #[test]
    fn registry_keeps_order_and_duplicates() {
        let mut registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener: Listener = {
            let hits = Arc::clone(&hits);
            Arc::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };

        registry.register("changed", Arc::clone(&listener));
        registry.register("changed", listener);
        assert_eq!(registry.count("changed"), 2);

        for callback in registry.snapshot("changed") {
            callback();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registry_removes_one_entry() {
        let mut registry = ListenerRegistry::new();
        let first = registry.register("changed", noop());
        let _second = registry.register("changed", noop());
        registry.register("other", noop());

        assert!(registry.remove("changed", &first).is_some());
        assert!(registry.remove("changed", &first).is_none());
        assert!(registry.remove("missing", &first).is_none());
        assert_eq!(registry.count("changed"), 1);
        assert_eq!(registry.total(), 2);
    }

    #[test]
    fn cascade_admission() {
        let mut ctx = DispatchContext::new();
        assert!(matches!(ctx.admit(StateMap::new(), 2), Admission::Lead(_)));
        assert!(ctx.is_flushing());
        assert!(matches!(ctx.admit(StateMap::new(), 2), Admission::Queued));
        assert!(matches!(ctx.admit(StateMap::new(), 2), Admission::Refused));

        assert!(ctx.next_pending().is_some());
        assert!(ctx.next_pending().is_none());
        assert!(!ctx.is_flushing());
    }

    #[test]
    fn removal_returns_the_callback() {
        let mut registry = ListenerRegistry::new();
        let listener = noop();
        let id = registry.register("changed", Arc::clone(&listener));

        let removed = registry.remove("changed", &id).unwrap();
        assert!(Arc::ptr_eq(&removed, &listener));
        assert_eq!(registry.total(), 0);
    }

    #[test]
    fn depth_is_capped() {
        let nesting = Nesting::new(1);
        assert_eq!(nesting.enter(2), Some(1));
        assert_eq!(nesting.enter(2), Some(2));
        assert_eq!(nesting.enter(2), None);
        nesting.leave();
        assert_eq!(nesting.depth(), 1);
        nesting.leave();
        assert_eq!(nesting.depth(), 0);
    }

    #[test]
    fn depth_is_per_store_and_per_thread() {
        let nesting = Nesting::new(2);
        assert_eq!(nesting.enter(1), Some(1));
        assert_eq!(Nesting::new(3).enter(1), Some(1));

        let other_thread = std::thread::spawn(|| Nesting::new(2).enter(1));
        assert_eq!(other_thread.join().unwrap(), Some(1));

        nesting.leave();
        Nesting::new(3).leave();
    }
}
