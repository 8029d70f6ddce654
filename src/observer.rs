//! Observer registry with wire-on-first / teardown-on-last semantics
//!
//! The first `add` to an empty registry runs a wiring hook that attaches
//! whatever upstream source feeds the registry, and returns the teardown to
//! run when the registry empties again. Between those two points exactly one
//! upstream attachment exists, however many observers come and go.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Callback registered with an [`ObserverRegistry`]
pub(crate) type Observer<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Detaches the upstream source once no observer is left
pub(crate) type Teardown = Box<dyn FnOnce() + Send + 'static>;

/// Handle identifying one registered observer
pub(crate) type ObserverId = u64;

struct RegistryState<T> {
    next_id: ObserverId,
    observers: BTreeMap<ObserverId, Observer<T>>,
    teardown: Option<Teardown>,
}

pub(crate) struct ObserverRegistry<T> {
    state: Mutex<RegistryState<T>>,
}

impl<T> ObserverRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_id: 0,
                observers: BTreeMap::new(),
                teardown: None,
            }),
        }
    }

    /// Register `observer`; `wire` runs only when the registry was empty
    pub(crate) fn add<W>(&self, observer: Observer<T>, wire: W) -> ObserverId
    where
        W: FnOnce() -> Teardown,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.observers.is_empty() && state.teardown.is_none() {
            state.teardown = Some(wire());
        }
        let id = state.next_id;
        state.next_id += 1;
        state.observers.insert(id, observer);
        id
    }

    /// Unregister one observer; returns whether it was registered
    pub(crate) fn remove(&self, id: ObserverId) -> bool {
        let teardown = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.observers.remove(&id).is_none() {
                return false;
            }
            if state.observers.is_empty() {
                state.teardown.take()
            } else {
                None
            }
        };
        if let Some(teardown) = teardown {
            teardown();
        }
        true
    }

    /// Invoke every observer with `value`
    ///
    /// Callbacks run outside the lock, so they may add or remove observers.
    pub(crate) fn notify(&self, value: &T) {
        let observers: Vec<Observer<T>> = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers
            .values()
            .cloned()
            .collect();
        for observer in observers {
            observer(value);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).observers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> Observer<u32> {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_wire_runs_once_and_teardown_on_last_remove() {
        let registry = ObserverRegistry::<u32>::new();
        let wired = Arc::new(AtomicUsize::new(0));
        let torn_down = Arc::new(AtomicUsize::new(0));
        let noop: Observer<u32> = Arc::new(|_: &u32| {});

        let wire = || {
            wired.fetch_add(1, Ordering::SeqCst);
            let torn_down = Arc::clone(&torn_down);
            Box::new(move || {
                torn_down.fetch_add(1, Ordering::SeqCst);
            }) as Teardown
        };

        let a = registry.add(Arc::clone(&noop), wire);
        let b = registry.add(Arc::clone(&noop), || panic!("already wired"));
        assert_eq!(wired.load(Ordering::SeqCst), 1);

        assert!(registry.remove(a));
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);
        assert!(registry.remove(b));
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);
        assert!(!registry.remove(b));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_notify_reaches_remaining_observers_only() {
        let registry = ObserverRegistry::<u32>::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let a = registry.add(counting(&first), || Box::new(|| {}) as Teardown);
        registry.add(counting(&second), || Box::new(|| {}) as Teardown);

        registry.notify(&1);
        registry.remove(a);
        registry.notify(&2);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_rewires_after_becoming_empty() {
        let registry = ObserverRegistry::<u32>::new();
        let wired = Arc::new(AtomicUsize::new(0));
        let noop: Observer<u32> = Arc::new(|_: &u32| {});
        let wire = |wired: &Arc<AtomicUsize>| {
            wired.fetch_add(1, Ordering::SeqCst);
            Box::new(|| {}) as Teardown
        };

        let id = registry.add(Arc::clone(&noop), || wire(&wired));
        registry.remove(id);
        registry.add(noop, || wire(&wired));

        assert_eq!(wired.load(Ordering::SeqCst), 2);
    }
}
