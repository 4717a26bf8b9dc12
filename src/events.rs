//! Typed observer bus
//!
//! Listeners are registered with [`EventBus::subscribe`] and stay attached
//! for as long as the returned [`Subscription`] lives. A listener that returns
//! an error or panics is logged and skipped; the remaining listeners still run.

use std::cell::RefCell;
use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

/// Error type listeners may return
pub type ListenerError = Box<dyn std::error::Error>;

type Listener<E> = Rc<RefCell<dyn FnMut(&E) -> Result<(), ListenerError>>>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
}

/// Single-threaded broadcast channel for events of type `E`
pub struct EventBus<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 1,
                listeners: Vec::new(),
            })),
        }
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl<E: Debug + 'static> EventBus<E> {
    /// Attach a listener; it is detached when the returned handle is dropped
    #[must_use = "dropping the subscription detaches the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&E) -> Result<(), ListenerError> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        let listener: Listener<E> = Rc::new(RefCell::new(listener));
        registry.listeners.push((id, listener));

        let weak: Weak<RefCell<Registry<E>>> = Rc::downgrade(&self.registry);
        Subscription {
            id,
            detach: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    registry.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Deliver `event` to every listener, isolating failures.
    ///
    /// Returns the number of listeners that failed.
    pub fn emit(&self, event: &E) -> usize {
        // Snapshot so listeners may subscribe/unsubscribe while being notified
        let listeners: Vec<(u64, Listener<E>)> = self.registry.borrow().listeners.clone();
        let mut failures = 0;

        for (id, listener) in listeners {
            let Ok(mut callback) = listener.try_borrow_mut() else {
                log::warn!("Listener {} re-entered while handling {:?}; skipped", id, event);
                continue;
            };
            match panic::catch_unwind(AssertUnwindSafe(|| (*callback)(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    log::error!("Listener {} failed on {:?}: {}", id, event, e);
                }
                Err(_) => {
                    failures += 1;
                    log::error!("Listener {} panicked on {:?}", id, event);
                }
            }
        }

        failures
    }
}

/// Disposable listener handle
pub struct Subscription {
    id: u64,
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Detach now (same as dropping)
    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    /// Keep the listener attached for the lifetime of the bus
    pub fn forget(mut self) {
        self.detach = None;
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
