//! Single-threaded event emitter.
//!
//! Stands in for the host's event targets (socket `message`/`close`/`error`,
//! terminal `data`/`binary`). Everything runs on one thread inside event
//! callbacks, so the registry lives in an `Rc<RefCell<..>>` and no locking is
//! involved.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::disposable::Subscription;
use crate::error::Result;

/// Boxed event listener. An error stops dispatch and is returned to the
/// code that emitted the event.
pub type Listener<T> = Box<dyn FnMut(&T) -> Result<()>>;

type SharedListener<T> = Rc<RefCell<Listener<T>>>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, SharedListener<T>)>,
}

impl<T> Registry<T> {
    fn contains(&self, id: u64) -> bool {
        self.listeners.iter().any(|(i, _)| *i == id)
    }
}

/// Event source with disposable listener registrations.
pub struct Emitter<T> {
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener. Disposing the returned handle unregisters it.
    pub fn subscribe(&self, listener: Listener<T>) -> Subscription {
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .listeners
                .push((id, Rc::new(RefCell::new(listener))));
            id
        };

        let registry: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.borrow_mut().listeners.retain(|(i, _)| *i != id);
            }
        })
    }

    /// Dispatch `event` to every listener in registration order.
    ///
    /// Listeners unregistered by an earlier listener in the same dispatch are
    /// skipped.
    pub fn emit(&self, event: &T) -> Result<()> {
        let snapshot: Vec<(u64, SharedListener<T>)> = self.registry.borrow().listeners.clone();

        for (id, listener) in snapshot {
            if !self.registry.borrow().contains(id) {
                continue;
            }
            let Ok(mut listener) = listener.try_borrow_mut() else {
                warn!(listener_id = id, "Skipping re-entrant dispatch to running listener");
                continue;
            };
            (*listener)(event)?;
        }
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

impl<T: 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("listeners", &self.registry.borrow().listeners.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    #[test]
    fn emit_reaches_listeners_in_order() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s1 = Rc::clone(&seen);
        let _a = emitter.subscribe(Box::new(move |v: &u32| {
            s1.borrow_mut().push(("a", *v));
            Ok(())
        }));
        let s2 = Rc::clone(&seen);
        let _b = emitter.subscribe(Box::new(move |v: &u32| {
            s2.borrow_mut().push(("b", *v));
            Ok(())
        }));

        emitter.emit(&7).unwrap();
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn disposed_listener_is_not_called() {
        let emitter: Emitter<()> = Emitter::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let mut sub = emitter.subscribe(Box::new(move |_: &()| {
            h.set(h.get() + 1);
            Ok(())
        }));

        emitter.emit(&()).unwrap();
        sub.dispose();
        emitter.emit(&()).unwrap();

        assert_eq!(hits.get(), 1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let emitter: Emitter<()> = Emitter::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let victim_hits = Rc::new(Cell::new(0));

        let v = Rc::clone(&victim);
        let _first = emitter.subscribe(Box::new(move |_: &()| {
            if let Some(mut sub) = v.borrow_mut().take() {
                sub.dispose();
            }
            Ok(())
        }));
        let h = Rc::clone(&victim_hits);
        *victim.borrow_mut() = Some(emitter.subscribe(Box::new(move |_: &()| {
            h.set(h.get() + 1);
            Ok(())
        })));

        emitter.emit(&()).unwrap();
        assert_eq!(victim_hits.get(), 0);
        assert_eq!(emitter.listener_count(), 1);
    }

    #[test]
    fn reentrant_emit_skips_running_listener() {
        let emitter: Rc<Emitter<u32>> = Rc::new(Emitter::new());
        let outer_hits = Rc::new(Cell::new(0));
        let inner_result = Rc::new(Cell::new(None));
        let other_seen = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&emitter);
        let hits = Rc::clone(&outer_hits);
        let result = Rc::clone(&inner_result);
        let _reentrant = emitter.subscribe(Box::new(move |v: &u32| {
            hits.set(hits.get() + 1);
            if let Some(emitter) = weak.upgrade() {
                result.set(Some(emitter.emit(&(v + 1)).is_ok()));
            }
            Ok(())
        }));
        let seen = Rc::clone(&other_seen);
        let _other = emitter.subscribe(Box::new(move |v: &u32| {
            seen.borrow_mut().push(*v);
            Ok(())
        }));

        emitter.emit(&0).unwrap();

        assert_eq!(outer_hits.get(), 1);
        assert_eq!(inner_result.get(), Some(true));
        assert_eq!(*other_seen.borrow(), vec![1, 0]);
    }

    #[test]
    fn listener_error_stops_dispatch() {
        let emitter: Emitter<()> = Emitter::new();
        let later = Rc::new(Cell::new(false));
        let _a = emitter.subscribe(Box::new(|_: &()| Err(Error::SocketClosed)));
        let l = Rc::clone(&later);
        let _b = emitter.subscribe(Box::new(move |_: &()| {
            l.set(true);
            Ok(())
        }));

        let err = emitter.emit(&()).unwrap_err();
        assert!(matches!(err, Error::SocketClosed));
        assert!(!later.get());
    }

    #[test]
    fn dispose_after_emitter_dropped_is_noop() {
        let emitter: Emitter<()> = Emitter::new();
        let mut sub = emitter.subscribe(Box::new(|_: &()| Ok(())));
        drop(emitter);
        sub.dispose();
        assert!(sub.is_disposed());
    }
}
