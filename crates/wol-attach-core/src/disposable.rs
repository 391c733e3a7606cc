//! Disposable handles for listener registrations.
//!
//! Every event registration made by the bridge yields a [`Subscription`]. The
//! bridge keeps them in a [`SubscriptionSet`] and releases them all at once on
//! teardown.

use std::fmt;

/// A release capability for exactly one listener registration.
///
/// The release closure runs at most once, either through [`Subscription::dispose`]
/// or when the handle is dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a release closure.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Release the registration. Later calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub const fn is_disposed(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Ordered collection of subscriptions owned by one bridge.
///
/// Once disposed the set stays empty: handles pushed afterwards are released
/// on the spot.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    handles: Vec<Subscription>,
    disposed: bool,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handle in registration order.
    pub fn push(&mut self, mut handle: Subscription) {
        if self.disposed {
            handle.dispose();
            return;
        }
        self.handles.push(handle);
    }

    /// Take every handle out of the set without releasing them.
    ///
    /// Marks the set disposed. Callers that hold the set behind a `RefCell`
    /// use this to release handles outside the borrow.
    pub fn drain(&mut self) -> Vec<Subscription> {
        self.disposed = true;
        std::mem::take(&mut self.handles)
    }

    /// Release every handle in registration order and clear the set.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for mut handle in self.drain() {
            handle.dispose();
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub const fn is_disposed(&self) -> bool {
        self.disposed
    }
}
