//! Balanced use counter with boundary notifications.
//!
//! [`UserCount`] is the building block a [`LoadingStrategy`] composes per
//! resource to learn when the resource's last dependent disappears. It fires
//! [`UsageObserver::became_used`](crate::traits::UsageObserver::became_used)
//! on the 0→1 transition and
//! [`UsageObserver::became_unused`](crate::traits::UsageObserver::became_unused)
//! on 1→0; every other step is silent.
//!
//! ```text
//!   count:   0 ──inc──► 1 ──inc──► 2 ──dec──► 1 ──dec──► 0
//!                  │                                  │
//!             became_used                       became_unused
//! ```
//!
//! Misuse (decrement at zero, overflow, adding an observer twice, removing one
//! that is not attached) is a programming error and panics.
//!
//! [`LoadingStrategy`]: crate::traits::LoadingStrategy

use std::fmt;
use std::sync::Arc;

use crate::traits::ObserverHandle;

/// Counter of live users that notifies observers at the zero boundary.
#[derive(Default)]
pub struct UserCount {
    count: usize,
    observers: Vec<ObserverHandle>,
}

impl UserCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of users.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` while at least one user is registered.
    pub fn is_used(&self) -> bool {
        self.count > 0
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Adds a user.
    ///
    /// # Panics
    ///
    /// Panics if the counter would overflow.
    pub fn increment(&mut self) {
        self.count = self
            .count
            .checked_add(1)
            .expect("UserCount::increment overflowed");
        if self.count == 1 {
            for observer in &self.observers {
                observer.became_used();
            }
        }
    }

    /// Removes a user.
    ///
    /// # Panics
    ///
    /// Panics if the counter is already zero.
    pub fn decrement(&mut self) {
        assert!(self.count > 0, "UserCount::decrement called at zero");
        self.count -= 1;
        if self.count == 0 {
            for observer in &self.observers {
                observer.became_unused();
            }
        }
    }

    /// Attaches `observer`.
    ///
    /// # Panics
    ///
    /// Panics if the same observer (by `Arc` identity) is already attached.
    pub fn add_observer(&mut self, observer: ObserverHandle) {
        assert!(
            self.position(&observer).is_none(),
            "observer attached twice to the same UserCount"
        );
        self.observers.push(observer);
    }

    /// Detaches `observer`.
    ///
    /// # Panics
    ///
    /// Panics if `observer` is not attached.
    pub fn remove_observer(&mut self, observer: &ObserverHandle) {
        let index = self
            .position(observer)
            .expect("removing an observer that is not attached");
        self.observers.swap_remove(index);
    }

    fn position(&self, observer: &ObserverHandle) -> Option<usize> {
        self.observers
            .iter()
            .position(|attached| Arc::ptr_eq(attached, observer))
    }
}

impl fmt::Debug for UserCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCount")
            .field("count", &self.count)
            .field("observers", &self.observers.len())
            .finish()
    }
}
