//! Per-resource bookkeeping and the pin event queue.
//!
//! The strategy notifies usage transitions while the manager is in the middle
//! of calling it (`load` pins dependencies, `unload` unpins them). Observers
//! therefore never touch the manager directly: each [`NodeObserver`] posts a
//! [`PinEvent`] tagged with its node handle to a shared [`PinQueue`], and the
//! manager applies the queued events after every strategy call.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ds::SlotId;
use crate::traits::{ObserverHandle, UsageObserver};

/// Bookkeeping record for one loaded resource.
pub(crate) struct Node<R> {
    pub(crate) resource: R,
    /// Fixed at load time, credited back verbatim on unload.
    pub(crate) occupied_space: u64,
    /// Set right after the node is allocated (the observer needs the handle).
    pub(crate) observer: Option<ObserverHandle>,
}

impl<R> Node<R> {
    pub(crate) fn new(resource: R, occupied_space: u64) -> Self {
        Self {
            resource,
            occupied_space,
            observer: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PinEvent {
    Used(SlotId),
    Unused(SlotId),
}

/// FIFO of pin events shared between the manager and its node observers.
#[derive(Debug, Clone, Default)]
pub(crate) struct PinQueue {
    events: Arc<Mutex<VecDeque<PinEvent>>>,
}

impl PinQueue {
    pub(crate) fn push(&self, event: PinEvent) {
        self.events.lock().push_back(event);
    }

    /// Removes and returns every queued event, oldest first.
    pub(crate) fn take(&self) -> VecDeque<PinEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.events.lock().len()
    }
}

/// Observer registered with the strategy for one node.
#[derive(Debug)]
pub(crate) struct NodeObserver {
    node: SlotId,
    queue: PinQueue,
}

impl NodeObserver {
    pub(crate) fn handle(node: SlotId, queue: PinQueue) -> ObserverHandle {
        Arc::new(Self { node, queue })
    }
}

impl UsageObserver for NodeObserver {
    fn became_used(&self) {
        self.queue.push(PinEvent::Used(self.node));
    }

    fn became_unused(&self) {
        self.queue.push(PinEvent::Unused(self.node));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ds::SlotArena;

    #[test]
    fn observer_posts_tagged_events_in_order() {
        let mut arena = SlotArena::new();
        let a = arena.insert(());
        let b = arena.insert(());
        let queue = PinQueue::default();
        let first = NodeObserver::handle(a, queue.clone());
        let second = NodeObserver::handle(b, queue.clone());

        first.became_used();
        second.became_used();
        first.became_unused();
        assert_eq!(queue.len(), 3);

        let events: Vec<_> = queue.take().into_iter().collect();
        assert_eq!(
            events,
            vec![PinEvent::Used(a), PinEvent::Used(b), PinEvent::Unused(a)]
        );
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn node_starts_without_observer() {
        let node = Node::new("mesh", 12);
        assert_eq!(node.occupied_space, 12);
        assert!(node.observer.is_none());
    }
}
