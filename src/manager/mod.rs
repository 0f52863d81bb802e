//! # Resource Cache Manager
//!
//! Keeps a dependency-closed working set of resources loaded under a budget
//! on both resource count (`max_elements`) and aggregate occupied space
//! (`capacity`), evicting the least recently used *unpinned* resources to make
//! room and undoing a request that cannot fit.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                   ResourceCacheManager<S: LoadingStrategy>               │
//!   │                                                                          │
//!   │   ┌─────────────────────────────┐      ┌──────────────────────────────┐  │
//!   │   │ FxHashMap<Resource, SlotId> │      │ IntrusiveList<Node>          │  │
//!   │   │  every loaded resource      │─────►│                              │  │
//!   │   └─────────────────────────────┘      │ head ► [n1] ◄► [n4] ◄ tail   │  │
//!   │                                        │ (MRU)  linked = unpinned     │  │
//!   │                                        │                              │  │
//!   │                                        │ [n2] [n3]  detached = pinned │  │
//!   │                                        └──────────────────────────────┘  │
//!   │                                                       ▲                  │
//!   │   ┌─────────────────────────────┐   Used/Unused(id)   │                  │
//!   │   │ PinQueue                    │─────────────────────┘                  │
//!   │   └─────────────────────────────┘  applied after each strategy call      │
//!   │                 ▲                                                        │
//!   └─────────────────┼────────────────────────────────────────────────────────┘
//!                     │ NodeObserver per node
//!               LoadingStrategy (UserCount per resource)
//! ```
//!
//! ## Request Flow
//!
//! ```text
//!   load_request([e, f])        budget: 5 resources / 25 space units
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   1. closure order      (dependencies first, each resource once)
//!   2. for each resource:
//!        loaded + unpinned  → move to MRU head
//!        loaded + pinned    → untouched
//!        not loaded         → evict from the tail (skipping closure members)
//!                             until it fits, then load + link at head
//!   3. success            → remember [e, f] as the rollback baseline
//!      failure            → unload what this request loaded, restore what it
//!                           evicted, return the error
//! ```
//!
//! ## Pinning
//!
//! A resource with at least one loaded dependent is *pinned*: its node stays
//! in the map but leaves the MRU list, so eviction never sees it. The strategy
//! reports the transitions through a per-node observer that queues pin
//! events; the manager applies them after every strategy call.
//!
//! ## Thread Safety
//!
//! `ResourceCacheManager` is single-threaded and non-reentrant. Use
//! [`ConcurrentResourceCache`] (feature `concurrency`) to serialize calls
//! from several threads through one lock.

mod closure;
#[cfg(feature = "concurrency")]
mod concurrent;
mod journal;
mod node;

use std::fmt;

use log::{debug, trace, warn};
use rustc_hash::{FxHashMap, FxHashSet};

#[cfg(feature = "concurrency")]
pub use concurrent::ConcurrentResourceCache;

use crate::builder::RollbackPolicy;
use crate::ds::{IntrusiveList, Linkage, SlotId};
use crate::error::{CacheError, CapacityError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::ManagerMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::ManagerMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{ManagerMetricsRecorder, MetricsSnapshotProvider};
use crate::traits::LoadingStrategy;
use closure::closure_order;
use journal::RequestJournal;
use node::{Node, NodeObserver, PinEvent, PinQueue};

/// Where a freshly created node enters the MRU list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Front,
    Back,
}

/// Budgeted, dependency-aware resource cache.
///
/// # Example
///
/// ```
/// use depcache::manager::ResourceCacheManager;
/// use depcache::strategy::GraphStrategy;
///
/// let mut graph = GraphStrategy::new();
/// graph.insert("texture", 4, []).insert("material", 1, ["texture"]);
///
/// let mut cache = ResourceCacheManager::new(graph, 8, 16);
/// cache.load_request(&["material"]).unwrap();
///
/// assert!(cache.contains(&"material"));
/// assert!(cache.is_pinned(&"texture"));
/// assert_eq!(cache.used_space(), 5);
/// cache.destroy();
/// ```
pub struct ResourceCacheManager<S: LoadingStrategy> {
    strategy: S,
    nodes: IntrusiveList<Node<S::Resource>>,
    index: FxHashMap<S::Resource, SlotId>,
    events: PinQueue,
    max_elements: usize,
    capacity: u64,
    used_space: u64,
    rollback: RollbackPolicy,
    last_committed: Vec<S::Resource>,
    destroyed: bool,
    #[cfg(feature = "metrics")]
    metrics: ManagerMetrics,
}

impl<S: LoadingStrategy> ResourceCacheManager<S> {
    /// Creates a manager with the default (journal) rollback policy.
    ///
    /// Any budget is accepted; a zero budget makes every non-empty request
    /// fail with a capacity error. Use
    /// [`ResourceCacheBuilder::try_build`](crate::builder::ResourceCacheBuilder::try_build)
    /// to reject such configurations up front.
    pub fn new(strategy: S, max_elements: usize, capacity: u64) -> Self {
        Self::with_policy(strategy, max_elements, capacity, RollbackPolicy::default())
    }

    pub(crate) fn with_policy(
        strategy: S,
        max_elements: usize,
        capacity: u64,
        rollback: RollbackPolicy,
    ) -> Self {
        Self {
            strategy,
            nodes: IntrusiveList::with_capacity(max_elements.min(1024)),
            index: FxHashMap::default(),
            events: PinQueue::default(),
            max_elements,
            capacity,
            used_space: 0,
            rollback,
            last_committed: Vec::new(),
            destroyed: false,
            #[cfg(feature = "metrics")]
            metrics: ManagerMetrics::default(),
        }
    }

    /// Ensures every resource in `resources`, and everything it transitively
    /// depends on, is loaded.
    ///
    /// Duplicates in `resources` count once. On error nothing new stays
    /// loaded and the working set of the last successful request is restored
    /// (best effort, see [`RollbackPolicy`]).
    ///
    /// # Errors
    ///
    /// - [`CacheError::Capacity`] if the batch holds more than
    ///   `max_elements` resources, or room cannot be made without evicting
    ///   resources of the request itself.
    /// - [`CacheError::Load`] if the strategy fails to load a resource.
    /// - [`CacheError::DependencyCycle`] if unloaded resources depend on
    ///   each other in a cycle.
    ///
    /// # Panics
    ///
    /// Panics if called after [`destroy`](Self::destroy).
    pub fn load_request(&mut self, resources: &[S::Resource]) -> Result<(), CacheError> {
        assert!(
            !self.destroyed,
            "load_request called on a destroyed ResourceCacheManager"
        );
        #[cfg(feature = "metrics")]
        self.metrics.record_request();
        self.apply_pin_events();

        let batch = dedup(resources);
        if batch.len() > self.max_elements {
            #[cfg(feature = "metrics")]
            self.metrics.record_request_failure();
            return Err(CapacityError::BatchTooLarge {
                requested: batch.len(),
                max_elements: self.max_elements,
            }
            .into());
        }

        debug!("load request for {} resources", batch.len());
        let mut journal = RequestJournal::new();
        if let Err(err) = self.run_request(&batch, &mut journal) {
            #[cfg(feature = "metrics")]
            self.metrics.record_request_failure();
            warn!("load request failed: {}", err);
            self.roll_back(journal);
            return Err(err);
        }

        debug!(
            "load request committed: {} loaded, {} evicted, {}/{} resources, {}/{} space",
            journal.loaded.len(),
            journal.evicted.len(),
            self.index.len(),
            self.max_elements,
            self.used_space,
            self.capacity
        );
        self.last_committed = batch;
        Ok(())
    }

    /// Unloads every loaded resource and disables the manager for good.
    ///
    /// Unpinned resources are released from the LRU end first, which unpins
    /// their dependencies in turn. Anything still pinned afterwards (held by
    /// a dependency cycle or by dependents outside this cache) is unloaded
    /// anyway, with a warning.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    pub fn destroy(&mut self) {
        assert!(!self.destroyed, "ResourceCacheManager destroyed twice");
        self.teardown();
    }

    /// Returns `true` once [`destroy`](Self::destroy) has run.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of loaded resources, pinned or not.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of loaded resources that are currently pinned.
    pub fn pinned_len(&self) -> usize {
        self.nodes.len() - self.nodes.linked_len()
    }

    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    /// Space budget.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Space occupied by every loaded resource.
    pub fn used_space(&self) -> u64 {
        self.used_space
    }

    pub fn free_space(&self) -> u64 {
        self.capacity.saturating_sub(self.used_space)
    }

    pub fn rollback_policy(&self) -> RollbackPolicy {
        self.rollback
    }

    /// Returns `true` if `resource` is loaded.
    pub fn contains(&self, resource: &S::Resource) -> bool {
        self.index.contains_key(resource)
    }

    /// Returns `true` if `resource` is loaded and has a loaded dependent.
    pub fn is_pinned(&self, resource: &S::Resource) -> bool {
        self.index
            .get(resource)
            .is_some_and(|&id| self.nodes.linkage(id) == Some(Linkage::Detached))
    }

    /// Space recorded for `resource` when it was loaded.
    pub fn occupied_space(&self, resource: &S::Resource) -> Option<u64> {
        let id = *self.index.get(resource)?;
        self.nodes.get(id).map(|node| node.occupied_space)
    }

    /// Unpinned resources from most to least recently used. The last one is
    /// the next eviction candidate.
    pub fn mru_order(&self) -> impl Iterator<Item = &S::Resource> {
        self.nodes.iter().map(|node| &node.resource)
    }

    /// Pinned resources, in no particular order.
    pub fn pinned(&self) -> impl Iterator<Item = &S::Resource> {
        self.nodes
            .iter_all()
            .filter(|(_, _, linkage)| *linkage == Linkage::Detached)
            .map(|(_, node, _)| &node.resource)
    }

    /// The batch of the last successful request.
    pub fn last_committed(&self) -> &[S::Resource] {
        &self.last_committed
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Mutable access to the strategy. Usage transitions it raises are
    /// applied at the start of the next request.
    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    /// Verifies that the map, the MRU list, the space counter and the
    /// strategy agree with each other.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.index.len() != self.nodes.len() {
            return Err(InvariantError::new(format!(
                "index holds {} resources but {} nodes are alive",
                self.index.len(),
                self.nodes.len()
            )));
        }

        let mut space = 0u64;
        for (resource, &id) in &self.index {
            let node = self.nodes.get(id).ok_or_else(|| {
                InvariantError::new(format!("{:?} maps to a freed node", resource))
            })?;
            if node.resource != *resource {
                return Err(InvariantError::new(format!(
                    "{:?} maps to the node of {:?}",
                    resource, node.resource
                )));
            }
            if !self.strategy.is_loaded(resource) {
                return Err(InvariantError::new(format!(
                    "{:?} is cached but the strategy reports it unloaded",
                    resource
                )));
            }
            space += node.occupied_space;
        }
        if space != self.used_space {
            return Err(InvariantError::new(format!(
                "nodes occupy {} space units but used_space is {}",
                space, self.used_space
            )));
        }

        let mut linked = 0usize;
        let mut last = None;
        let mut cursor = self.nodes.front_id();
        while let Some(id) = cursor {
            if self.nodes.prev_id(id) != last {
                return Err(InvariantError::new(format!(
                    "MRU list back link of {:?} is broken",
                    self.nodes.get(id).map(|node| &node.resource)
                )));
            }
            linked += 1;
            if linked > self.nodes.linked_len() {
                return Err(InvariantError::new("MRU list walk does not terminate"));
            }
            last = Some(id);
            cursor = self.nodes.next_id(id);
        }
        if linked != self.nodes.linked_len() || last != self.nodes.back_id() {
            return Err(InvariantError::new(format!(
                "MRU list walk found {} nodes, expected {}",
                linked,
                self.nodes.linked_len()
            )));
        }
        Ok(())
    }

    fn run_request(
        &mut self,
        batch: &[S::Resource],
        journal: &mut RequestJournal<S::Resource>,
    ) -> Result<(), CacheError> {
        let order = {
            let index = &self.index;
            closure_order(&self.strategy, batch, |resource| {
                index.contains_key(resource)
            })?
        };
        let members: FxHashSet<S::Resource> = order.iter().cloned().collect();
        trace!("closure of {} resources", order.len());

        for resource in &order {
            self.process(resource, &members, journal)?;
        }
        Ok(())
    }

    fn process(
        &mut self,
        resource: &S::Resource,
        members: &FxHashSet<S::Resource>,
        journal: &mut RequestJournal<S::Resource>,
    ) -> Result<(), CacheError> {
        if let Some(&id) = self.index.get(resource) {
            #[cfg(feature = "metrics")]
            self.metrics.record_hit();
            if self.nodes.is_linked(id) && self.nodes.front_id() != Some(id) {
                self.nodes.move_to_front(id);
                #[cfg(feature = "metrics")]
                self.metrics.record_bump();
                trace!("bumped {:?} to MRU head", resource);
            }
            return Ok(());
        }

        let required = self.strategy.occupied_space(resource);
        self.make_room(resource, required, members, journal)?;

        if let Err(source) = self.strategy.load(resource) {
            self.apply_pin_events();
            return Err(CacheError::Load {
                resource: format!("{:?}", resource),
                source: Box::new(source),
            });
        }
        self.insert_node(resource, required, Placement::Front);
        journal.loaded.push(resource.clone());
        Ok(())
    }

    /// Evicts unpinned non-members from the LRU end until `required` space
    /// and one resource slot are free.
    fn make_room(
        &mut self,
        resource: &S::Resource,
        required: u64,
        members: &FxHashSet<S::Resource>,
        journal: &mut RequestJournal<S::Resource>,
    ) -> Result<(), CacheError> {
        let mut cursor = self.nodes.back_id();
        while !self.fits(required) {
            let Some(id) = cursor else {
                return Err(CapacityError::NoEvictableSpace {
                    resource: format!("{:?}", resource),
                    required,
                    free: self.free_space(),
                    count: self.index.len(),
                    max_elements: self.max_elements,
                }
                .into());
            };
            #[cfg(feature = "metrics")]
            self.metrics.record_evict_scan_step();

            let prev = self.nodes.prev_id(id);
            let is_member = self
                .nodes
                .get(id)
                .map_or(true, |node| members.contains(&node.resource));
            if is_member {
                cursor = prev;
                continue;
            }

            let (evicted, space) = self.release(id);
            #[cfg(feature = "metrics")]
            self.metrics.record_eviction();
            debug!("evicted {:?} ({} space units)", evicted, space);
            journal.evicted.push((evicted, space));

            // Unloading may have unpinned dependencies onto the head. They
            // are still ahead of `prev`; only restart when `prev` is gone.
            cursor = match prev {
                Some(prev) if self.nodes.is_linked(prev) => Some(prev),
                _ => self.nodes.back_id(),
            };
        }
        Ok(())
    }

    fn fits(&self, required: u64) -> bool {
        self.free_space() >= required && self.index.len() < self.max_elements
    }

    /// Records a freshly loaded resource and registers its observer.
    fn insert_node(&mut self, resource: &S::Resource, space: u64, placement: Placement) {
        let id = self
            .nodes
            .insert_detached(Node::new(resource.clone(), space));
        let observer = NodeObserver::handle(id, self.events.clone());
        if let Some(node) = self.nodes.get_mut(id) {
            node.observer = Some(observer.clone());
        }
        match placement {
            Placement::Front => self.nodes.link_front(id),
            Placement::Back => self.nodes.link_back(id),
        };
        self.index.insert(resource.clone(), id);
        self.used_space += space;
        self.strategy.attach_observer(resource, observer);
        self.apply_pin_events();

        #[cfg(feature = "metrics")]
        self.metrics.record_load();
        debug!("loaded {:?} ({} space units)", resource, space);
    }

    /// Drops the node `id`, detaches its observer and unloads its resource.
    fn release(&mut self, id: SlotId) -> (S::Resource, u64) {
        let node = self
            .nodes
            .remove(id)
            .expect("release called with a handle of a freed node");
        self.index.remove(&node.resource);
        self.used_space -= node.occupied_space;
        if let Some(observer) = &node.observer {
            self.strategy.detach_observer(&node.resource, observer);
        }
        self.strategy.unload(&node.resource);
        self.apply_pin_events();
        (node.resource, node.occupied_space)
    }

    fn apply_pin_events(&mut self) {
        for event in self.events.take() {
            match event {
                PinEvent::Used(id) => {
                    if self.nodes.unlink(id) {
                        #[cfg(feature = "metrics")]
                        self.metrics.record_pin();
                        trace!("pinned {:?}", self.nodes.get(id).map(|n| &n.resource));
                    }
                },
                PinEvent::Unused(id) => {
                    if self.nodes.link_front(id) {
                        #[cfg(feature = "metrics")]
                        self.metrics.record_unpin();
                        trace!("unpinned {:?}", self.nodes.get(id).map(|n| &n.resource));
                    }
                },
            }
        }
    }

    fn roll_back(&mut self, journal: RequestJournal<S::Resource>) {
        self.apply_pin_events();
        if journal.is_empty() {
            return;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_rollback();
        debug!(
            "rolling back: unloading {} new resources, {} evicted",
            journal.loaded.len(),
            journal.evicted.len()
        );

        self.unload_all(&journal.loaded);

        match self.rollback {
            RollbackPolicy::Journal => {
                for (resource, space) in journal.evicted.iter().rev() {
                    self.restore(resource, *space);
                }
            },
            RollbackPolicy::Replay => {
                if !journal.evicted.is_empty() {
                    self.replay();
                }
            },
        }
    }

    /// Unloads `resources` in reverse order, skipping any no longer loaded.
    fn unload_all(&mut self, resources: &[S::Resource]) {
        for resource in resources.iter().rev() {
            if let Some(&id) = self.index.get(resource) {
                if !self.nodes.is_linked(id) {
                    warn!("{:?} is still pinned, forcing unload", resource);
                }
                self.release(id);
            }
        }
    }

    /// Reloads an evicted resource and links it at the LRU end.
    fn restore(&mut self, resource: &S::Resource, space: u64) {
        if self.index.contains_key(resource) {
            return;
        }
        match self.strategy.load(resource) {
            Ok(()) => self.insert_node(resource, space, Placement::Back),
            Err(err) => {
                self.apply_pin_events();
                #[cfg(feature = "metrics")]
                self.metrics.record_restore_failure();
                warn!("could not restore {:?} after rollback: {}", resource, err);
            },
        }
    }

    /// Runs the last committed batch once more. A failing replay is undone
    /// and not retried.
    fn replay(&mut self) {
        let baseline = self.last_committed.clone();
        let mut journal = RequestJournal::new();
        if let Err(err) = self.run_request(&baseline, &mut journal) {
            #[cfg(feature = "metrics")]
            self.metrics.record_restore_failure();
            warn!("replaying the last committed request failed: {}", err);
            self.apply_pin_events();
            self.unload_all(&journal.loaded);
        }
    }

    fn teardown(&mut self) {
        self.destroyed = true;
        self.apply_pin_events();
        let mut forced = 0usize;
        while !self.nodes.is_empty() {
            let id = match self.nodes.back_id() {
                Some(id) => id,
                None => {
                    forced += 1;
                    match self.nodes.iter_all().next() {
                        Some((id, _, _)) => id,
                        None => break,
                    }
                },
            };
            self.release(id);
        }
        if forced > 0 {
            warn!("teardown force-unloaded {} pinned resources", forced);
        }
        self.last_committed.clear();
        debug!("resource cache destroyed");
    }
}

#[cfg(feature = "metrics")]
impl<S: LoadingStrategy> ResourceCacheManager<S> {
    pub fn metrics_snapshot(&self) -> ManagerMetricsSnapshot {
        ManagerMetricsSnapshot {
            len: self.len(),
            pinned: self.pinned_len(),
            used_space: self.used_space,
            capacity: self.capacity,
            max_elements: self.max_elements,
            ..self.metrics.counters()
        }
    }
}

#[cfg(feature = "metrics")]
impl<S: LoadingStrategy> MetricsSnapshotProvider<ManagerMetricsSnapshot>
    for ResourceCacheManager<S>
{
    fn snapshot(&self) -> ManagerMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<S: LoadingStrategy> Drop for ResourceCacheManager<S> {
    fn drop(&mut self) {
        if !self.destroyed {
            self.teardown();
        }
    }
}

impl<S: LoadingStrategy> fmt::Debug for ResourceCacheManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCacheManager")
            .field("len", &self.index.len())
            .field("pinned", &self.pinned_len())
            .field("max_elements", &self.max_elements)
            .field("used_space", &self.used_space)
            .field("capacity", &self.capacity)
            .field("rollback", &self.rollback)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

/// Drops repeated resources, keeping first occurrences in order.
fn dedup<R: Clone + Eq + std::hash::Hash>(resources: &[R]) -> Vec<R> {
    let mut seen = FxHashSet::default();
    resources
        .iter()
        .filter(|resource| seen.insert(*resource))
        .cloned()
        .collect()
}
