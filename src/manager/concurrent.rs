use std::fmt;

use parking_lot::Mutex;

use crate::error::CacheError;
use crate::manager::ResourceCacheManager;
use crate::traits::LoadingStrategy;

/// Thread-safe front for [`ResourceCacheManager`].
///
/// Every call takes one `parking_lot::Mutex`, so requests from several
/// threads run one after another, each to completion. Requires the strategy
/// and its resources to be `Send`.
pub struct ConcurrentResourceCache<S: LoadingStrategy> {
    inner: Mutex<ResourceCacheManager<S>>,
}

impl<S: LoadingStrategy> ConcurrentResourceCache<S> {
    pub fn new(manager: ResourceCacheManager<S>) -> Self {
        Self {
            inner: Mutex::new(manager),
        }
    }

    /// See [`ResourceCacheManager::load_request`].
    pub fn load_request(&self, resources: &[S::Resource]) -> Result<(), CacheError> {
        self.inner.lock().load_request(resources)
    }

    /// See [`ResourceCacheManager::destroy`].
    pub fn destroy(&self) {
        self.inner.lock().destroy();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn used_space(&self) -> u64 {
        self.inner.lock().used_space()
    }

    pub fn contains(&self, resource: &S::Resource) -> bool {
        self.inner.lock().contains(resource)
    }

    pub fn is_pinned(&self, resource: &S::Resource) -> bool {
        self.inner.lock().is_pinned(resource)
    }

    /// Runs `f` with exclusive access to the manager.
    pub fn with_manager<T>(&self, f: impl FnOnce(&mut ResourceCacheManager<S>) -> T) -> T {
        let mut manager = self.inner.lock();
        f(&mut manager)
    }

    pub fn into_inner(self) -> ResourceCacheManager<S> {
        self.inner.into_inner()
    }
}

impl<S: LoadingStrategy> fmt::Debug for ConcurrentResourceCache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(manager) => f
                .debug_struct("ConcurrentResourceCache")
                .field("inner", &*manager)
                .finish(),
            None => f
                .debug_struct("ConcurrentResourceCache")
                .field("inner", &"<locked>")
                .finish(),
        }
    }
}
