//! Error types for the depcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by
//!   [`ResourceCacheManager::load_request`](crate::manager::ResourceCacheManager::load_request).
//!   Either a capacity failure, a strategy load failure, or a dependency cycle.
//! - [`CapacityError`]: Why a request did not fit the count/space budget.
//! - [`ConfigError`]: Returned when builder parameters are invalid.
//! - [`InvariantError`]: Returned by `check_invariants` when internal
//!   bookkeeping is inconsistent.
//!
//! Usage-contract violations (operating after `destroy`, destroying twice,
//! counter underflow) are not represented here: they panic.
//!
//! ## Example Usage
//!
//! ```
//! use depcache::error::{CacheError, CapacityError};
//!
//! let err = CacheError::from(CapacityError::BatchTooLarge {
//!     requested: 8,
//!     max_elements: 4,
//! });
//! assert!(err.is_capacity());
//! assert!(err.to_string().contains("8"));
//! ```

use std::error::Error as StdError;

use thiserror::Error;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Failure of a `load_request` call.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The request does not fit the count/space budget. The previously
    /// committed working set has been restored (best effort).
    #[error(transparent)]
    Capacity(#[from] CapacityError),

    /// The loading strategy failed to materialize a resource. The source is
    /// the strategy's own error, untouched.
    #[error("failed to load resource {resource}")]
    Load {
        resource: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    /// The dependency graph of the request contains a cycle through
    /// unloaded resources.
    #[error("dependency cycle through resource {resource}")]
    DependencyCycle { resource: String },
}

impl CacheError {
    /// Returns `true` for capacity failures, which callers may retry with a
    /// smaller batch.
    pub fn is_capacity(&self) -> bool {
        matches!(self, CacheError::Capacity(_))
    }

    /// Returns the capacity detail, if this is a capacity failure.
    pub fn as_capacity(&self) -> Option<&CapacityError> {
        match self {
            CacheError::Capacity(inner) => Some(inner),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CapacityError
// ---------------------------------------------------------------------------

/// Why a request could not be satisfied within the budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// The requested batch alone holds more resources than the cache may.
    #[error("request of {requested} resources exceeds the limit of {max_elements}")]
    BatchTooLarge {
        requested: usize,
        max_elements: usize,
    },

    /// Every remaining evictable resource belongs to the current request.
    #[error(
        "cannot make room for {resource}: needs {required} space units, \
         {free} free, {count}/{max_elements} resources loaded, nothing left to evict"
    )]
    NoEvictableSpace {
        resource: String,
        required: u64,
        free: u64,
        count: usize,
        max_elements: usize,
    },
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`ResourceCacheBuilder::try_build`](crate::builder::ResourceCacheBuilder::try_build).
/// Carries a human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by
/// [`ResourceCacheManager::check_invariants`](crate::manager::ResourceCacheManager::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
