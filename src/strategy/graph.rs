//! In-memory loading strategy over a declared dependency graph.
//!
//! [`GraphStrategy`] is the reference implementation of
//! [`LoadingStrategy`]: each declared resource has a fixed size, a list of
//! dependencies and a [`UserCount`] counting the loaded resources that depend
//! on it. Loading a resource increments the count of each dependency; unloading
//! it decrements them, which is what pins and unpins nodes in the cache.
//!
//! Nothing is actually materialized. The strategy keeps an event log and can
//! be told to fail specific loads, which makes it the workhorse of the test
//! suite and benchmarks.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::traits::{LoadingStrategy, ObserverHandle};
use crate::user_count::UserCount;

/// Something the strategy did, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyEvent<R> {
    Loaded(R),
    Unloaded(R),
}

/// Load failure of a [`GraphStrategy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("resource {0} is not declared")]
    Unknown(String),
    #[error("resource {0} is already loaded")]
    AlreadyLoaded(String),
    #[error("dependency {dependency} of {resource} is not loaded")]
    MissingDependency { resource: String, dependency: String },
    #[error("loading {0} failed")]
    Injected(String),
}

#[derive(Debug)]
struct Entry<R> {
    space: u64,
    dependencies: Vec<R>,
    users: UserCount,
    loaded: bool,
}

/// Loading strategy over an in-memory dependency graph.
#[derive(Debug)]
pub struct GraphStrategy<R> {
    entries: FxHashMap<R, Entry<R>>,
    failing: FxHashSet<R>,
    events: Vec<StrategyEvent<R>>,
}

impl<R> GraphStrategy<R>
where
    R: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            failing: FxHashSet::default(),
            events: Vec::new(),
        }
    }

    /// Declares `resource` with its size and dependencies, replacing any
    /// previous declaration that is not loaded.
    ///
    /// # Panics
    ///
    /// Panics if `resource` is currently loaded.
    pub fn insert(
        &mut self,
        resource: R,
        space: u64,
        dependencies: impl IntoIterator<Item = R>,
    ) -> &mut Self {
        let dependencies = dependencies.into_iter().collect();
        match self.entries.get_mut(&resource) {
            Some(entry) => {
                assert!(!entry.loaded, "redeclaring loaded resource {:?}", resource);
                entry.space = space;
                entry.dependencies = dependencies;
            },
            None => {
                self.entries.insert(
                    resource,
                    Entry {
                        space,
                        dependencies,
                        users: UserCount::new(),
                        loaded: false,
                    },
                );
            },
        }
        self
    }

    /// Makes every later `load` of `resource` fail with [`GraphError::Injected`].
    pub fn fail_on_load(&mut self, resource: R) -> &mut Self {
        self.failing.insert(resource);
        self
    }

    /// Lets previously failing resources load again.
    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    /// Number of loaded resources depending on `resource`.
    pub fn users(&self, resource: &R) -> usize {
        self.entries
            .get(resource)
            .map_or(0, |entry| entry.users.count())
    }

    /// Number of observers attached to `resource`.
    pub fn observers(&self, resource: &R) -> usize {
        self.entries
            .get(resource)
            .map_or(0, |entry| entry.users.observer_count())
    }

    /// Loaded resources, in no particular order.
    pub fn loaded(&self) -> impl Iterator<Item = &R> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.loaded)
            .map(|(resource, _)| resource)
    }

    pub fn events(&self) -> &[StrategyEvent<R>] {
        &self.events
    }

    /// Returns and clears the event log.
    pub fn take_events(&mut self) -> Vec<StrategyEvent<R>> {
        std::mem::take(&mut self.events)
    }
}

impl<R> Default for GraphStrategy<R>
where
    R: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R> LoadingStrategy for GraphStrategy<R>
where
    R: Clone + Eq + Hash + Debug,
{
    type Resource = R;
    type Error = GraphError;

    fn occupied_space(&self, resource: &R) -> u64 {
        self.entries.get(resource).map_or(0, |entry| entry.space)
    }

    fn dependencies(&self, resource: &R) -> Vec<R> {
        self.entries
            .get(resource)
            .map(|entry| entry.dependencies.clone())
            .unwrap_or_default()
    }

    fn load(&mut self, resource: &R) -> Result<(), GraphError> {
        if self.failing.contains(resource) {
            return Err(GraphError::Injected(format!("{:?}", resource)));
        }
        let entry = self
            .entries
            .get(resource)
            .ok_or_else(|| GraphError::Unknown(format!("{:?}", resource)))?;
        if entry.loaded {
            return Err(GraphError::AlreadyLoaded(format!("{:?}", resource)));
        }
        let dependencies = entry.dependencies.clone();
        if let Some(missing) = dependencies.iter().find(|dep| !self.is_loaded(dep)) {
            return Err(GraphError::MissingDependency {
                resource: format!("{:?}", resource),
                dependency: format!("{:?}", missing),
            });
        }

        for dependency in &dependencies {
            if let Some(dep) = self.entries.get_mut(dependency) {
                dep.users.increment();
            }
        }
        if let Some(entry) = self.entries.get_mut(resource) {
            entry.loaded = true;
        }
        self.events.push(StrategyEvent::Loaded(resource.clone()));
        Ok(())
    }

    fn unload(&mut self, resource: &R) {
        let dependencies = match self.entries.get_mut(resource) {
            Some(entry) if entry.loaded => {
                entry.loaded = false;
                entry.dependencies.clone()
            },
            _ => return,
        };
        for dependency in &dependencies {
            if let Some(dep) = self.entries.get_mut(dependency) {
                dep.users.decrement();
            }
        }
        self.events.push(StrategyEvent::Unloaded(resource.clone()));
    }

    fn is_loaded(&self, resource: &R) -> bool {
        self.entries.get(resource).is_some_and(|entry| entry.loaded)
    }

    fn attach_observer(&mut self, resource: &R, observer: ObserverHandle) {
        if let Some(entry) = self.entries.get_mut(resource) {
            entry.users.add_observer(observer);
        }
    }

    fn detach_observer(&mut self, resource: &R, observer: &ObserverHandle) {
        if let Some(entry) = self.entries.get_mut(resource) {
            entry.users.remove_observer(observer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> GraphStrategy<&'static str> {
        let mut graph = GraphStrategy::new();
        graph
            .insert("shader", 2, [])
            .insert("material", 1, ["shader"])
            .insert("mesh", 5, ["material"]);
        graph
    }

    #[test]
    fn load_counts_users_of_dependencies() {
        let mut graph = chain();
        graph.load(&"shader").unwrap();
        graph.load(&"material").unwrap();
        assert_eq!(graph.users(&"shader"), 1);
        assert_eq!(graph.users(&"material"), 0);

        graph.unload(&"material");
        assert_eq!(graph.users(&"shader"), 0);
        assert!(!graph.is_loaded(&"material"));
        assert_eq!(
            graph.events(),
            &[
                StrategyEvent::Loaded("shader"),
                StrategyEvent::Loaded("material"),
                StrategyEvent::Unloaded("material"),
            ]
        );
    }

    #[test]
    fn load_requires_dependencies() {
        let mut graph = chain();
        let err = graph.load(&"mesh").unwrap_err();
        assert_eq!(
            err,
            GraphError::MissingDependency {
                resource: "\"mesh\"".to_string(),
                dependency: "\"material\"".to_string(),
            }
        );
        assert!(graph.events().is_empty());
    }

    #[test]
    fn load_rejects_unknown_and_double_loads() {
        let mut graph = chain();
        assert!(matches!(graph.load(&"nope"), Err(GraphError::Unknown(_))));
        graph.load(&"shader").unwrap();
        assert!(matches!(
            graph.load(&"shader"),
            Err(GraphError::AlreadyLoaded(_))
        ));
    }

    #[test]
    fn injected_failure_until_cleared() {
        let mut graph = chain();
        graph.fail_on_load("shader");
        assert_eq!(
            graph.load(&"shader"),
            Err(GraphError::Injected("\"shader\"".to_string()))
        );
        graph.clear_failures();
        assert!(graph.load(&"shader").is_ok());
    }

    #[test]
    fn declared_metadata_is_reported() {
        let graph = chain();
        assert_eq!(graph.occupied_space(&"mesh"), 5);
        assert_eq!(graph.dependencies(&"mesh"), vec!["material"]);
        assert_eq!(graph.occupied_space(&"nope"), 0);
        assert!(graph.dependencies(&"nope").is_empty());
    }

    #[test]
    fn take_events_drains_log() {
        let mut graph = chain();
        graph.load(&"shader").unwrap();
        assert_eq!(graph.take_events().len(), 1);
        assert!(graph.events().is_empty());
        assert_eq!(graph.loaded().count(), 1);
    }
}
