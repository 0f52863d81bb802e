//! Dependency closure of a request.
//!
//! Depth-first walk from the requested roots. Resident resources are leaves:
//! their dependencies are already loaded (and pinned by them), so the strategy
//! is not asked. The output is post-order, which puts every dependency ahead
//! of the resources needing it, lists each resource once, and keeps roots in
//! request order.
//!
//! ```text
//!   request [a, c]      a ─► b      c ─► b, d
//!
//!   order:  b, a, d, c
//! ```

use rustc_hash::FxHashSet;

use crate::error::CacheError;
use crate::traits::LoadingStrategy;

enum Visit<R> {
    Enter(R),
    Exit(R),
}

/// Computes the processing order for `roots`.
///
/// Fails with [`CacheError::DependencyCycle`] if an unloaded resource is
/// reachable from itself.
pub(crate) fn closure_order<S, F>(
    strategy: &S,
    roots: &[S::Resource],
    is_resident: F,
) -> Result<Vec<S::Resource>, CacheError>
where
    S: LoadingStrategy,
    F: Fn(&S::Resource) -> bool,
{
    let mut order = Vec::with_capacity(roots.len());
    let mut done: FxHashSet<S::Resource> = FxHashSet::default();
    let mut on_path: FxHashSet<S::Resource> = FxHashSet::default();
    let mut stack: Vec<Visit<S::Resource>> =
        roots.iter().rev().cloned().map(Visit::Enter).collect();

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(resource) => {
                if done.contains(&resource) {
                    continue;
                }
                if on_path.contains(&resource) {
                    return Err(CacheError::DependencyCycle {
                        resource: format!("{:?}", resource),
                    });
                }
                if is_resident(&resource) {
                    done.insert(resource.clone());
                    order.push(resource);
                    continue;
                }

                let dependencies = strategy.dependencies(&resource);
                on_path.insert(resource.clone());
                stack.push(Visit::Exit(resource));
                for dependency in dependencies.into_iter().rev() {
                    if !done.contains(&dependency) {
                        stack.push(Visit::Enter(dependency));
                    }
                }
            },
            Visit::Exit(resource) => {
                on_path.remove(&resource);
                done.insert(resource.clone());
                order.push(resource);
            },
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::GraphStrategy;

    fn graph() -> GraphStrategy<&'static str> {
        let mut graph = GraphStrategy::new();
        graph
            .insert("a", 1, ["b"])
            .insert("b", 1, [])
            .insert("c", 1, ["b", "d"])
            .insert("d", 1, []);
        graph
    }

    #[test]
    fn dependencies_come_before_dependents() {
        let order = closure_order(&graph(), &["a", "c"], |_| false).unwrap();
        assert_eq!(order, vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn roots_without_dependencies_keep_request_order() {
        let order = closure_order(&graph(), &["d", "b"], |_| false).unwrap();
        assert_eq!(order, vec!["d", "b"]);
    }

    #[test]
    fn diamond_is_expanded_once() {
        let mut graph = GraphStrategy::new();
        graph
            .insert("top", 1, ["left", "right"])
            .insert("left", 1, ["base"])
            .insert("right", 1, ["base"])
            .insert("base", 1, []);

        let order = closure_order(&graph, &["top"], |_| false).unwrap();
        assert_eq!(order, vec!["base", "left", "right", "top"]);
    }

    #[test]
    fn resident_resources_are_not_expanded() {
        let order = closure_order(&graph(), &["c"], |r| *r == "c").unwrap();
        assert_eq!(order, vec!["c"]);

        let order = closure_order(&graph(), &["a", "c"], |r| *r == "b").unwrap();
        assert_eq!(order, vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn root_that_is_also_a_dependency_appears_once_before_its_dependent() {
        let order = closure_order(&graph(), &["a", "b"], |_| false).unwrap();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn cycle_is_reported() {
        let mut graph = GraphStrategy::new();
        graph
            .insert("x", 1, ["y"])
            .insert("y", 1, ["z"])
            .insert("z", 1, ["x"]);

        let err = closure_order(&graph, &["x"], |_| false).unwrap_err();
        assert!(matches!(err, CacheError::DependencyCycle { .. }));
    }

    #[test]
    fn cycle_through_resident_resource_is_not_walked() {
        let mut graph = GraphStrategy::new();
        graph.insert("x", 1, ["y"]).insert("y", 1, ["x"]);

        let order = closure_order(&graph, &["x"], |r| *r == "y").unwrap();
        assert_eq!(order, vec!["y", "x"]);
    }
}
