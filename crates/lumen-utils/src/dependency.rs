//! Module for ordering work items by their dependencies.

use std::{
    collections::HashMap,
    fmt::{self, Debug},
    hash::Hash,
};

use indexmap::{IndexMap, IndexSet};

/// Depth first search marks, an item without a mark is unvisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// A dependency cycle found while ordering the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError<T>(Vec<T>);

impl<T> CycleError<T> {
    /// Create a new cycle error
    pub fn new(path: Vec<T>) -> Self {
        Self(path)
    }

    /// Get the cycle path
    pub fn path(&self) -> &[T] {
        &self.0
    }
}

impl<T: fmt::Display> fmt::Display for CycleError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency cycle detected: ")?;

        let mut iter = self.0.iter();

        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }

        for el in iter {
            write!(f, " -> {}", el)?;
        }

        Ok(())
    }
}

/// The result of ordering a graph that may contain cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder<T> {
    /// Every node exactly once, dependencies before their dependents
    /// except along the edges that closed a cycle.
    pub order: Vec<T>,
    /// The cycles that were broken to produce `order`.
    pub cycles: Vec<CycleError<T>>,
}

/// Graph of dependencies between work items.
///
/// Iteration order follows insertion order, so sorting the same graph
/// always produces the same order.
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    /// Forward dependencies (item -> dependencies)
    forward: IndexMap<T, IndexSet<T>>,

    /// Reverse dependencies (item -> dependents)
    reverse: IndexMap<T, IndexSet<T>>,
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self {
            forward: IndexMap::default(),
            reverse: IndexMap::default(),
        }
    }
}

impl<T> DependencyGraph<T> {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl<T: Eq + Hash> DependencyGraph<T> {
    /// Get dependencies of an item
    pub fn dependencies_of(&self, item: &T) -> impl Iterator<Item = &T> {
        self.forward.get(item).into_iter().flatten()
    }

    /// Get dependents of an item
    pub fn dependents_of(&self, item: &T) -> impl Iterator<Item = &T> {
        self.reverse.get(item).into_iter().flatten()
    }
}

impl<T: Eq + Hash + Copy> DependencyGraph<T> {
    pub fn add_node(&mut self, item: T) {
        self.forward.entry(item).or_default();
        self.reverse.entry(item).or_default();
    }

    /// Add a dependency edge, `from` depends on `to`
    pub fn add_dependency(&mut self, from: T, to: T) {
        self.add_node(from);
        self.add_node(to);

        self.forward.entry(from).or_default().insert(to);
        self.reverse.entry(to).or_default().insert(from);
    }

    /// Orders the graph so that every item comes after its dependencies.
    ///
    /// A cycle does not abort the sort: the edge that closes it is
    /// ignored and the cycle is reported in [`TopologicalOrder::cycles`].
    pub fn topological_sort(&self) -> TopologicalOrder<T>
    where
        T: Debug,
    {
        let mut marks = HashMap::new();
        let mut order = Vec::with_capacity(self.forward.len());
        let mut cycles = Vec::new();

        for &root in self.forward.keys() {
            if marks.contains_key(&root) {
                continue;
            }

            marks.insert(root, Mark::OnPath);
            let mut path = vec![(root, 0usize)];

            while let Some(&(item, next)) = path.last() {
                let dep = self
                    .forward
                    .get(&item)
                    .and_then(|deps| deps.get_index(next))
                    .copied();

                let Some(dep) = dep else {
                    marks.insert(item, Mark::Done);
                    order.push(item);
                    path.pop();
                    continue;
                };

                if let Some(top) = path.last_mut() {
                    top.1 += 1;
                }

                match marks.get(&dep) {
                    None => {
                        marks.insert(dep, Mark::OnPath);
                        path.push((dep, 0));
                    }
                    Some(Mark::OnPath) => {
                        if let Some(start) = path.iter().position(|&(m, _)| m == dep) {
                            let mut cycle = path[start..].iter().map(|&(m, _)| m).collect::<Vec<_>>();
                            cycle.push(dep);
                            cycles.push(CycleError::new(cycle));
                        }
                    }
                    Some(Mark::Done) => {}
                }
            }
        }

        TopologicalOrder { order, cycles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependencies_come_first() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(1, 2);
        graph.add_dependency(2, 3);
        graph.add_node(4);

        let sorted = graph.topological_sort();
        assert_eq!(sorted.order, vec![3, 2, 1, 4]);
        assert!(sorted.cycles.is_empty());
    }

    #[test]
    fn test_cycle_is_broken_and_reported() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency(1, 2);
        graph.add_dependency(2, 1);

        let sorted = graph.topological_sort();
        assert_eq!(sorted.order, vec![2, 1]);
        assert_eq!(sorted.cycles.len(), 1);
        assert_eq!(sorted.cycles[0].path(), &[1, 2, 1]);
    }

    #[test]
    fn test_dependents_are_tracked() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("c", "b");

        let dependents = graph.dependents_of(&"b").copied().collect::<Vec<_>>();
        assert_eq!(dependents, vec!["a", "c"]);
        assert_eq!(graph.dependencies_of(&"a").count(), 1);
        assert_eq!(graph.len(), 3);
    }
}
