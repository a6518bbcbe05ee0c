//! Package dependency graph and topological ordering.
//!
//! The graph is built from the dependency database scraped out of the build
//! system (see [`crate::depdb`]). Keys are packages from the tree's package
//! root; values are the names they depend on. Dependency names that are not
//! themselves keys (host packages, virtual targets) still take part in the
//! ordering as leaf nodes.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::GraphError;

/// A directed graph of package dependencies.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    deps: BTreeMap<String, Vec<String>>,
}

impl DepGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(package, dependencies)` entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        Self {
            deps: entries.into_iter().collect(),
        }
    }

    /// Insert a package and its dependency list.
    pub fn insert(&mut self, package: impl Into<String>, deps: Vec<String>) {
        self.deps.insert(package.into(), deps);
    }

    /// Number of keyed packages (dependency-only nodes are not counted).
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    /// Check whether the graph has no keyed packages.
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    /// The dependencies recorded for a package.
    pub fn dependencies(&self, package: &str) -> &[String] {
        self.deps.get(package).map_or(&[], |v| v.as_slice())
    }

    /// Keyed package names, sorted.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.deps.keys().map(String::as_str)
    }

    /// Every node: keyed packages plus names only referenced as dependencies.
    fn nodes(&self) -> BTreeSet<&str> {
        let mut nodes: BTreeSet<&str> = self.deps.keys().map(String::as_str).collect();
        for deps in self.deps.values() {
            nodes.extend(deps.iter().map(String::as_str));
        }
        nodes
    }

    /// Dependency-first topological order over every node.
    ///
    /// A package appears after everything it depends on. Implemented with
    /// Kahn's algorithm; the ready set is kept sorted so the order is stable
    /// for identical input. A cycle is an error naming the packages left
    /// unordered.
    pub fn topo_order(&self) -> Result<Vec<String>, GraphError> {
        let nodes = self.nodes();

        // Edges run dependency -> dependent. Duplicate dependency entries
        // collapse to a single edge.
        let mut dependents: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut in_degree: BTreeMap<&str, usize> =
            nodes.iter().map(|&n| (n, 0)).collect();

        for (package, deps) in &self.deps {
            let distinct: BTreeSet<&str> = deps
                .iter()
                .map(String::as_str)
                .filter(|d| *d != package.as_str())
                .collect();
            for dep in distinct {
                if dependents.entry(dep).or_default().insert(package.as_str())
                    && let Some(deg) = in_degree.get_mut(package.as_str())
                {
                    *deg += 1;
                }
            }
            // A self-dependency never builds; surface it as a cycle.
            if deps.iter().any(|d| d == package) {
                return Err(GraphError::Cycle {
                    packages: vec![package.clone()],
                });
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(&n, _)| n)
            .collect();

        let mut order = Vec::with_capacity(nodes.len());
        while let Some(&node) = ready.iter().next() {
            ready.remove(node);
            order.push(node.to_string());

            if let Some(deps) = dependents.get(node) {
                for &dependent in deps {
                    if let Some(deg) = in_degree.get_mut(dependent) {
                        *deg -= 1;
                        if *deg == 0 {
                            ready.insert(dependent);
                        }
                    }
                }
            }
        }

        if order.len() != nodes.len() {
            let packages: Vec<String> = in_degree
                .iter()
                .filter(|&(_, deg)| *deg > 0)
                .map(|(&n, _)| n.to_string())
                .collect();
            return Err(GraphError::Cycle { packages });
        }

        Ok(order)
    }

    /// The topological order filtered to `changed`, preserving order.
    pub fn changed_order(
        &self,
        changed: &BTreeSet<String>,
    ) -> Result<Vec<String>, GraphError> {
        let order = self.topo_order()?;
        Ok(order
            .into_iter()
            .filter(|p| changed.contains(p))
            .collect())
    }
}
