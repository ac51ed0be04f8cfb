//! Bidirectional module dependency graph.
//!
//! The graph keeps two views of the same edges:
//!
//! ```text
//! a imports b, a imports c, b imports c
//!
//! bottom_up (who must be re-tested if the key changes)
//!     a: {}   b: {a}   c: {a, b}
//!
//! top_down (what the key currently depends on)
//!     a: {b, c}   b: {c}   c: {}
//! ```
//!
//! Only imports inside the codebase's [`Namespace`] are recorded.
//!
//! ## Incremental maintenance
//!
//! [`DependencyGraph::record_new_module`] adds edges in both directions.
//! [`DependencyGraph::refresh_outgoing_edges`] only rewrites the top-down
//! view for the module; reverse edges in other modules' `bottom_up` sets are
//! left as they are. A module that stops importing `x` therefore remains an
//! importer of `x` until the next full construction.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::error::Result;
use crate::types::{ModulePath, Namespace};

/// Mapping from module to a set of modules.
pub type EdgeMap = BTreeMap<ModulePath, BTreeSet<ModulePath>>;

/// Module dependency graph with reverse (bottom-up) and forward (top-down) edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    bottom_up: EdgeMap,
    top_down: EdgeMap,
}

impl DependencyGraph {
    /// Create a graph with no modules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from already-built edge maps.
    ///
    /// No symmetry check is performed; a persisted graph may carry stale
    /// reverse edges.
    #[must_use]
    pub fn from_parts(bottom_up: EdgeMap, top_down: EdgeMap) -> Self {
        Self {
            bottom_up,
            top_down,
        }
    }

    /// Build the complete graph from a module list and an import lister.
    ///
    /// Every module gets an entry in both views, then each module's current
    /// imports are recorded as if the module were newly added.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `imports_of`.
    pub fn construct<F>(
        namespace: &Namespace,
        modules: &[ModulePath],
        mut imports_of: F,
    ) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Vec<String>>,
    {
        let mut graph = Self::new();
        graph.initialize_empty(modules);

        for module in modules {
            let imports = imports_of(module)?;
            graph.record_new_module(namespace, module, &imports);
        }

        debug!(
            modules = graph.module_count(),
            edges = graph.edge_count(),
            "Constructed dependency graph"
        );
        Ok(graph)
    }

    /// Create empty entries in both views for every module in `modules`.
    ///
    /// Existing entries are reset to the empty set.
    pub fn initialize_empty(&mut self, modules: &[ModulePath]) {
        for module in modules {
            self.bottom_up.insert(module.clone(), BTreeSet::new());
            self.top_down.insert(module.clone(), BTreeSet::new());
        }
    }

    /// Record the in-namespace imports of a module in both directions.
    ///
    /// Entries are created on demand. Imports outside `namespace` are ignored.
    pub fn record_new_module(&mut self, namespace: &Namespace, module: &str, imports: &[String]) {
        for import in imports.iter().filter(|i| namespace.contains(i)) {
            trace!(module, import = %import, "Recording edge");
            self.bottom_up
                .entry(import.clone())
                .or_default()
                .insert(module.to_string());
            self.top_down
                .entry(module.to_string())
                .or_default()
                .insert(import.clone());
        }
    }

    /// Replace a module's outgoing edges with its current in-namespace imports.
    ///
    /// Used for modified, deleted and renamed modules. A deleted module has no
    /// imports and ends up with an empty outgoing set. The module is not
    /// removed from the `bottom_up` sets of modules it no longer imports.
    pub fn refresh_outgoing_edges(&mut self, namespace: &Namespace, module: &str, imports: &[String]) {
        let outgoing: BTreeSet<ModulePath> = imports
            .iter()
            .filter(|i| namespace.contains(i))
            .cloned()
            .collect();
        trace!(module, count = outgoing.len(), "Refreshing outgoing edges");
        self.top_down.insert(module.to_string(), outgoing);
    }

    /// Modules that directly import `module`.
    ///
    /// An unknown module has no importers.
    pub fn importers_of<'a>(&'a self, module: &str) -> impl Iterator<Item = &'a ModulePath> + use<'a> {
        self.bottom_up.get(module).into_iter().flatten()
    }

    /// In-namespace modules that `module` directly imports.
    pub fn dependencies_of<'a>(&'a self, module: &str) -> impl Iterator<Item = &'a ModulePath> + use<'a> {
        self.top_down.get(module).into_iter().flatten()
    }

    /// Returns `true` if the module has an entry in either view.
    #[must_use]
    pub fn contains(&self, module: &str) -> bool {
        self.bottom_up.contains_key(module) || self.top_down.contains_key(module)
    }

    /// The reverse view: module to its importers.
    #[must_use]
    pub fn bottom_up(&self) -> &EdgeMap {
        &self.bottom_up
    }

    /// The forward view: module to its in-namespace imports.
    #[must_use]
    pub fn top_down(&self) -> &EdgeMap {
        &self.top_down
    }

    /// Returns `true` if the reverse view has no entries.
    ///
    /// A cache that deserializes to an empty graph is treated as unusable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bottom_up.is_empty()
    }

    /// Number of distinct modules known to either view.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.bottom_up
            .keys()
            .chain(self.top_down.keys())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of forward edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.top_down.values().map(BTreeSet::len).sum()
    }

    /// Find edges present in one view but not mirrored in the other.
    ///
    /// Returns `(dependency, importer)` pairs. A freshly constructed graph has
    /// none; incremental refreshes can leave stale reverse edges behind.
    #[must_use]
    pub fn asymmetric_edges(&self) -> Vec<(ModulePath, ModulePath)> {
        let mut pairs = BTreeSet::new();

        for (dependency, importers) in &self.bottom_up {
            for importer in importers {
                let mirrored = self
                    .top_down
                    .get(importer)
                    .is_some_and(|deps| deps.contains(dependency));
                if !mirrored {
                    pairs.insert((dependency.clone(), importer.clone()));
                }
            }
        }

        for (importer, dependencies) in &self.top_down {
            for dependency in dependencies {
                let mirrored = self
                    .bottom_up
                    .get(dependency)
                    .is_some_and(|importers| importers.contains(importer));
                if !mirrored {
                    pairs.insert((dependency.clone(), importer.clone()));
                }
            }
        }

        pairs.into_iter().collect()
    }
}
