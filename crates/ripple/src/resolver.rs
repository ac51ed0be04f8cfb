//! Changed files to modules-to-test.
//!
//! The resolver loads (or builds) the dependency graph, applies every change
//! from the diff to it, selects the modules to test and persists the updated
//! graph.
//!
//! ## Selection
//!
//! 1. Each diff line is classified. The first time a module is seen its graph
//!    entry is updated and, unless it is a mock package, it joins the
//!    *changed* list.
//! 2. For each changed module, in order, its direct importers that were not
//!    seen yet join the *importer* list. Importers of importers are not
//!    followed.
//! 3. The result is the importer list followed by the changed list.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{GraphCache, GraphSource};
use crate::change::{ChangeStatus, classify};
use crate::config::Config;
use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::toolchain::Toolchain;
use crate::types::{ModulePath, Namespace, is_mock_module};

/// A changed module and the importers it pulled into the test set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedModule {
    /// The module that changed
    pub module: ModulePath,
    /// Status of the first diff line that touched it
    pub status: ChangeStatus,
    /// Importers added to the test set because of this module
    pub selected_importers: Vec<ModulePath>,
}

/// Modules chosen for testing, with the reasoning behind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Modules to test: direct importers first, then changed modules
    pub modules: Vec<ModulePath>,
    /// Changed non-mock modules in diff order
    pub changed: Vec<ChangedModule>,
}

/// Result of a full resolver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    /// Modules to test, in order
    pub modules: Vec<ModulePath>,
    /// Changed modules and the importers each selected
    pub changed: Vec<ChangedModule>,
    /// Whether the graph was loaded from cache or rebuilt
    #[serde(serialize_with = "serialize_source")]
    pub graph_source: GraphSource,
}

fn serialize_source<S: serde::Serializer>(
    source: &GraphSource,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(match source {
        GraphSource::Cache => "cache",
        GraphSource::Rebuilt => "rebuilt",
    })
}

/// Apply diff lines to `graph` and select the modules to test.
///
/// `imports_of` supplies the current import list of a module.
///
/// # Errors
///
/// Returns an error if a line has an unknown status or `imports_of` fails.
pub fn select_modules<F>(
    namespace: &Namespace,
    graph: &mut DependencyGraph,
    diff_lines: &[String],
    mut imports_of: F,
) -> Result<Selection>
where
    F: FnMut(&str) -> Result<Vec<String>>,
{
    let mut seen: HashSet<ModulePath> = HashSet::new();
    let mut changed: Vec<ChangedModule> = Vec::new();

    for line in diff_lines {
        let record = classify(namespace, line)?;
        if !seen.insert(record.module.clone()) {
            continue;
        }

        let imports = imports_of(&record.module)?;
        match record.status {
            ChangeStatus::Added => graph.record_new_module(namespace, &record.module, &imports),
            ChangeStatus::Modified | ChangeStatus::Deleted | ChangeStatus::Renamed => {
                graph.refresh_outgoing_edges(namespace, &record.module, &imports);
            }
        }
        debug!(module = %record.module, status = %record.status, "Applied change");

        if !is_mock_module(&record.module) {
            changed.push(ChangedModule {
                module: record.module,
                status: record.status,
                selected_importers: Vec::new(),
            });
        }
    }

    let mut importers: Vec<ModulePath> = Vec::new();
    for entry in &mut changed {
        for importer in graph.importers_of(&entry.module) {
            if seen.insert(importer.clone()) && !is_mock_module(importer) {
                importers.push(importer.clone());
                entry.selected_importers.push(importer.clone());
            }
        }
    }

    let mut modules = importers;
    modules.extend(changed.iter().map(|c| c.module.clone()));

    Ok(Selection { modules, changed })
}

/// Drives one change-impact run against a toolchain and a graph cache.
pub struct ImpactResolver<'a, T: Toolchain + ?Sized> {
    config: &'a Config,
    toolchain: &'a T,
    cache: GraphCache,
}

impl<'a, T: Toolchain + ?Sized> ImpactResolver<'a, T> {
    /// Create a resolver using the cache in the configured project root.
    pub fn new(config: &'a Config, toolchain: &'a T) -> Self {
        Self {
            config,
            toolchain,
            cache: GraphCache::in_root(&config.project_root),
        }
    }

    /// The cache this resolver reads and writes.
    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    /// Build the full graph from the toolchain, ignoring any cache.
    ///
    /// # Errors
    ///
    /// Propagates toolchain errors.
    pub fn construct_graph(&self) -> Result<DependencyGraph> {
        let modules = self.toolchain.list_modules()?;
        info!(modules = modules.len(), "Building dependency graph");
        DependencyGraph::construct(&self.config.namespace, &modules, |m| {
            self.toolchain.list_imports(m)
        })
    }

    /// Load the cached graph, building it if the cache is unusable.
    ///
    /// # Errors
    ///
    /// Propagates toolchain errors from a rebuild.
    pub fn load_graph(&self) -> Result<(DependencyGraph, GraphSource)> {
        self.cache.load(|| self.construct_graph())
    }

    /// Discard the cache, rebuild the graph and save it.
    ///
    /// # Errors
    ///
    /// Propagates toolchain and cache write errors.
    pub fn rebuild(&self) -> Result<DependencyGraph> {
        self.cache.remove()?;
        let graph = self.construct_graph()?;
        self.cache.save(&graph)?;
        Ok(graph)
    }

    /// Run the whole pipeline and persist the updated graph.
    ///
    /// The graph is saved even when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown diff statuses, strict-policy toolchain
    /// failures or a failed cache write.
    pub fn resolve(&self) -> Result<ImpactReport> {
        let (mut graph, graph_source) = self.load_graph()?;
        let diff_lines = self.toolchain.list_changed_files(&self.config.base_ref)?;
        debug!(
            base = %self.config.base_ref,
            lines = diff_lines.len(),
            "Listed changed files"
        );

        let selection = select_modules(&self.config.namespace, &mut graph, &diff_lines, |m| {
            self.toolchain.list_imports(m)
        })?;

        self.cache.save(&graph)?;
        info!(
            changed = selection.changed.len(),
            selected = selection.modules.len(),
            "Resolved modules to test"
        );

        Ok(ImpactReport {
            modules: selection.modules,
            changed: selection.changed,
            graph_source,
        })
    }
}
