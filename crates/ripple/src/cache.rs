//! On-disk cache of the dependency graph.
//!
//! The graph is stored as a single JSON file in the project root:
//!
//! ```json
//! {
//!   "BottomUp": { "gfg/b": { "gfg/a": {} }, "gfg/a": {} },
//!   "TopDown":  { "gfg/a": { "gfg/b": {} }, "gfg/b": {} }
//! }
//! ```
//!
//! Set members are object keys whose values are empty placeholder objects.
//! That shape exists only here; in memory the graph uses real sets.
//!
//! A cache that is missing, unreadable, corrupt, or has an empty `BottomUp`
//! mapping is never an error. [`GraphCache::load`] falls back to a full
//! construction instead.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info};

use crate::error::Result;
use crate::graph::{DependencyGraph, EdgeMap};

/// File name of the cache, relative to the project root.
pub const CACHE_FILE_NAME: &str = ".go_module_dependency_map";

/// Where the graph for a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphSource {
    /// Deserialized from an existing cache file
    Cache,
    /// Built from scratch because no usable cache existed
    Rebuilt,
}

/// Reads and writes the dependency graph cache file.
#[derive(Debug, Clone)]
pub struct GraphCache {
    path: PathBuf,
}

impl GraphCache {
    /// Cache located in the given project root.
    #[must_use]
    pub fn in_root(root: &Path) -> Self {
        Self::at(root.join(CACHE_FILE_NAME))
    }

    /// Cache at an explicit file path.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached graph, or build one with `rebuild` if the cache is unusable.
    ///
    /// The cache file is created empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Only errors returned by `rebuild` are propagated; cache problems are not.
    pub fn load<F>(&self, rebuild: F) -> Result<(DependencyGraph, GraphSource)>
    where
        F: FnOnce() -> Result<DependencyGraph>,
    {
        match self.read() {
            Ok(graph) if !graph.is_empty() => {
                debug!(
                    path = %self.path.display(),
                    modules = graph.module_count(),
                    "Loaded dependency graph from cache"
                );
                return Ok((graph, GraphSource::Cache));
            }
            Ok(_) => {
                info!(path = %self.path.display(), "Dependency cache is empty, rebuilding");
            }
            Err(e) => {
                info!(
                    path = %self.path.display(),
                    error = %e,
                    "Dependency cache is unusable, rebuilding"
                );
            }
        }

        rebuild().map(|graph| (graph, GraphSource::Rebuilt))
    }

    /// Read and parse the cache file without any fallback.
    ///
    /// An absent file is created and reads as empty content, which fails to
    /// parse.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read, or is not a
    /// valid cache document.
    pub fn read(&self) -> Result<DependencyGraph> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        decode(&contents)
    }

    /// Serialize the graph and replace the cache file with it.
    ///
    /// The document is written to a sibling `.tmp` file first and renamed
    /// over the target, so readers never observe a partial write.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the write, or the rename fails.
    pub fn save(&self, graph: &DependencyGraph) -> Result<()> {
        let encoded = encode(graph)?;
        let temp_path = self.path.with_extension("tmp");

        let write_result = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(encoded.as_bytes())?;
            file.sync_all()
        });
        if let Err(e) = write_result {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        fs::rename(&temp_path, &self.path)?;
        debug!(
            path = %self.path.display(),
            bytes = encoded.len(),
            "Saved dependency graph"
        );
        Ok(())
    }

    /// Delete the cache file if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Empty object used as the value of every set member.
#[derive(Serialize)]
struct Placeholder {}

/// A set written as an object whose keys are the members.
struct SetAsObject<'a>(&'a BTreeSet<String>);

impl Serialize for SetAsObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|member| (member, Placeholder {})))
    }
}

fn serialize_edges<S: Serializer>(edges: &EdgeMap, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(edges.iter().map(|(key, set)| (key, SetAsObject(set))))
}

#[derive(Serialize)]
struct CacheDocumentRef<'a> {
    #[serde(rename = "BottomUp", serialize_with = "serialize_edges")]
    bottom_up: &'a EdgeMap,
    #[serde(rename = "TopDown", serialize_with = "serialize_edges")]
    top_down: &'a EdgeMap,
}

/// Member values are ignored whatever they hold.
type RawEdges = BTreeMap<String, Option<BTreeMap<String, IgnoredAny>>>;

#[derive(Deserialize)]
struct CacheDocument {
    #[serde(rename = "BottomUp", default)]
    bottom_up: Option<RawEdges>,
    #[serde(rename = "TopDown", default)]
    top_down: Option<RawEdges>,
}

fn into_edges(raw: Option<RawEdges>) -> EdgeMap {
    raw.unwrap_or_default()
        .into_iter()
        .map(|(key, members)| {
            let set = members.unwrap_or_default().into_keys().collect();
            (key, set)
        })
        .collect()
}

/// Serialize a graph into the cache document format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode(graph: &DependencyGraph) -> Result<String> {
    let document = CacheDocumentRef {
        bottom_up: graph.bottom_up(),
        top_down: graph.top_down(),
    };
    Ok(serde_json::to_string(&document)?)
}

/// Parse a cache document into a graph.
///
/// # Errors
///
/// Returns an error if `contents` is not a JSON object of the cache shape.
pub fn decode(contents: &str) -> Result<DependencyGraph> {
    let document: CacheDocument = serde_json::from_str(contents)?;
    Ok(DependencyGraph::from_parts(
        into_edges(document.bottom_up),
        into_edges(document.top_down),
    ))
}
