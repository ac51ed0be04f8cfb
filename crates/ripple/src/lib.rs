//! # Ripple: change-impact test selection for Go modules
//!
//! Ripple decides which Go packages must be re-tested after a set of files
//! change. It keeps a bidirectional package dependency graph cached in the
//! project root, updates it from `git diff`, and selects the changed packages
//! plus the packages that import them directly.
//!
//! ## Design
//!
//! - **Single hop** - only direct importers of a changed package are tested
//! - **Incremental** - the cached graph is patched per change, never rebuilt
//!   unless the cache is unusable
//! - **Explicit collaborators** - `go` and `git` sit behind the [`Toolchain`]
//!   and [`TestRunner`] traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use ripple::{Config, ConfigSource, GoToolchain, ImpactResolver, Overrides};
//!
//! let config = Config::load(ConfigSource::Discover, Overrides::default())?;
//! let toolchain = GoToolchain::new(&config.project_root, config.failure_policy);
//!
//! let report = ImpactResolver::new(&config, &toolchain).resolve()?;
//! for module in &report.modules {
//!     println!("{module}");
//! }
//! # Ok::<(), ripple::Error>(())
//! ```

mod cache;
mod change;
mod config;
mod error;
mod graph;
mod resolver;
mod runner;
mod toolchain;
mod types;

pub use cache::{CACHE_FILE_NAME, GraphCache, GraphSource, decode, encode};
pub use change::{ChangeRecord, ChangeStatus, classify};
pub use config::{
    Config, ConfigSource, DEFAULT_BASE_REF, ENV_BASE_REF, ENV_MODULE_NAME, ENV_PROJECT_ROOT,
    MODULE_FILE, Overrides, TestCommand, find_module_root, read_module_name,
};
pub use error::{Error, Result};
pub use graph::{DependencyGraph, EdgeMap};
pub use resolver::{ChangedModule, ImpactReport, ImpactResolver, Selection, select_modules};
pub use runner::{GoTestRunner, Outcome, TestRunner, run_all};
pub use toolchain::{FailurePolicy, GoToolchain, StaticToolchain, Toolchain, run_lines};
pub use types::{MOCKS_MARKER, ModulePath, Namespace, is_mock_module};
