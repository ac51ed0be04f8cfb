//! Run configuration.
//!
//! A [`Config`] is built once at startup and passed to everything that needs
//! it. Two sources are supported:
//!
//! - [`ConfigSource::Env`] reads `RIPPLE_MODULE_NAME`, `RIPPLE_PROJECT_ROOT`
//!   and `RIPPLE_BASE_REF`. External command failures are fatal.
//! - [`ConfigSource::Discover`] finds the git toplevel, locates `go.mod`
//!   beneath it and reads the module name from its first line. The base
//!   revision defaults to `HEAD^`. External command failures are treated as
//!   empty results.
//!
//! Command-line [`Overrides`] win over either source.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::toolchain::{FailurePolicy, run_lines};
use crate::types::Namespace;

/// Environment variable holding the module namespace.
pub const ENV_MODULE_NAME: &str = "RIPPLE_MODULE_NAME";
/// Environment variable holding the project root directory.
pub const ENV_PROJECT_ROOT: &str = "RIPPLE_PROJECT_ROOT";
/// Environment variable holding the base revision to diff against.
pub const ENV_BASE_REF: &str = "RIPPLE_BASE_REF";

/// Name of the module declaration file.
pub const MODULE_FILE: &str = "go.mod";
/// Base revision used by discovery when none is given.
pub const DEFAULT_BASE_REF: &str = "HEAD^";

/// Where configuration values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigSource {
    /// Environment variables, strict command failures
    Env,
    /// Auto-discovery from git and `go.mod`, lenient command failures
    #[default]
    Discover,
}

impl ConfigSource {
    /// Failure policy applied to external commands for this source.
    #[must_use]
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::Env => FailurePolicy::Strict,
            Self::Discover => FailurePolicy::Lenient,
        }
    }
}

/// Command used to test one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    /// Executable to run
    pub program: String,
    /// Arguments placed before the module path
    pub args: Vec<String>,
}

impl Default for TestCommand {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            args: vec!["test".to_string(), "--short".to_string()],
        }
    }
}

impl TestCommand {
    /// The command line for one module, as shown in diagnostics.
    #[must_use]
    pub fn display_for(&self, module: &str) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(module);
        parts.join(" ")
    }
}

/// Values supplied on the command line that take precedence over the source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Project root directory
    pub project_root: Option<PathBuf>,
    /// Base revision
    pub base_ref: Option<String>,
    /// Replacement test command arguments
    pub test_args: Option<Vec<String>>,
}

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root import path of the codebase
    pub namespace: Namespace,
    /// Directory holding `go.mod` and the dependency cache
    pub project_root: PathBuf,
    /// Revision the working tree is diffed against
    pub base_ref: String,
    /// How external command failures are handled
    pub failure_policy: FailurePolicy,
    /// Command used to test each module
    pub test_command: TestCommand,
}

impl Config {
    /// Build the configuration from `source`, applying `overrides`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a required value is missing or the
    /// project root or `go.mod` cannot be found.
    pub fn load(source: ConfigSource, overrides: Overrides) -> Result<Self> {
        match source {
            ConfigSource::Env => Self::from_env(|name| std::env::var(name).ok(), overrides),
            ConfigSource::Discover => Self::discover(overrides),
        }
    }

    /// Build the configuration from environment variables read through `lookup`.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingEnv`] for a required variable not covered by an
    /// override, or [`Error::ProjectRootNotFound`] if the root is not a directory.
    pub fn from_env<F>(lookup: F, overrides: Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(Error::MissingEnv { name })
        };

        let namespace = Namespace::new(require(ENV_MODULE_NAME)?.trim());
        let project_root = match overrides.project_root {
            Some(root) => root,
            None => PathBuf::from(require(ENV_PROJECT_ROOT)?),
        };
        let base_ref = match overrides.base_ref {
            Some(base) => base,
            None => require(ENV_BASE_REF)?,
        };

        if !project_root.is_dir() {
            return Err(Error::ProjectRootNotFound(format!(
                "{} is not a directory",
                project_root.display()
            )));
        }

        let config = Self {
            namespace,
            project_root,
            base_ref,
            failure_policy: ConfigSource::Env.failure_policy(),
            test_command: test_command(overrides.test_args),
        };
        debug!(?config, "Loaded configuration from environment");
        Ok(config)
    }

    /// Discover the configuration from the git repository containing the
    /// current directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectRootNotFound`] outside a git repository and
    /// [`Error::ModuleFileNotFound`] if no `go.mod` exists.
    pub fn discover(overrides: Overrides) -> Result<Self> {
        let project_root = match overrides.project_root.clone() {
            Some(root) => root,
            None => {
                let git_root = git_toplevel()?;
                find_module_root(&git_root)?
            }
        };
        Self::from_project_root(project_root, overrides)
    }

    /// Build a discovery-style configuration for a known project root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModuleFileNotFound`] if the root has no readable
    /// `go.mod` with a module name.
    pub fn from_project_root(project_root: PathBuf, overrides: Overrides) -> Result<Self> {
        let namespace = read_module_name(&project_root)?;
        let config = Self {
            namespace,
            project_root,
            base_ref: overrides
                .base_ref
                .unwrap_or_else(|| DEFAULT_BASE_REF.to_string()),
            failure_policy: ConfigSource::Discover.failure_policy(),
            test_command: test_command(overrides.test_args),
        };
        info!(
            namespace = %config.namespace,
            root = %config.project_root.display(),
            base = %config.base_ref,
            "Discovered configuration"
        );
        Ok(config)
    }
}

fn test_command(args: Option<Vec<String>>) -> TestCommand {
    let mut command = TestCommand::default();
    if let Some(args) = args.filter(|a| !a.is_empty()) {
        command.args = args;
    }
    command
}

fn git_toplevel() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let lines = run_lines(&cwd, FailurePolicy::Lenient, "git", &["rev-parse", "--show-toplevel"])?;
    lines
        .into_iter()
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| Error::ProjectRootNotFound("not inside a git repository".to_string()))
}

/// Find the directory of the shallowest `go.mod` under `search_root`.
///
/// Hidden and git-ignored directories are skipped. Ties at the same depth
/// resolve to the lexicographically first path.
///
/// # Errors
///
/// Returns [`Error::ModuleFileNotFound`] if there is no `go.mod`.
pub fn find_module_root(search_root: &Path) -> Result<PathBuf> {
    let mut best: Option<(usize, PathBuf)> = None;

    let mut builder = WalkBuilder::new(search_root);
    builder.hidden(true).git_ignore(true).parents(false);

    for entry in builder.build().filter_map(std::result::Result::ok) {
        let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
        if !is_file || entry.file_name() != MODULE_FILE {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        let candidate = (entry.depth(), dir.to_path_buf());
        if best.as_ref().is_none_or(|current| candidate < *current) {
            best = Some(candidate);
        }
    }

    best.map(|(_, dir)| dir)
        .ok_or_else(|| Error::ModuleFileNotFound {
            path: search_root.join(MODULE_FILE),
        })
}

/// Read the module namespace from `<root>/go.mod`.
///
/// The namespace is the second whitespace-separated token of the first line,
/// e.g. `github.com/acme/shop` in `module github.com/acme/shop`.
///
/// # Errors
///
/// Returns [`Error::ModuleFileNotFound`] if the file is missing or its first
/// line has no second token.
pub fn read_module_name(root: &Path) -> Result<Namespace> {
    let path = root.join(MODULE_FILE);
    let contents = fs::read_to_string(&path).map_err(|e| {
        debug!(path = %path.display(), error = %e, "Cannot read module file");
        Error::ModuleFileNotFound { path: path.clone() }
    })?;

    parse_module_line(&contents).ok_or(Error::ModuleFileNotFound { path })
}

fn parse_module_line(contents: &str) -> Option<Namespace> {
    let first_line = contents.lines().next()?;
    let name = first_line.split_whitespace().nth(1)?;
    Some(Namespace::new(name.trim_matches('"')))
}
