//! Core value types shared across the pipeline.

use std::fmt;

/// A fully-qualified module (Go package) path, e.g. `github.com/acme/shop/cart`.
///
/// Two module paths are the same module iff their strings are equal.
pub type ModulePath = String;

/// Substring that marks generated mock packages.
///
/// Modules containing it take part in graph maintenance but are never tested.
pub const MOCKS_MARKER: &str = "mocks";

/// Returns `true` if the module is a mock package that should not be tested.
#[must_use]
pub fn is_mock_module(module: &str) -> bool {
    module.contains(MOCKS_MARKER)
}

/// The root import path that identifies the codebase's own modules.
///
/// Read from the `module` directive of `go.mod`. An import belongs to the
/// codebase iff it starts with this string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace from a module root path.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self(root.into())
    }

    /// Returns `true` if `import` lies inside this namespace.
    #[must_use]
    pub fn contains(&self, import: &str) -> bool {
        import.starts_with(&self.0)
    }

    /// Build the full module path for a directory relative to the project root.
    ///
    /// An empty directory maps to the namespace itself (the root package).
    #[must_use]
    pub fn qualify(&self, relative_dir: &str) -> ModulePath {
        if relative_dir.is_empty() {
            self.0.clone()
        } else {
            format!("{}/{relative_dir}", self.0)
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
