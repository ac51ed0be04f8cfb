//! External collaborators: module, import and diff listing.
//!
//! The resolver only talks to the [`Toolchain`] trait. [`GoToolchain`] shells
//! out to `go list` and `git diff`; [`StaticToolchain`] answers from memory and
//! is what the tests use.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::ModulePath;

/// What to do when an external command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Treat the failure as "no results" and carry on
    #[default]
    Lenient,
    /// Propagate the failure as [`Error::Command`]
    Strict,
}

/// Source of module, import and change information.
pub trait Toolchain {
    /// All modules that belong to the codebase's namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails under a strict policy.
    fn list_modules(&self) -> Result<Vec<ModulePath>>;

    /// Direct imports of `module`, including ones outside the namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails under a strict policy.
    fn list_imports(&self, module: &str) -> Result<Vec<String>>;

    /// Raw `--name-status` diff lines against `base_ref`.
    ///
    /// # Errors
    ///
    /// Returns an error if diffing fails under a strict policy.
    fn list_changed_files(&self, base_ref: &str) -> Result<Vec<String>>;
}

/// Toolchain backed by the `go` and `git` executables.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    root: PathBuf,
    policy: FailurePolicy,
}

impl GoToolchain {
    /// Create a toolchain that runs commands in the project root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, policy: FailurePolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }
}

impl Toolchain for GoToolchain {
    fn list_modules(&self) -> Result<Vec<ModulePath>> {
        run_lines(&self.root, self.policy, "go", &["list", "-buildvcs=false", "./..."])
    }

    fn list_imports(&self, module: &str) -> Result<Vec<String>> {
        // -e keeps a deleted package from failing the listing; it reports no imports.
        run_lines(
            &self.root,
            self.policy,
            "go",
            &[
                "list",
                "-e",
                "-buildvcs=false",
                "-f",
                "{{range .Imports}}{{println .}}{{end}}",
                module,
            ],
        )
    }

    fn list_changed_files(&self, base_ref: &str) -> Result<Vec<String>> {
        run_lines(
            &self.root,
            self.policy,
            "git",
            &["--no-pager", "diff", "--name-status", "--relative", base_ref],
        )
    }
}

/// Run a command and return its non-empty stdout lines.
///
/// Under [`FailurePolicy::Lenient`] a spawn failure or non-zero exit yields an
/// empty list.
///
/// # Errors
///
/// Returns [`Error::Command`] on failure under [`FailurePolicy::Strict`].
pub fn run_lines(dir: &Path, policy: FailurePolicy, program: &str, args: &[&str]) -> Result<Vec<String>> {
    let command_line = format!("{program} {}", args.join(" "));
    debug!(dir = %dir.display(), command = %command_line, "Running command");

    let failure = match Command::new(program).args(args).current_dir(dir).output() {
        Ok(output) if output.status.success() => {
            let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect();
            debug!(command = %command_line, lines = lines.len(), "Command succeeded");
            return Ok(lines);
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            format!("{}: {}", output.status, stderr.trim())
        }
        Err(e) => e.to_string(),
    };

    match policy {
        FailurePolicy::Lenient => {
            warn!(command = %command_line, error = %failure, "Command failed, treating as empty");
            Ok(Vec::new())
        }
        FailurePolicy::Strict => Err(Error::Command {
            command: command_line,
            message: failure,
        }),
    }
}

/// In-memory toolchain with fixed answers.
///
/// Modules without configured imports import nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticToolchain {
    modules: Vec<ModulePath>,
    imports: HashMap<ModulePath, Vec<String>>,
    changes: Vec<String>,
}

impl StaticToolchain {
    /// Create a toolchain with no modules, imports or changes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the module list.
    #[must_use]
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Set the imports of one module.
    #[must_use]
    pub fn with_imports<I, S>(mut self, module: impl Into<String>, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports
            .insert(module.into(), imports.into_iter().map(Into::into).collect());
        self
    }

    /// Set the diff lines returned for any base revision.
    #[must_use]
    pub fn with_changes<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changes = lines.into_iter().map(Into::into).collect();
        self
    }
}

impl Toolchain for StaticToolchain {
    fn list_modules(&self) -> Result<Vec<ModulePath>> {
        Ok(self.modules.clone())
    }

    fn list_imports(&self, module: &str) -> Result<Vec<String>> {
        Ok(self.imports.get(module).cloned().unwrap_or_default())
    }

    fn list_changed_files(&self, _base_ref: &str) -> Result<Vec<String>> {
        Ok(self.changes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_toolchain_answers_from_memory() {
        let toolchain = StaticToolchain::new()
            .with_modules(["gfg/a", "gfg/b"])
            .with_imports("gfg/a", ["gfg/b", "fmt"])
            .with_changes(["M\ta/a.go"]);

        assert_eq!(toolchain.list_modules().unwrap(), vec!["gfg/a", "gfg/b"]);
        assert_eq!(toolchain.list_imports("gfg/a").unwrap(), vec!["gfg/b", "fmt"]);
        assert!(toolchain.list_imports("gfg/b").unwrap().is_empty());
        assert_eq!(toolchain.list_changed_files("HEAD^").unwrap(), vec!["M\ta/a.go"]);
    }

    #[test]
    fn missing_program_is_empty_when_lenient() {
        let dir = std::env::temp_dir();
        let lines = run_lines(&dir, FailurePolicy::Lenient, "ripple-no-such-program", &["x"])
            .expect("lenient policy should swallow the failure");

        assert!(lines.is_empty());
    }

    #[test]
    fn missing_program_is_error_when_strict() {
        let dir = std::env::temp_dir();
        let result = run_lines(&dir, FailurePolicy::Strict, "ripple-no-such-program", &["x"]);

        match result {
            Err(Error::Command { command, .. }) => assert_eq!(command, "ripple-no-such-program x"),
            other => panic!("expected command error, got {other:?}"),
        }
    }
}
