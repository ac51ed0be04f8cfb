//! Error types for ripple operations.
//!
//! Errors fall into the categories the pipeline treats differently:
//!
//! - **Configuration**: missing project root, missing `go.mod`, missing
//!   environment variables. These abort before any work is done.
//! - **Data**: an unrecognized change-status letter from the diff. Never
//!   guessed or defaulted.
//! - **Collaborator**: an external command failed. Only surfaced under
//!   [`FailurePolicy::Strict`](crate::FailurePolicy::Strict); the lenient
//!   policy turns these into empty results.
//! - **Infrastructure**: I/O and JSON failures while persisting the cache.
//!
//! Cache *read* failures are not errors at all: they trigger a full rebuild.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ripple operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for ripple operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the dependency graph failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required environment variable is unset or empty
    #[error("environment variable {name} is not set")]
    MissingEnv {
        /// Name of the variable
        name: &'static str,
    },

    /// No project root could be located
    #[error("project root not found: {0}")]
    ProjectRootNotFound(String),

    /// The project root has no readable module declaration file
    #[error("module declaration file not found at {}", path.display())]
    ModuleFileNotFound {
        /// Path that was expected to hold `go.mod`
        path: PathBuf,
    },

    /// The diff produced a status letter outside `M`, `A`, `D`, `R`
    #[error("unrecognized change status in diff line {line:?}")]
    UnknownChangeStatus {
        /// The raw diff line
        line: String,
    },

    /// An external command could not be spawned or exited unsuccessfully
    #[error("command `{command}` failed: {message}")]
    Command {
        /// The command line that was run
        command: String,
        /// Exit status or spawn error, plus trimmed stderr
        message: String,
    },
}

impl Error {
    /// Returns `true` if this error means the run must stop before doing any work.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingEnv { .. }
                | Self::ProjectRootNotFound(_)
                | Self::ModuleFileNotFound { .. }
        )
    }
}
