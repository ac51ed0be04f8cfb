//! Classification of `git diff --name-status` lines.
//!
//! Each line has the shape `<status>[score]<TAB><path>[<TAB><new path>]`:
//!
//! ```text
//! M       cart/cart.go
//! A       payment/stripe.go
//! D       legacy/old.go
//! R073    inventory/stock.go      warehouse/stock.go
//! ```
//!
//! The classifier maps the status letter and reduces the final path field to
//! the module (package directory) that owns the file.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{ModulePath, Namespace};

/// How a file changed relative to the base revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// `A`: the file is new
    Added,
    /// `M`: the file was edited
    Modified,
    /// `D`: the file was removed
    Deleted,
    /// `R<score>`: the file was moved, possibly with edits
    Renamed,
}

impl ChangeStatus {
    /// Map a status token such as `M` or `R073` to a status.
    ///
    /// Returns `None` for anything that does not start with a known letter.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.chars().next()? {
            'M' => Some(Self::Modified),
            'A' => Some(Self::Added),
            'D' => Some(Self::Deleted),
            'R' => Some(Self::Renamed),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Modified => write!(f, "modified"),
            Self::Deleted => write!(f, "deleted"),
            Self::Renamed => write!(f, "renamed"),
        }
    }
}

/// A changed module, derived from one diff line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// How the file changed
    pub status: ChangeStatus,
    /// Fully-qualified path of the module containing the file
    pub module: ModulePath,
}

/// Classify one raw diff line into a [`ChangeRecord`].
///
/// Fields are separated by tabs, as git prints them; lines without a tab fall
/// back to splitting on any whitespace. Only the last path field is used, so
/// a rename resolves to its destination.
///
/// # Errors
///
/// Returns [`Error::UnknownChangeStatus`] if the line does not start with
/// `M`, `A`, `D` or `R`, or carries no path field.
pub fn classify(namespace: &Namespace, line: &str) -> Result<ChangeRecord> {
    let unknown = || Error::UnknownChangeStatus {
        line: line.to_string(),
    };

    let mut fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split_whitespace().collect()
    };
    fields.retain(|f| !f.trim().is_empty());

    let (token, paths) = fields.split_first().ok_or_else(unknown)?;
    let status = ChangeStatus::from_token(token.trim()).ok_or_else(unknown)?;
    let path = paths.last().ok_or_else(unknown)?;

    let dir = path.rsplit_once('/').map_or("", |(dir, _file)| dir).trim();

    Ok(ChangeRecord {
        status,
        module: namespace.qualify(dir),
    })
}
