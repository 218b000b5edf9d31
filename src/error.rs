//! Error taxonomy shared by every core component.
//!
//! Core operations (tables, the file codec, partition planning, datasets)
//! return [`Result<T>`] with a typed [`Error`]. The text and Arrow interop
//! adapters under [`crate::io`] return `anyhow::Result` and attach context;
//! an [`Error`] converts into `anyhow::Error` through `?`.

use crate::types::DataType;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A column name was not found in the schema it was looked up in.
    #[error("unknown column: {name}")]
    UnknownColumn { name: String },

    /// Two tables (or two files of one dataset) do not share a schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A value of the wrong type was appended to a typed column.
    #[error("type mismatch in column {column}: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: String,
    },

    /// Table construction invariants were violated.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// A file header or payload is inconsistent with itself.
    #[error("corrupt file{}: {reason}", display_path(.path))]
    CorruptFile {
        path: Option<PathBuf>,
        reason: String,
    },

    /// A dataset directory tree does not form a consistent partitioning.
    #[error("invalid dataset layout at {}: {reason}", .path.display())]
    InvalidLayout { path: PathBuf, reason: String },

    /// The storage medium failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Several independent units of work failed.
    #[error("{} operations failed; first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Multiple(Vec<Error>),
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

impl Error {
    pub(crate) fn unknown_column(name: impl Into<String>) -> Self {
        Self::UnknownColumn { name: name.into() }
    }

    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptFile {
            path: None,
            reason: reason.into(),
        }
    }

    pub(crate) fn layout(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidLayout {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach a file path to path-less corruption and I/O errors raised while
    /// decoding an in-memory stream.
    #[must_use]
    pub(crate) fn at_path(self, at: &Path) -> Self {
        match self {
            Self::CorruptFile { path: None, reason } => Self::CorruptFile {
                path: Some(at.to_path_buf()),
                reason,
            },
            Self::Io { path, source } if path.as_os_str().is_empty() => Self::Io {
                path: at.to_path_buf(),
                source,
            },
            other => other,
        }
    }

    /// Fold a batch of failures into one error; a single failure is returned as-is.
    pub(crate) fn aggregate(mut errors: Vec<Error>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

/// Extension for attaching a path to raw `std::io` results.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|e| Error::io(path, e))
    }
}
