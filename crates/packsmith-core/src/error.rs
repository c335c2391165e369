//! Error types for manifest, fetch, extraction and sync operations.

use std::path::PathBuf;

/// Errors from packsmith operations.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// Filesystem operation failed on a known path.
    #[error("{action} {}", path.display())]
    Io {
        /// What was being attempted (e.g. "failed to remove").
        action: &'static str,
        /// The path involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Manifest read/parse/write error.
    #[error("manifest error at {}: {message}", path.display())]
    Manifest {
        /// Path to the manifest file.
        path: PathBuf,
        /// Error description.
        message: String,
    },

    /// Group selector was neither `start` nor `opt`.
    #[error("invalid group '{0}': expected 'start' or 'opt'")]
    InvalidGroup(String),

    /// A source URL could not be turned into a plugin declaration.
    #[error("invalid source URL '{url}': {reason}")]
    InvalidSource {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// HTTP transport failure.
    #[error("download of {url} failed")]
    Http {
        /// The URL being fetched.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("download of {url} returned HTTP {status}")]
    HttpStatus {
        /// The URL being fetched.
        url: String,
        /// Status code returned.
        status: u16,
    },

    /// The archive could not be read.
    #[error("failed to read archive {}", path.display())]
    Archive {
        /// Archive file path.
        path: PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A declared repository does not yield a usable directory name.
    #[error("invalid repository '{repository}': {reason}")]
    InvalidRepository {
        /// The declared repository string.
        repository: String,
        /// Why its directory name was rejected.
        reason: &'static str,
    },

    /// An archive entry would be written outside the destination.
    #[error("path traversal detected in archive entry: {path}")]
    PathTraversal {
        /// The offending entry name.
        path: String,
    },

    /// An archive entry is neither a regular file nor a directory.
    #[error("unsafe archive entry type '{entry_type}' at {path}")]
    UnsafeEntryType {
        /// The rejected type, e.g. `symlink`.
        entry_type: &'static str,
        /// The entry name.
        path: String,
    },

    /// The host editor could not report its package path.
    #[error("failed to query package path from '{editor}': {message}")]
    EditorQuery {
        /// Editor binary that was invoked.
        editor: String,
        /// Failure reason.
        message: String,
    },
}

impl PackError {
    /// Wrap an I/O error with the path it concerns.
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Result type for packsmith operations.
pub type PackResult<T> = Result<T, PackError>;
