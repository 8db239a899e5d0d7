//! Synthesis error taxonomy
//!
//! Every failure of verify, synthesize and build_credentials is returned as a
//! [`SynthesisError`]. Nothing is retried here; the driver decides.

use std::io;
use std::path::PathBuf;

use multus_conf::ConfError;

/// Stable, machine-readable failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required path is absent
    NotFound,
    /// The source directory holds no eligible delegate
    NoCandidate,
    /// Content present but structurally invalid
    Malformed,
    /// Pinned CNI version disagrees with the delegate
    VersionMismatch,
    /// Source present but unreadable
    ReadFailed,
    /// Destination unwritable or I/O failure during output
    WriteFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NoCandidate => "NO_CANDIDATE",
            ErrorKind::Malformed => "MALFORMED",
            ErrorKind::VersionMismatch => "VERSION_MISMATCH",
            ErrorKind::ReadFailed => "READ_FAILED",
            ErrorKind::WriteFailed => "WRITE_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors returned by the synthesis operations.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("{what} {path:?} does not exist")]
    NotFound { what: &'static str, path: PathBuf },

    #[error("cannot find valid master CNI config in {dir:?}")]
    NoCandidate { dir: PathBuf },

    #[error("master CNI config {source_name} is malformed: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("multus cniVersion ({configured}) does not match with master CNI cniVersion ({delegate})")]
    VersionMismatch { configured: String, delegate: String },

    #[error("cannot read {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path:?}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SynthesisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SynthesisError::NotFound { .. } => ErrorKind::NotFound,
            SynthesisError::NoCandidate { .. } => ErrorKind::NoCandidate,
            SynthesisError::Malformed { .. } => ErrorKind::Malformed,
            SynthesisError::VersionMismatch { .. } => ErrorKind::VersionMismatch,
            SynthesisError::ReadFailed { .. } => ErrorKind::ReadFailed,
            SynthesisError::WriteFailed { .. } => ErrorKind::WriteFailed,
        }
    }

    pub(crate) fn not_found(what: &'static str, path: impl Into<PathBuf>) -> Self {
        SynthesisError::NotFound {
            what,
            path: path.into(),
        }
    }

    pub(crate) fn read_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SynthesisError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SynthesisError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Attach the delegate's origin to a composition error.
    pub(crate) fn from_conf(source_name: &str, err: ConfError) -> Self {
        match err {
            ConfError::Malformed { reason } => SynthesisError::Malformed {
                source_name: source_name.to_string(),
                reason,
            },
            ConfError::VersionMismatch {
                configured,
                delegate,
            } => SynthesisError::VersionMismatch {
                configured,
                delegate,
            },
        }
    }
}
