//! Composition errors.

/// Errors raised while interpreting a delegate config.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfError {
    /// Content is not JSON, not an object, or lacks a required field.
    #[error("malformed delegate config: {reason}")]
    Malformed { reason: String },

    /// The delegate's `cniVersion` differs from the pinned version.
    #[error("multus cniVersion ({configured}) does not match delegate cniVersion ({delegate})")]
    VersionMismatch { configured: String, delegate: String },
}

impl ConfError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ConfError::Malformed {
            reason: reason.into(),
        }
    }
}
