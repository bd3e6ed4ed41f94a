//! Error taxonomy for kitprobe
//!
//! The spec's error model (§7) is deliberately small: most failure modes
//! (`NotFound`, `PermissionDenied`, a probe that exits non-zero or prints
//! something unrecognizable) are absorbed locally and surface as `None` or
//! an empty `Vec`, never as an `Err`. Only the failures that a caller must
//! be told about — a malformed on-disk document, a vendor activation that
//! produced no usable environment, an unexpected I/O error a scan can't
//! just shrug off — become a `KitError`.

use thiserror::Error;

/// The closed error taxonomy for kitprobe operations.
#[derive(Error, Debug)]
pub enum KitError {
    /// IO errors that a probe or scan could not absorb locally.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The kits document is syntactically valid JSON but fails schema
    /// validation. Carries one `(dataPath, message)` pair per violation.
    #[error("kits document failed schema validation: {} violation(s)", .0.len())]
    SchemaInvalid(Vec<(String, String)>),

    /// The kits document could not be parsed as (relaxed) JSON at all.
    #[error("failed to parse kits document: {0}")]
    ParseError(String),

    /// Vendor SDK activation produced no environment, or a required
    /// variable (`INCLUDE`) was missing or empty.
    #[error("vendor SDK activation failed: {0}")]
    ActivationFailed(String),

    /// A probe invocation exited non-zero or produced unrecognizable
    /// output where the caller needed to know why (CLI surface only —
    /// the library itself folds this into `None`).
    #[error("compiler probe failed for {path}: {reason}")]
    ProbeFailed { path: String, reason: String },

    /// An operation that is meaningless on the current host, e.g. vendor
    /// SDK extraction invoked on a non-Windows host.
    #[error("unsupported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// Configuration could not be loaded or was structurally invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Catch-all for conditions the taxonomy above doesn't name.
    #[error("{0}")]
    Other(String),
}

/// Result type alias for kitprobe operations.
pub type Result<T> = std::result::Result<T, KitError>;

impl From<String> for KitError {
    fn from(s: String) -> Self {
        KitError::Other(s)
    }
}

impl From<&str> for KitError {
    fn from(s: &str) -> Self {
        KitError::Other(s.to_string())
    }
}
