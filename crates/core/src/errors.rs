//! Error taxonomy shared by every shmkv crate.
//!
//! Every fallible operation in the workspace returns [`Result`]; the
//! variants below are the complete set of failure modes a caller can
//! observe. Nothing is signaled through shared mutable state, and no
//! operation retries on its own except the eviction loop, which retries
//! only the out-of-space case.

use std::path::PathBuf;

/// Result type alias for shmkv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes surfaced by the cache layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied an unusable key (empty byte string)
    #[error("cache keys must be non-empty byte strings")]
    InvalidKey,

    /// Operation attempted before a successful create/attach, or after teardown
    #[error("cache instance is not initialized")]
    NotInitialized,

    /// The OS-level shared segment could not be created, sized, or mapped
    #[error("shared segment unavailable at '{path}': {reason}")]
    SegmentUnavailable {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The attach-time scan that rebuilds the recency tracker failed.
    /// Fatal to initialization: an eviction policy with partial state
    /// picks the wrong victims under pressure.
    #[error("eviction warm-up scan failed: {reason}")]
    EvictionWarmupFailed { reason: String },

    /// Key absent from the table
    #[error("key not present in the table")]
    NotFound,

    /// A stored record failed its integrity verification. The corrupt
    /// record is left in place; removing it is the caller's decision.
    #[error("stored record failed verification: {detail}")]
    DataCorrupt { detail: String },

    /// The key already holds exactly this value. A benign no-op signal,
    /// not a failure: the write was skipped, the stored record is intact.
    #[error("key already holds this exact value")]
    SetSameValue,

    /// The table is out of space and eviction is disabled, was exhausted,
    /// or cannot free enough room for this value
    #[error("not enough space in the table")]
    NotEnoughSpace,

    /// The table rejected a write for a reason other than running out of slots
    #[error("table rejected the write: {reason}")]
    StoreFailed { reason: String },

    /// An underlying table primitive failed unexpectedly
    #[error("table {operation} failed: {reason}")]
    Table {
        operation: &'static str,
        reason: String,
    },
}

impl Error {
    /// Create a segment availability error without an io source
    #[must_use]
    pub fn segment_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::SegmentUnavailable {
            path: path.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a segment availability error wrapping an io failure
    #[must_use]
    pub fn segment_io(
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::SegmentUnavailable {
            path: path.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Create a warm-up failure
    #[must_use]
    pub fn warmup(reason: impl Into<String>) -> Self {
        Error::EvictionWarmupFailed {
            reason: reason.into(),
        }
    }

    /// Create a corruption error
    #[must_use]
    pub fn corrupt(detail: impl Into<String>) -> Self {
        Error::DataCorrupt {
            detail: detail.into(),
        }
    }

    /// Create a catch-all table primitive error
    #[must_use]
    pub fn table(operation: &'static str, reason: impl Into<String>) -> Self {
        Error::Table {
            operation,
            reason: reason.into(),
        }
    }

    /// True for signals a caller can safely treat as success
    /// (currently only the identical-value write short-circuit).
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Error::SetSameValue)
    }
}
