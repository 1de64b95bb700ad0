//! Error types for draft operations.

use crate::Path;
use thiserror::Error;

/// Result type alias for draft operations.
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors raised by drafts, scopes and patch application.
#[derive(Debug, Error)]
pub enum DraftError {
    /// The draft's scope was finalized; the handle is stale.
    #[error("draft used after its scope was finalized")]
    Revoked,

    /// `finalize` was called on a scope that never created a draft.
    #[error("cannot finalize a scope without drafts")]
    EmptyScope,

    /// A draft from another scope was assigned into this one.
    #[error("draft at {path} belongs to a different scope")]
    ForeignDraft {
        /// Where the assignment was attempted.
        path: Path,
    },

    /// Assigning the draft would make it contain itself.
    #[error("assigning at {path} would create a cycle")]
    Cycle {
        /// Where the assignment was attempted.
        path: Path,
    },

    /// Path does not exist in the value.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The missing path.
        path: Path,
    },

    /// Array index is out of bounds.
    #[error("index {index} out of bounds (len: {len}) at path {path}")]
    IndexOutOfBounds {
        /// Path to the array.
        path: Path,
        /// Requested index.
        index: usize,
        /// Array length.
        len: usize,
    },

    /// The value at a path has the wrong shape for the operation.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Where the mismatch occurred.
        path: Path,
        /// What the operation needed.
        expected: &'static str,
        /// What was found.
        found: &'static str,
    },

    /// A frozen container was mutated in place.
    #[error("cannot mutate frozen {kind}")]
    Frozen {
        /// `"array"` or `"object"`.
        kind: &'static str,
    },

    /// A recipe both modified its draft and returned a replacement value.
    #[error("recipe returned a replacement value after modifying the draft")]
    ReplacedAndModified,

    /// Serialization between typed values and [`Value`](crate::Value).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DraftError {
    #[inline]
    pub fn path_not_found(path: Path) -> Self {
        DraftError::PathNotFound { path }
    }

    #[inline]
    pub fn index_out_of_bounds(path: Path, index: usize, len: usize) -> Self {
        DraftError::IndexOutOfBounds { path, index, len }
    }

    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        DraftError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    #[inline]
    pub fn foreign_draft(path: Path) -> Self {
        DraftError::ForeignDraft { path }
    }

    #[inline]
    pub fn cycle(path: Path) -> Self {
        DraftError::Cycle { path }
    }

    /// True for [`DraftError::Revoked`].
    pub fn is_revoked(&self) -> bool {
        matches!(self, DraftError::Revoked)
    }
}
