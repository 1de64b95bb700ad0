//! Single changes recorded by a draft or replayed onto a value.

use crate::{Path, Value};
use serde::{Deserialize, Serialize};

/// One atomic change at a path.
///
/// For [`Op::Set`] and [`Op::Delete`] the path names the member being
/// changed; for [`Op::Append`] and [`Op::Insert`] it names the array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    /// Assign a member. Missing parent objects are created; an array index
    /// equal to the length appends.
    Set {
        /// Target member.
        path: Path,
        /// New value.
        value: Value,
    },

    /// Remove a member. Array elements are removed and later ones shift
    /// down. Missing paths are ignored.
    Delete {
        /// Target member.
        path: Path,
    },

    /// Push onto the array at the path, creating it if missing.
    Append {
        /// Target array.
        path: Path,
        /// Element to push.
        value: Value,
    },

    /// Insert into the array at the path.
    Insert {
        /// Target array.
        path: Path,
        /// Position of the new element.
        index: usize,
        /// Element to insert.
        value: Value,
    },
}

impl Op {
    #[inline]
    pub fn set(path: Path, value: impl Into<Value>) -> Self {
        Op::Set {
            path,
            value: value.into(),
        }
    }

    #[inline]
    pub fn delete(path: Path) -> Self {
        Op::Delete { path }
    }

    #[inline]
    pub fn append(path: Path, value: impl Into<Value>) -> Self {
        Op::Append {
            path,
            value: value.into(),
        }
    }

    #[inline]
    pub fn insert(path: Path, index: usize, value: impl Into<Value>) -> Self {
        Op::Insert {
            path,
            index,
            value: value.into(),
        }
    }

    /// The path this operation targets.
    pub fn path(&self) -> &Path {
        match self {
            Op::Set { path, .. }
            | Op::Delete { path }
            | Op::Append { path, .. }
            | Op::Insert { path, .. } => path,
        }
    }

    /// True for `Set`/`Delete` at the root, which replace the whole value.
    pub(crate) fn replaces_root(&self) -> bool {
        matches!(self, Op::Set { path, .. } | Op::Delete { path } if path.is_empty())
    }
}
