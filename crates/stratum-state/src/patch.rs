//! Ordered groups of operations.

use crate::Op;
use serde::{Deserialize, Serialize};

/// A sequence of [`Op`]s applied in order.
///
/// Drafts record one forward patch (base to result) and one inverse patch
/// (result back to base) when finalized with patches.
///
/// ```
/// use stratum_state::{apply_patch, path, Op, Patch, Value};
/// use serde_json::json;
///
/// let patch = Patch::new()
///     .with_op(Op::set(path!("count"), 10))
///     .with_op(Op::append(path!("log"), "set"));
///
/// let base = Value::from(json!({"count": 0}));
/// let next = apply_patch(&base, &patch).unwrap();
/// assert_eq!(next, json!({"count": 10, "log": ["set"]}));
/// assert_eq!(base, json!({"count": 0}));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<Op>,
}

impl Patch {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_ops(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    /// Append an operation (builder).
    #[inline]
    pub fn with_op(mut self, op: Op) -> Self {
        self.ops.push(op);
        self
    }

    #[inline]
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    #[inline]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    #[inline]
    pub fn into_ops(self) -> Vec<Op> {
        self.ops
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Op> {
        self.ops.iter()
    }
}

impl FromIterator<Op> for Patch {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl Extend<Op> for Patch {
    fn extend<I: IntoIterator<Item = Op>>(&mut self, iter: I) {
        self.ops.extend(iter);
    }
}

impl IntoIterator for Patch {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Patch {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
