//! Locations inside a value tree.
//!
//! A [`Path`] is the ordered list of object keys and array indices leading from
//! a root value to a nested position. Both the draft engine (patches, error
//! reports) and the validation engine (issue paths) address values this way.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a [`Path`].
///
/// Serialized untagged, so a path reads as `["users", 0, "name"]`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

impl Seg {
    /// Key segment.
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    /// Index segment.
    #[inline]
    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    /// The key, if this addresses an object member.
    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    /// The index, if this addresses an array element.
    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }

    /// Kind name used in error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Seg::Key(_) => "key",
            Seg::Index(_) => "index",
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => write!(f, ".{k}"),
            Seg::Index(i) => write!(f, "[{i}]"),
        }
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<&String> for Seg {
    fn from(s: &String) -> Self {
        Seg::Key(s.clone())
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

impl From<&Seg> for Seg {
    fn from(seg: &Seg) -> Self {
        seg.clone()
    }
}

/// A location inside a value tree, root first.
///
/// Extending a path never mutates the receiver's observers: builder methods
/// consume `self`, and [`Path::child`] clones. Sibling branches of a
/// recursive walk therefore never see each other's segments.
///
/// ```
/// use stratum_state::{path, Path, Seg};
///
/// let p = Path::root().key("users").index(0).key("name");
/// assert_eq!(p, path!("users", 0, "name"));
/// assert_eq!(p.to_string(), "$.users[0].name");
/// assert_eq!(p.last(), Some(&Seg::key("name")));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Seg>);

impl Path {
    /// The empty path.
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from segments.
    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key (builder).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index (builder).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// A new path one segment deeper than `self`.
    #[inline]
    pub fn child(&self, seg: impl Into<Seg>) -> Path {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(seg.into());
        Path(segments)
    }

    /// Concatenate two paths.
    pub fn join(&self, other: &Path) -> Path {
        let mut result = self.clone();
        result.0.extend(other.0.iter().cloned());
        result
    }

    /// Push a segment in place.
    #[inline]
    pub fn push(&mut self, seg: impl Into<Seg>) {
        self.0.push(seg.into());
    }

    /// Remove and return the last segment.
    #[inline]
    pub fn pop(&mut self) -> Option<Seg> {
        self.0.pop()
    }

    /// The path without its last segment, `None` at root.
    pub fn parent(&self) -> Option<Path> {
        let (_, init) = self.0.split_last()?;
        Some(Path(init.to_vec()))
    }

    /// True when `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    #[inline]
    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    #[inline]
    pub fn first(&self) -> Option<&Seg> {
        self.0.first()
    }

    #[inline]
    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Seg> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        self.0.iter().try_for_each(|seg| write!(f, "{seg}"))
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl IntoIterator for Path {
    type Item = Seg;
    type IntoIter = std::vec::IntoIter<Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::ops::Index<usize> for Path {
    type Output = Seg;

    fn index(&self, index: usize) -> &Seg {
        &self.0[index]
    }
}

/// Build a [`Path`]: string expressions become keys, `usize` expressions
/// become indices.
///
/// ```
/// use stratum_state::path;
///
/// let p = path!("items", 2, "label");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::Path::root()
    };
    ($($seg:expr),+ $(,)?) => {{
        let mut p = $crate::Path::root();
        $( p.push($crate::Seg::from($seg)); )+
        p
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_does_not_touch_parent() {
        let parent = path!("a");
        let left = parent.child(0usize);
        let right = parent.child("b");
        assert_eq!(parent.len(), 1);
        assert_eq!(left, path!("a", 0));
        assert_eq!(right, path!("a", "b"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Path::root().to_string(), "$");
        assert_eq!(path!("a", 0, "b").to_string(), "$.a[0].b");
    }

    #[test]
    fn test_prefix_and_parent() {
        let p = path!("x", "y", 3);
        assert!(path!("x").is_prefix_of(&p));
        assert!(p.is_prefix_of(&p));
        assert!(!path!("y").is_prefix_of(&p));
        assert_eq!(p.parent(), Some(path!("x", "y")));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_serde_shape() {
        let p = path!("a", 0, "b");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json, serde_json::json!(["a", 0, "b"]));
        let back: Path = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }
}
