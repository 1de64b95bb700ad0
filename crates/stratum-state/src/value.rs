//! Persistent, structurally shared values.
//!
//! [`Value`] mirrors the JSON data model with two additions needed by the
//! draft engine: containers are reference counted (cloning shares the node,
//! and [`Value::is_same`] compares nodes by identity), and each container
//! carries a `frozen` flag set by [`freeze`].
//!
//! Numbers are `f64` and keep `NaN` and negative zero, since the identity
//! rule used by drafts distinguishes `0.0` from `-0.0` and treats `NaN` as
//! identical to itself.

use crate::{DraftError, DraftResult, Path, Seg};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Ordered object members.
pub type Map = IndexMap<String, Value>;

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A node in a persistent value tree.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Array(Array),
    Object(Object),
    /// An atomic value that is carried by reference and never drafted.
    Opaque(Opaque),
}

struct Node<T> {
    frozen: AtomicBool,
    items: T,
}

impl<T> Node<T> {
    fn new(items: T) -> Self {
        Self {
            frozen: AtomicBool::new(false),
            items,
        }
    }
}

// A cloned node is a fresh, writable copy.
impl<T: Clone> Clone for Node<T> {
    fn clone(&self) -> Self {
        Node::new(self.items.clone())
    }
}

/// Shared array node.
#[derive(Clone)]
pub struct Array(Arc<Node<Vec<Value>>>);

/// Shared object node with insertion-ordered keys.
#[derive(Clone)]
pub struct Object(Arc<Node<Map>>);

/// Shared handle to an arbitrary non-draftable value.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Array {
    pub fn new() -> Self {
        Self(Arc::new(Node::new(Vec::new())))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.items.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.items.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Value] {
        &self.0.items
    }

    /// True when both handles point at the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.0.frozen.load(Ordering::Acquire)
    }

    /// Append an element, copying the node first if it is shared.
    pub fn push(&mut self, value: Value) -> DraftResult<()> {
        self.items_mut()?.push(value);
        Ok(())
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: Value) -> DraftResult<()> {
        let len = self.len();
        match self.items_mut()?.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DraftError::index_out_of_bounds(Path::root(), index, len)),
        }
    }

    /// Remove and return the element at `index`, shifting later elements.
    pub fn remove(&mut self, index: usize) -> DraftResult<Value> {
        let len = self.len();
        if index >= len {
            return Err(DraftError::index_out_of_bounds(Path::root(), index, len));
        }
        Ok(self.items_mut()?.remove(index))
    }

    fn items_mut(&mut self) -> DraftResult<&mut Vec<Value>> {
        if self.is_frozen() {
            return Err(DraftError::Frozen { kind: "array" });
        }
        Ok(&mut Arc::make_mut(&mut self.0).items)
    }

    fn mark_frozen(&self) -> bool {
        !self.0.frozen.swap(true, Ordering::AcqRel)
    }
}

impl Object {
    pub fn new() -> Self {
        Self(Arc::new(Node::new(Map::new())))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.items.is_empty()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.items.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.items.contains_key(key)
    }

    #[inline]
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.items.keys()
    }

    #[inline]
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.items.iter()
    }

    #[inline]
    pub fn as_map(&self) -> &Map {
        &self.0.items
    }

    /// True when both handles point at the same node.
    #[inline]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.0.frozen.load(Ordering::Acquire)
    }

    /// Insert a member, copying the node first if it is shared.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> DraftResult<Option<Value>> {
        Ok(self.items_mut()?.insert(key.into(), value))
    }

    /// Remove a member, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> DraftResult<Option<Value>> {
        Ok(self.items_mut()?.shift_remove(key))
    }

    fn items_mut(&mut self) -> DraftResult<&mut Map> {
        if self.is_frozen() {
            return Err(DraftError::Frozen { kind: "object" });
        }
        Ok(&mut Arc::make_mut(&mut self.0).items)
    }

    fn mark_frozen(&self) -> bool {
        !self.0.frozen.swap(true, Ordering::AcqRel)
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Value {
    /// Name of the value's kind, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Identity comparison used by drafts.
    ///
    /// Scalars compare by value except that `NaN` is identical to `NaN` and
    /// `0.0` is not identical to `-0.0`. Containers and opaque values compare
    /// by node identity.
    pub fn is_same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() || b.is_nan() {
                    a.is_nan() && b.is_nan()
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// True for arrays and objects, the only values that can be drafted.
    #[inline]
    pub fn is_draftable(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Containers report their flag; every other value is inherently frozen.
    pub fn is_frozen(&self) -> bool {
        match self {
            Value::Array(a) => a.is_frozen(),
            Value::Object(o) => o.is_frozen(),
            _ => true,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }

    /// Look up one segment: a key on objects, an index on arrays.
    pub fn get(&self, seg: &Seg) -> Option<&Value> {
        match (self, seg) {
            (Value::Object(o), Seg::Key(k)) => o.get(k),
            (Value::Array(a), Seg::Index(i)) => a.get(*i),
            _ => None,
        }
    }

    /// Follow a whole path.
    pub fn pointer(&self, path: &Path) -> Option<&Value> {
        path.iter().try_fold(self, |current, seg| current.get(seg))
    }

    /// Deep-clone into a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }
}

/// Free-function form of [`Value::is_same`].
#[inline]
pub fn same_value(a: &Value, b: &Value) -> bool {
    a.is_same(b)
}

/// True for values that drafts can be created from.
#[inline]
pub fn is_draftable(value: &Value) -> bool {
    value.is_draftable()
}

/// Mark a container immutable and return it.
///
/// Shallow freezing flags only the top node; deep freezing also walks the
/// children. Already frozen containers are skipped along with everything
/// beneath them, and non-containers are returned as they are.
pub fn freeze(value: Value, deep: bool) -> Value {
    freeze_in_place(&value, deep);
    value
}

pub(crate) fn freeze_in_place(value: &Value, deep: bool) {
    match value {
        Value::Array(a) => {
            if a.mark_frozen() && deep {
                a.iter().for_each(|child| freeze_in_place(child, true));
            }
        }
        Value::Object(o) => {
            if o.mark_frozen() && deep {
                o.iter().for_each(|(_, child)| freeze_in_place(child, true));
            }
        }
        _ => {}
    }
}

// Structural equality. Containers with identical nodes short-circuit.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b) || a.as_slice() == b.as_slice(),
            (Value::Object(a), Value::Object(b)) => {
                a.ptr_eq(b)
                    || (a.len() == b.len()
                        && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v == w)))
            }
            (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq<serde_json::Value> for Value {
    fn eq(&self, other: &serde_json::Value) -> bool {
        *self == Value::from(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(a) => a.fmt(f),
            Value::Object(o) => o.fmt(f),
            Value::Opaque(o) => o.fmt(f),
        }
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null | Value::Opaque(_) => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            Value::Number(n) if n.trunc() == *n && n.abs() <= MAX_SAFE_INTEGER => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(a) => serializer.collect_seq(a.iter()),
            Value::Object(o) => serializer.collect_map(o.iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from(&value)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(Arc::from(s.as_str())),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(members) => Value::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null | Value::Opaque(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if n.is_finite() && n.trunc() == *n && n.abs() <= MAX_SAFE_INTEGER => {
                serde_json::Value::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Array(a) => serde_json::Value::Array(a.iter().map(serde_json::Value::from).collect()),
            Value::Object(o) => serde_json::Value::Object(
                o.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        serde_json::Value::from(&value)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

from_number!(f64, f32, i64, i32, i16, i8, u64, u32, u16, u8, usize, isize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::String(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Value::Opaque(o)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Array::from(items))
    }
}

impl From<Map> for Value {
    fn from(members: Map) -> Self {
        Value::Object(Object::from(members))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self(Arc::new(Node::new(items)))
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl From<Map> for Object {
    fn from(members: Map) -> Self {
        Self(Arc::new(Node::new(members)))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Object::from(iter.into_iter().map(|(k, v)| (k.into(), v)).collect::<Map>())
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}
