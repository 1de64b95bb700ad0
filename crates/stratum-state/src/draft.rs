//! Draft handles: the interception layer over a drafted container.
//!
//! Every read and write on a drafted array or object goes through a
//! [`Draft`] method. Reads lazily draft nested containers; writes copy the
//! container on first change and mark it and its ancestors modified.

use crate::scope::{contains_draft, current_of, mark_changed, path_of, DraftId, DraftState, Slot};
use crate::{Array, DraftError, DraftResult, Map, Object, Opaque, Path, Scope, Seg, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A mutable view of a container inside a [`Scope`].
///
/// Handles are cheap to copy. They borrow their scope, so they cannot
/// outlive it; once the scope is finalized every method returns
/// [`DraftError::Revoked`].
#[derive(Clone, Copy)]
pub struct Draft<'s> {
    scope: &'s Scope,
    id: DraftId,
}

/// The result of reading a member through a draft.
#[derive(Clone, Debug)]
pub enum Field<'s> {
    /// A drafted container.
    Draft(Draft<'s>),
    /// A plain value, returned as stored.
    Value(Value),
}

impl<'s> Field<'s> {
    #[inline]
    pub fn is_draft(&self) -> bool {
        matches!(self, Field::Draft(_))
    }

    pub fn as_draft(&self) -> Option<&Draft<'s>> {
        match self {
            Field::Draft(d) => Some(d),
            Field::Value(_) => None,
        }
    }

    pub fn into_draft(self) -> Option<Draft<'s>> {
        match self {
            Field::Draft(d) => Some(d),
            Field::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Field::Draft(_) => None,
            Field::Value(v) => Some(v),
        }
    }

    /// A plain snapshot: drafts are resolved with [`Draft::current`].
    pub fn current(&self) -> DraftResult<Value> {
        match self {
            Field::Draft(d) => d.current(),
            Field::Value(v) => Ok(v.clone()),
        }
    }
}

/// Snapshot a field without finalizing anything.
///
/// The returned value is detached from the scope and stays valid after it
/// is finalized.
pub fn current(field: &Field<'_>) -> DraftResult<Value> {
    field.current()
}

/// The value a draft was created from.
pub fn original(draft: &Draft<'_>) -> DraftResult<Value> {
    draft.original()
}

/// Conversion into something a draft member can be set to.
pub trait IntoField<'s> {
    fn into_field(self) -> Field<'s>;
}

impl<'s> IntoField<'s> for Field<'s> {
    fn into_field(self) -> Field<'s> {
        self
    }
}

impl<'s> IntoField<'s> for Draft<'s> {
    fn into_field(self) -> Field<'s> {
        Field::Draft(self)
    }
}

impl<'s> IntoField<'s> for &Draft<'s> {
    fn into_field(self) -> Field<'s> {
        Field::Draft(*self)
    }
}

macro_rules! into_field_via_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'s> IntoField<'s> for $ty {
                fn into_field(self) -> Field<'s> {
                    Field::Value(Value::from(self))
                }
            }
        )*
    };
}

into_field_via_value!(
    Value, &Value, serde_json::Value, &serde_json::Value, bool, f64, f32, i64, i32, u64, u32,
    usize, &str, String, Array, Object, Opaque, Map, Vec<Value>,
);

impl<'s> Draft<'s> {
    pub(crate) fn new(scope: &'s Scope, id: DraftId) -> Self {
        Self { scope, id }
    }

    /// True when both handles refer to the same draft.
    pub fn same(&self, other: &Draft<'_>) -> bool {
        std::ptr::eq(self.scope, other.scope) && self.id == other.id
    }

    /// Read a member.
    ///
    /// A container that is still the base's own member is drafted on first
    /// read and the draft is stored in the copy, so later reads return the
    /// same draft. Anything else, including containers assigned during this
    /// call, is returned as stored.
    pub fn get(&self, key: impl Into<Seg>) -> DraftResult<Option<Field<'s>>> {
        let seg = key.into();
        self.scope.ensure_live()?;
        let mut states = self.scope.states.borrow_mut();
        self.check_key(&states, &seg)?;

        let state = &states[self.id];
        let value = match state.peek(&seg) {
            None => return Ok(None),
            Some(Slot::Draft(child)) => return Ok(Some(Field::Draft(Draft::new(self.scope, child)))),
            Some(Slot::Value(v)) => v,
        };
        if state.finalized || !value.is_draftable() {
            return Ok(Some(Field::Value(value)));
        }
        if !state.base.get(&seg).is_some_and(|member| member.is_same(&value)) {
            return Ok(Some(Field::Value(value)));
        }

        let child = self.adopt(&mut states, value, seg);
        Ok(Some(Field::Draft(Draft::new(self.scope, child))))
    }

    /// Draft the container stored under `key`.
    ///
    /// Unlike [`Draft::get`], containers assigned during this call are
    /// drafted too, so a freshly assigned object can be edited in place.
    pub fn draft(&self, key: impl Into<Seg>) -> DraftResult<Draft<'s>> {
        let seg = key.into();
        match self.get(seg.clone())? {
            Some(Field::Draft(d)) => Ok(d),
            Some(Field::Value(value)) if value.is_draftable() => {
                let mut states = self.scope.states.borrow_mut();
                let child = self.adopt(&mut states, value, seg);
                Ok(Draft::new(self.scope, child))
            }
            Some(Field::Value(value)) => {
                let path = self.path().child(seg);
                Err(DraftError::type_mismatch(path, "array or object", value.type_name()))
            }
            None => Err(DraftError::path_not_found(self.path().child(seg))),
        }
    }

    /// Assign a member.
    ///
    /// Assignments that leave the member identical to its current value
    /// (same node, same scalar, `NaN` for `NaN`) do not modify the draft;
    /// `0.0` over `-0.0` does. Arrays accept an index one past the end,
    /// which appends.
    pub fn set(&self, key: impl Into<Seg>, value: impl IntoField<'s>) -> DraftResult<()> {
        let seg = key.into();
        let field = value.into_field();
        self.scope.ensure_live()?;
        let mut states = self.scope.states.borrow_mut();
        self.check_writable_key(&states, &seg)?;
        let incoming = self.slot_for(&states, &seg, field)?;
        let me = self.id;

        if !states[me].modified {
            let current = states[me].peek(&seg);
            if self.restores_base(&states, current.as_ref(), &incoming) {
                states[me].prepare_copy().put(&seg, incoming);
                states[me].assigned.insert(seg, false);
                return Ok(());
            }
            if current.is_some_and(|c| c.is_same(&incoming)) {
                return Ok(());
            }
            mark_changed(&mut states, me);
        }

        let state = &mut states[me];
        let copy = state.prepare_copy();
        // Numbers are written even when equal, so `-0.0` replaces `0.0` here.
        let is_number = matches!(incoming, Slot::Value(Value::Number(_)));
        if !is_number && copy.get(&seg).is_some_and(|c| c.is_same(&incoming)) {
            return Ok(());
        }
        copy.put(&seg, incoming);
        state.assigned.insert(seg, true);
        Ok(())
    }

    /// Remove a member.
    ///
    /// On objects, deleting a base key modifies the draft; deleting a key
    /// added during this call only forgets it. On arrays the element is
    /// replaced by `null` and the length is kept; use [`Draft::remove`] to
    /// shift elements.
    pub fn delete(&self, key: impl Into<Seg>) -> DraftResult<()> {
        let seg = key.into();
        self.scope.ensure_live()?;
        let mut states = self.scope.states.borrow_mut();
        self.check_key(&states, &seg)?;
        let me = self.id;

        if states[me].is_array() {
            let exists = seg.as_index().is_some_and(|i| i < states[me].latest_len());
            drop(states);
            return if exists { self.set(seg, Value::Null) } else { Ok(()) };
        }

        if states[me].base.get(&seg).is_some() {
            states[me].assigned.insert(seg.clone(), false);
            mark_changed(&mut states, me);
        } else {
            states[me].assigned.shift_remove(&seg);
        }
        if let (Some(crate::scope::Shallow::Object(members)), Some(key)) =
            (states[me].copy.as_mut(), seg.as_key())
        {
            members.shift_remove(key);
        }
        Ok(())
    }

    /// Whether a member exists in the latest view.
    pub fn has(&self, key: impl Into<Seg>) -> DraftResult<bool> {
        let seg = key.into();
        self.scope.ensure_live()?;
        let states = self.scope.states.borrow();
        Ok(states[self.id].peek(&seg).is_some())
    }

    /// Member keys (objects) or indices (arrays) of the latest view.
    pub fn keys(&self) -> DraftResult<Vec<Seg>> {
        self.scope.ensure_live()?;
        let states = self.scope.states.borrow();
        let state = &states[self.id];
        Ok(match (&state.copy, &state.base) {
            (Some(crate::scope::Shallow::Object(members)), _) => {
                members.keys().map(|k| Seg::key(k.as_str())).collect()
            }
            (None, Value::Object(o)) => o.keys().map(|k| Seg::key(k.as_str())).collect(),
            _ => (0..state.latest_len()).map(Seg::Index).collect(),
        })
    }

    pub fn len(&self) -> DraftResult<usize> {
        self.scope.ensure_live()?;
        Ok(self.scope.states.borrow()[self.id].latest_len())
    }

    pub fn is_empty(&self) -> DraftResult<bool> {
        self.len().map(|n| n == 0)
    }

    pub fn is_array(&self) -> DraftResult<bool> {
        self.scope.ensure_live()?;
        Ok(self.scope.states.borrow()[self.id].is_array())
    }

    /// Whether this draft diverged from its base.
    pub fn is_modified(&self) -> DraftResult<bool> {
        self.scope.ensure_live()?;
        Ok(self.scope.states.borrow()[self.id].modified)
    }

    /// Where this draft was created, relative to the scope's root.
    pub fn path(&self) -> Path {
        path_of(&self.scope.states.borrow(), self.id)
    }

    /// The value this draft was created from.
    pub fn original(&self) -> DraftResult<Value> {
        self.scope.ensure_live()?;
        Ok(self.scope.states.borrow()[self.id].base.clone())
    }

    /// A detached snapshot of the draft's latest contents.
    ///
    /// Unmodified drafts return their base; nothing is frozen.
    pub fn current(&self) -> DraftResult<Value> {
        self.scope.ensure_live()?;
        Ok(current_of(&self.scope.states.borrow(), self.id))
    }

    /// Append to an array draft.
    pub fn push(&self, value: impl IntoField<'s>) -> DraftResult<()> {
        let len = self.require_array()?;
        self.set(len, value)
    }

    /// Remove the last element of an array draft.
    pub fn pop(&self) -> DraftResult<Option<Field<'s>>> {
        let len = self.require_array()?;
        if len == 0 {
            return Ok(None);
        }
        self.remove(len - 1).map(Some)
    }

    /// Insert into an array draft, shifting later elements.
    pub fn insert(&self, index: usize, value: impl IntoField<'s>) -> DraftResult<()> {
        let len = self.require_array()?;
        if index > len {
            return Err(DraftError::index_out_of_bounds(self.path(), index, len));
        }
        let field = value.into_field();
        let mut states = self.scope.states.borrow_mut();
        let slot = self.slot_for(&states, &Seg::Index(index), field)?;
        mark_changed(&mut states, self.id);
        if let crate::scope::Shallow::Array(items) = states[self.id].prepare_copy() {
            items.insert(index, slot);
        }
        Ok(())
    }

    /// Remove an element of an array draft, shifting later elements.
    pub fn remove(&self, index: usize) -> DraftResult<Field<'s>> {
        let len = self.require_array()?;
        if index >= len {
            return Err(DraftError::index_out_of_bounds(self.path(), index, len));
        }
        let mut states = self.scope.states.borrow_mut();
        mark_changed(&mut states, self.id);
        let removed = match states[self.id].prepare_copy() {
            crate::scope::Shallow::Array(items) => items.remove(index),
            crate::scope::Shallow::Object(_) => Slot::Value(Value::Null),
        };
        Ok(match removed {
            Slot::Draft(child) => Field::Draft(Draft::new(self.scope, child)),
            Slot::Value(v) => Field::Value(v),
        })
    }

    /// Shorten an array draft; longer lengths are a no-op.
    pub fn truncate(&self, len: usize) -> DraftResult<()> {
        if len >= self.require_array()? {
            return Ok(());
        }
        let mut states = self.scope.states.borrow_mut();
        mark_changed(&mut states, self.id);
        if let crate::scope::Shallow::Array(items) = states[self.id].prepare_copy() {
            items.truncate(len);
        }
        Ok(())
    }

    /// A snapshot of the member under `key`, if any.
    pub fn get_value(&self, key: impl Into<Seg>) -> DraftResult<Option<Value>> {
        self.get(key)?.map(|field| field.current()).transpose()
    }

    /// Deserialize the member under `key`.
    pub fn read<T: DeserializeOwned>(&self, key: impl Into<Seg>) -> DraftResult<T> {
        let seg = key.into();
        match self.get_value(seg.clone())? {
            Some(value) => crate::from_value(&value),
            None => Err(DraftError::path_not_found(self.path().child(seg))),
        }
    }

    /// Deserialize the member under `key`; missing and `null` read as `None`.
    pub fn read_opt<T: DeserializeOwned>(&self, key: impl Into<Seg>) -> DraftResult<Option<T>> {
        match self.get_value(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => crate::from_value(&value).map(Some),
        }
    }

    /// Serialize `value` and assign it under `key`.
    pub fn write<T: Serialize + ?Sized>(&self, key: impl Into<Seg>, value: &T) -> DraftResult<()> {
        self.set(key, crate::to_value(value)?)
    }

    /// Wrap this draft in a generated typed view.
    pub fn typed<T: crate::Drafted>(&self) -> T::Draft<'s> {
        T::wrap(*self)
    }

    /// Register a child draft for `value` stored under `seg`.
    fn adopt(&self, states: &mut Vec<DraftState>, value: Value, seg: Seg) -> DraftId {
        states.push(DraftState::new_child(value, self.id, seg.clone()));
        let child = states.len() - 1;
        states[self.id].prepare_copy().put(&seg, Slot::Draft(child));
        child
    }

    /// Assigning a nested draft's own base back over it, or a sibling draft
    /// over the base member it was created from, changes nothing.
    fn restores_base(&self, states: &[DraftState], current: Option<&Slot>, incoming: &Slot) -> bool {
        match (current, incoming) {
            (Some(Slot::Draft(child)), Slot::Value(v)) => states[*child].base.is_same(v),
            (Some(Slot::Value(v)), Slot::Draft(child)) => {
                let child = &states[*child];
                child.parent == Some(self.id) && !child.modified && child.base.is_same(v)
            }
            _ => false,
        }
    }

    fn slot_for(&self, states: &[DraftState], seg: &Seg, field: Field<'s>) -> DraftResult<Slot> {
        match field {
            Field::Value(v) => Ok(Slot::Value(v)),
            Field::Draft(other) => {
                if !std::ptr::eq(other.scope, self.scope) {
                    other.scope.ensure_live()?;
                    return Err(DraftError::foreign_draft(path_of(states, self.id).child(seg)));
                }
                if contains_draft(states, other.id, self.id) {
                    return Err(DraftError::cycle(path_of(states, self.id).child(seg)));
                }
                Ok(Slot::Draft(other.id))
            }
        }
    }

    fn check_key(&self, states: &[DraftState], seg: &Seg) -> DraftResult<()> {
        let state = &states[self.id];
        match (state.is_array(), seg) {
            (true, Seg::Index(_)) | (false, Seg::Key(_)) => Ok(()),
            (is_array, _) => Err(DraftError::type_mismatch(
                path_of(states, self.id).child(seg),
                if is_array { "index" } else { "key" },
                seg.kind(),
            )),
        }
    }

    fn check_writable_key(&self, states: &[DraftState], seg: &Seg) -> DraftResult<()> {
        self.check_key(states, seg)?;
        let len = states[self.id].latest_len();
        match seg {
            Seg::Index(index) if *index > len => Err(DraftError::index_out_of_bounds(
                path_of(states, self.id),
                *index,
                len,
            )),
            _ => Ok(()),
        }
    }

    fn require_array(&self) -> DraftResult<usize> {
        self.scope.ensure_live()?;
        let states = self.scope.states.borrow();
        let state = &states[self.id];
        if !state.is_array() {
            return Err(DraftError::type_mismatch(
                path_of(&states, self.id),
                "array",
                state.base.type_name(),
            ));
        }
        Ok(state.latest_len())
    }
}

impl fmt::Debug for Draft<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Draft").field(&self.id).finish()
    }
}
