//! Draft scopes: the arena of draft states for one mutation call.
//!
//! A [`Scope`] owns every draft state created while a recipe runs. States
//! refer to each other by index (`DraftId`), never by reference, so the
//! parent links used for change propagation cannot form ownership cycles.
//! Finalizing walks the arena from the root, rebuilds modified containers,
//! revokes every outstanding [`Draft`] handle and releases the arena.

use crate::draft::{Draft, Field};
use crate::value::freeze_in_place;
use crate::{DraftError, DraftResult, Manager, Op, Patch, Path, Seg, Value};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};

pub(crate) type DraftId = usize;

/// A member of a prepared copy: a plain value or a nested draft.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    Value(Value),
    Draft(DraftId),
}

impl Slot {
    /// Identity under the draft equality rule.
    pub(crate) fn is_same(&self, other: &Slot) -> bool {
        match (self, other) {
            (Slot::Value(a), Slot::Value(b)) => a.is_same(b),
            (Slot::Draft(a), Slot::Draft(b)) => a == b,
            _ => false,
        }
    }
}

/// Shallow copy of a drafted container.
#[derive(Clone, Debug)]
pub(crate) enum Shallow {
    Array(Vec<Slot>),
    Object(IndexMap<String, Slot>),
}

impl Shallow {
    fn of(base: &Value) -> Self {
        match base {
            Value::Array(a) => Shallow::Array(a.iter().cloned().map(Slot::Value).collect()),
            Value::Object(o) => Shallow::Object(
                o.iter()
                    .map(|(k, v)| (k.clone(), Slot::Value(v.clone())))
                    .collect(),
            ),
            // Only containers are ever drafted.
            _ => Shallow::Object(IndexMap::new()),
        }
    }

    pub(crate) fn get(&self, seg: &Seg) -> Option<&Slot> {
        match (self, seg) {
            (Shallow::Array(items), Seg::Index(i)) => items.get(*i),
            (Shallow::Object(members), Seg::Key(k)) => members.get(k),
            _ => None,
        }
    }

    /// Write a slot. Array writes one past the end append.
    pub(crate) fn put(&mut self, seg: &Seg, slot: Slot) {
        match (self, seg) {
            (Shallow::Array(items), Seg::Index(i)) => {
                if *i < items.len() {
                    items[*i] = slot;
                } else {
                    items.push(slot);
                }
            }
            (Shallow::Object(members), Seg::Key(k)) => {
                members.insert(k.clone(), slot);
            }
            _ => {}
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Shallow::Array(items) => items.len(),
            Shallow::Object(members) => members.len(),
        }
    }

    pub(crate) fn slots(&self) -> Box<dyn Iterator<Item = &Slot> + '_> {
        match self {
            Shallow::Array(items) => Box::new(items.iter()),
            Shallow::Object(members) => Box::new(members.values()),
        }
    }
}

/// Bookkeeping for one drafted container.
#[derive(Debug)]
pub(crate) struct DraftState {
    pub(crate) base: Value,
    pub(crate) copy: Option<Shallow>,
    pub(crate) modified: bool,
    pub(crate) finalized: bool,
    pub(crate) parent: Option<DraftId>,
    /// Location under `parent` when the draft was created.
    pub(crate) seg: Option<Seg>,
    /// `true` for keys written by the recipe, `false` for base keys it deleted.
    pub(crate) assigned: IndexMap<Seg, bool>,
    result: Option<Value>,
}

impl DraftState {
    fn new(base: Value, parent: Option<DraftId>, seg: Option<Seg>) -> Self {
        Self {
            base,
            copy: None,
            modified: false,
            finalized: false,
            parent,
            seg,
            assigned: IndexMap::new(),
            result: None,
        }
    }

    pub(crate) fn new_child(base: Value, parent: DraftId, seg: Seg) -> Self {
        Self::new(base, Some(parent), Some(seg))
    }

    /// The slot at `seg` in the copy if present, else in the base.
    pub(crate) fn peek(&self, seg: &Seg) -> Option<Slot> {
        match &self.copy {
            Some(copy) => copy.get(seg).cloned(),
            None => self.base.get(seg).cloned().map(Slot::Value),
        }
    }

    pub(crate) fn latest_len(&self) -> usize {
        match (&self.copy, &self.base) {
            (Some(copy), _) => copy.len(),
            (None, Value::Array(a)) => a.len(),
            (None, Value::Object(o)) => o.len(),
            (None, _) => 0,
        }
    }

    /// Shallow-copy the base on first use; later calls return the same copy.
    pub(crate) fn prepare_copy(&mut self) -> &mut Shallow {
        let base = &self.base;
        self.copy.get_or_insert_with(|| Shallow::of(base))
    }

    pub(crate) fn is_array(&self) -> bool {
        matches!(self.base, Value::Array(_))
    }
}

/// Mark `id` and its ancestors modified, stopping at the first ancestor
/// that already is.
pub(crate) fn mark_changed(states: &mut [DraftState], id: DraftId) {
    let mut current = Some(id);
    while let Some(i) = current {
        let state = &mut states[i];
        if state.modified {
            break;
        }
        state.modified = true;
        state.prepare_copy();
        current = state.parent;
    }
}

/// True when the subtree of `from` contains the draft `target`.
pub(crate) fn contains_draft(states: &[DraftState], from: DraftId, target: DraftId) -> bool {
    let mut stack = vec![from];
    let mut seen = vec![false; states.len()];
    while let Some(id) = stack.pop() {
        if id == target {
            return true;
        }
        if std::mem::replace(&mut seen[id], true) {
            continue;
        }
        if let Some(copy) = &states[id].copy {
            stack.extend(copy.slots().filter_map(|slot| match slot {
                Slot::Draft(child) => Some(*child),
                Slot::Value(_) => None,
            }));
        }
    }
    false
}

/// Location of a draft as recorded by its parent chain.
pub(crate) fn path_of(states: &[DraftState], id: DraftId) -> Path {
    let mut segments = Vec::new();
    let mut current = Some(id);
    while let Some(state) = current.and_then(|i| states.get(i)) {
        if let Some(seg) = &state.seg {
            segments.push(seg.clone());
        }
        current = state.parent;
    }
    segments.reverse();
    Path::from_segments(segments)
}

/// Snapshot of a draft's latest contents without finalizing it.
pub(crate) fn current_of(states: &[DraftState], id: DraftId) -> Value {
    let state = &states[id];
    let copy = match &state.copy {
        Some(copy) if state.modified => copy,
        _ => return state.base.clone(),
    };
    let resolve = |slot: &Slot| match slot {
        Slot::Value(v) => v.clone(),
        Slot::Draft(child) => current_of(states, *child),
    };
    match copy {
        Shallow::Array(items) => Value::Array(items.iter().map(resolve).collect()),
        Shallow::Object(members) => Value::Object(
            members
                .iter()
                .map(|(k, slot)| (k.clone(), resolve(slot)))
                .collect(),
        ),
    }
}

/// The set of drafts live during one mutation call.
///
/// A scope is created per call and passed explicitly; there is no ambient
/// "current scope", so nested mutation calls each open their own scope and
/// cannot observe one another. Scopes are `!Sync`: one call, one thread.
///
/// ```
/// use stratum_state::{Manager, Scope, Value};
/// use serde_json::json;
///
/// let manager = Manager::new();
/// let scope = Scope::enter(&manager);
/// let root = scope.create_draft(Value::from(json!({"n": 1}))).unwrap();
/// root.as_draft().unwrap().set("n", 2).unwrap();
///
/// let result = scope.finalize().unwrap();
/// assert_eq!(result, json!({"n": 2}));
/// assert!(scope.is_revoked());
/// ```
#[derive(Debug)]
pub struct Scope {
    pub(crate) states: RefCell<Vec<DraftState>>,
    revoked: Cell<bool>,
    auto_freeze: bool,
}

impl Scope {
    /// Open a scope configured by `manager`.
    pub fn enter(manager: &Manager) -> Self {
        tracing::trace!(auto_freeze = manager.auto_freeze(), "entering draft scope");
        Self {
            states: RefCell::new(Vec::new()),
            revoked: Cell::new(false),
            auto_freeze: manager.auto_freeze(),
        }
    }

    /// Draft `base` in this scope.
    ///
    /// Arrays and objects yield a [`Field::Draft`]; the first draft created
    /// becomes the scope's root. Any other value is handed back untouched as
    /// [`Field::Value`].
    pub fn create_draft(&self, base: Value) -> DraftResult<Field<'_>> {
        self.ensure_live()?;
        if !base.is_draftable() {
            return Ok(Field::Value(base));
        }
        let id = self.register(base, None, None);
        Ok(Field::Draft(Draft::new(self, id)))
    }

    /// Number of draft states created so far.
    pub fn draft_count(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.get()
    }

    /// Invalidate every draft of this scope and release the arena.
    pub fn revoke(&self) {
        if !self.revoked.replace(true) {
            let released = std::mem::take(&mut *self.states.borrow_mut());
            tracing::trace!(drafts = released.len(), "draft scope revoked");
        }
    }

    /// Produce the result of the root draft and revoke the scope.
    ///
    /// An untouched root yields its base value itself; a modified root yields
    /// a new container in which every untouched subtree is shared with the
    /// base.
    pub fn finalize(&self) -> DraftResult<Value> {
        self.finalize_inner(false).map(|(value, _)| value)
    }

    /// Like [`Scope::finalize`], also returning the forward and inverse
    /// patches describing the change.
    pub fn finalize_with_patches(&self) -> DraftResult<(Value, Patch, Patch)> {
        let (value, patches) = self.finalize_inner(true)?;
        let (forward, inverse) = patches.unwrap_or_default();
        Ok((value, forward, inverse))
    }

    pub(crate) fn ensure_live(&self) -> DraftResult<()> {
        if self.revoked.get() {
            return Err(DraftError::Revoked);
        }
        Ok(())
    }

    pub(crate) fn register(&self, base: Value, parent: Option<DraftId>, seg: Option<Seg>) -> DraftId {
        let mut states = self.states.borrow_mut();
        states.push(DraftState::new(base, parent, seg));
        states.len() - 1
    }

    fn finalize_inner(&self, with_patches: bool) -> DraftResult<(Value, Option<(Patch, Patch)>)> {
        self.ensure_live()?;
        let outcome = {
            let mut states = self.states.borrow_mut();
            if states.is_empty() {
                return Err(DraftError::EmptyScope);
            }
            let mut finalizer = Finalizer {
                states: &mut states,
                auto_freeze: self.auto_freeze,
                patches: with_patches.then(Patches::default),
            };
            let root_path = with_patches.then(Path::root);
            let value = finalizer.finalize(0, root_path);
            let patches = finalizer.patches.take().map(Patches::into_pair);
            value.map(|v| (v, patches))
        };
        let ops = outcome
            .as_ref()
            .ok()
            .and_then(|(_, patches)| patches.as_ref())
            .map(|(forward, _)| forward.len());
        tracing::debug!(drafts = self.draft_count(), ops = ?ops, "draft scope finalized");
        self.revoke();
        outcome
    }
}

#[derive(Default)]
struct Patches {
    forward: Vec<Op>,
    inverse: Vec<Op>,
}

impl Patches {
    fn into_pair(self) -> (Patch, Patch) {
        (Patch::with_ops(self.forward), Patch::with_ops(self.inverse))
    }
}

struct Finalizer<'a> {
    states: &'a mut Vec<DraftState>,
    auto_freeze: bool,
    patches: Option<Patches>,
}

impl Finalizer<'_> {
    /// Resolve a draft state to a plain value.
    ///
    /// `path` is set when patches are being recorded for this state at that
    /// location. Results are memoized so a draft reachable from several slots
    /// finalizes to one shared node.
    fn finalize(&mut self, id: DraftId, path: Option<Path>) -> DraftResult<Value> {
        if let Some(done) = &self.states[id].result {
            let done = done.clone();
            // Reached again at a recorded location after a first, unrecorded visit.
            if let (Some(path), Some(patches)) = (path, self.patches.as_mut()) {
                let state = &self.states[id];
                if state.modified {
                    patches.forward.push(Op::set(path.clone(), done.clone()));
                    patches.inverse.push(Op::set(path, state.base.clone()));
                }
            }
            return Ok(done);
        }
        if self.states[id].finalized {
            return Err(DraftError::cycle(path.unwrap_or_default()));
        }
        self.states[id].finalized = true;

        if !self.states[id].modified {
            let base = self.states[id].base.clone();
            if self.auto_freeze {
                freeze_in_place(&base, true);
            }
            self.states[id].result = Some(base.clone());
            return Ok(base);
        }

        let copy = self.states[id]
            .copy
            .take()
            .unwrap_or_else(|| Shallow::of(&self.states[id].base));
        let value = match &copy {
            Shallow::Array(items) => self.finalize_array(id, items, path.as_ref())?,
            Shallow::Object(members) => self.finalize_object(id, members, path.as_ref())?,
        };
        self.states[id].copy = Some(copy);
        if self.auto_freeze {
            freeze_in_place(&value, false);
        }
        self.states[id].result = Some(value.clone());
        Ok(value)
    }

    fn finalize_slot(&mut self, slot: &Slot, path: Option<Path>) -> DraftResult<Value> {
        match slot {
            Slot::Draft(child) => self.finalize(*child, path),
            Slot::Value(v) => {
                if self.auto_freeze {
                    freeze_in_place(v, true);
                }
                Ok(v.clone())
            }
        }
    }

    /// Whether the slot still holds the draft of the base member at `seg`,
    /// in which case its changes are recorded below that location.
    fn is_original_child(&self, slot: &Slot, base_member: Option<&Value>) -> bool {
        match (slot, base_member) {
            (Slot::Draft(child), Some(member)) => self.states[*child].base.is_same(member),
            _ => false,
        }
    }

    fn finalize_array(&mut self, id: DraftId, items: &[Slot], path: Option<&Path>) -> DraftResult<Value> {
        let base = self.states[id].base.clone();
        let base_items = base.as_array().map(|a| a.as_slice()).unwrap_or_default();
        let recording = path.filter(|_| self.patches.is_some());

        let mut out = Vec::with_capacity(items.len());
        let mut replaced = Vec::new();
        for (index, slot) in items.iter().enumerate() {
            let base_member = base_items.get(index);
            let nested = recording
                .filter(|_| self.is_original_child(slot, base_member))
                .map(|p| p.child(index));
            let descended = nested.is_some();
            let value = self.finalize_slot(slot, nested)?;
            if recording.is_some() && !descended {
                match base_member {
                    Some(member) if member.is_same(&value) => {}
                    Some(member) => replaced.push((index, value.clone(), member.clone())),
                    None => {}
                }
            }
            out.push(value);
        }

        if let (Some(path), Some(patches)) = (recording, self.patches.as_mut()) {
            for (index, value, original) in replaced {
                patches.forward.push(Op::set(path.child(index), value));
                patches.inverse.push(Op::set(path.child(index), original));
            }
            let (base_len, len) = (base_items.len(), out.len());
            if len > base_len {
                for (index, value) in out.iter().enumerate().skip(base_len) {
                    patches.forward.push(Op::set(path.child(index), value.clone()));
                }
                for index in (base_len..len).rev() {
                    patches.inverse.push(Op::delete(path.child(index)));
                }
            } else {
                for index in (len..base_len).rev() {
                    patches.forward.push(Op::delete(path.child(index)));
                }
                for (index, original) in base_items.iter().enumerate().skip(len) {
                    patches.inverse.push(Op::set(path.child(index), original.clone()));
                }
            }
        }
        Ok(Value::Array(out.into_iter().collect()))
    }

    fn finalize_object(
        &mut self,
        id: DraftId,
        members: &IndexMap<String, Slot>,
        path: Option<&Path>,
    ) -> DraftResult<Value> {
        let base = self.states[id].base.clone();
        let base_members = base.as_object();
        let recording = path.filter(|_| self.patches.is_some());

        let mut out = crate::value::Map::with_capacity(members.len());
        for (key, slot) in members {
            let base_member = base_members.and_then(|o| o.get(key));
            let assigned = self.states[id].assigned.get(&Seg::key(key.as_str())) == Some(&true);
            let nested = recording
                .filter(|_| !assigned && self.is_original_child(slot, base_member))
                .map(|p| p.child(key.as_str()));
            let value = self.finalize_slot(slot, nested)?;
            out.insert(key.clone(), value);
        }

        if let (Some(path), Some(patches)) = (recording, self.patches.as_mut()) {
            for (seg, written) in &self.states[id].assigned {
                let Some(key) = seg.as_key() else { continue };
                let original = base_members.and_then(|o| o.get(key));
                match (written, out.get(key), original) {
                    (true, Some(value), Some(original)) if !value.is_same(original) => {
                        patches.forward.push(Op::set(path.child(key), value.clone()));
                        patches.inverse.push(Op::set(path.child(key), original.clone()));
                    }
                    (true, Some(value), None) => {
                        patches.forward.push(Op::set(path.child(key), value.clone()));
                        patches.inverse.push(Op::delete(path.child(key)));
                    }
                    (false, None, Some(original)) => {
                        patches.forward.push(Op::delete(path.child(key)));
                        patches.inverse.push(Op::set(path.child(key), original.clone()));
                    }
                    _ => {}
                }
            }
        }
        Ok(Value::Object(out.into()))
    }
}
