//! Store holds a shared, immutable state value with a patch history.
//!
//! Every change goes through a draft, so each commit records both the
//! forward patch and the inverse patch. That gives:
//! - replay of the state to any point in history
//! - undo of the latest commit
//! - cheap snapshots that share structure with the live state

use crate::{apply_patch, Draft, DraftError, DraftResult, Manager, Patch, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur while driving a [`Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("draft failed: {0}")]
    Draft(#[from] DraftError),

    #[error("invalid replay index: {index}, history length: {len}")]
    InvalidReplayIndex { index: usize, len: usize },

    #[error("nothing to undo")]
    NothingToUndo,
}

/// A reducer turns an action into edits on a draft.
///
/// Any `Fn(&Draft<'_>, A) -> DraftResult<()>` is a reducer.
pub trait Reducer<A> {
    fn reduce(&self, draft: &Draft<'_>, action: A) -> DraftResult<()>;
}

impl<A, F> Reducer<A> for F
where
    F: Fn(&Draft<'_>, A) -> DraftResult<()>,
{
    fn reduce(&self, draft: &Draft<'_>, action: A) -> DraftResult<()> {
        self(draft, action)
    }
}

/// One recorded change.
#[derive(Clone, Debug, PartialEq)]
pub struct Commit {
    /// Patch from the previous state to the next.
    pub forward: Patch,
    /// Patch from the next state back to the previous.
    pub inverse: Patch,
}

/// Shared state container.
///
/// Cloning a store is cheap and the clones observe the same state.
///
/// # Example
///
/// ```ignore
/// use stratum_state::{Store, Value};
/// use serde_json::json;
///
/// let store = Store::new(Value::from(json!({"count": 0})));
/// store.update(|draft| draft.set("count", 1)).await?;
/// assert_eq!(store.snapshot().await, json!({"count": 1}));
///
/// store.undo().await?;
/// assert_eq!(store.snapshot().await, json!({"count": 0}));
/// ```
pub struct Store {
    manager: Manager,
    initial: Arc<RwLock<Value>>,
    state: Arc<RwLock<Value>>,
    history: Arc<RwLock<Vec<Commit>>>,
}

impl Store {
    /// Create a store with the default [`Manager`]. The initial value is
    /// deep-frozen.
    pub fn new(initial: Value) -> Self {
        Self::with_manager(Manager::default(), initial)
    }

    pub fn with_manager(manager: Manager, initial: Value) -> Self {
        let initial = if manager.auto_freeze() {
            crate::freeze(initial, true)
        } else {
            initial
        };
        Self {
            manager,
            initial: Arc::new(RwLock::new(initial.clone())),
            state: Arc::new(RwLock::new(initial)),
            history: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// The current state. Shares structure with the store.
    pub async fn snapshot(&self) -> Value {
        self.state.read().await.clone()
    }

    /// The state the history replays from.
    pub async fn initial(&self) -> Value {
        self.initial.read().await.clone()
    }

    /// Run a recipe against the current state and commit the result.
    ///
    /// A recipe that changes nothing commits nothing.
    pub async fn update<F>(&self, recipe: F) -> Result<Value, StoreError>
    where
        F: FnOnce(&Draft<'_>) -> DraftResult<()>,
    {
        let mut state = self.state.write().await;
        let (next, forward, inverse) = self.manager.manage_with_patches(state.clone(), recipe)?;
        if next.is_same(&state) {
            return Ok(next);
        }
        *state = next.clone();
        drop(state);

        tracing::debug!(ops = forward.len(), "store updated");
        self.history.write().await.push(Commit { forward, inverse });
        Ok(next)
    }

    /// Apply one action through a reducer.
    pub async fn dispatch<A, R>(&self, reducer: &R, action: A) -> Result<Value, StoreError>
    where
        R: Reducer<A>,
    {
        self.update(|draft| reducer.reduce(draft, action)).await
    }

    /// Apply an externally produced patch as a commit.
    pub async fn apply(&self, patch: &Patch) -> Result<Value, StoreError> {
        let ops = patch.clone();
        self.update(|draft| {
            let next = apply_patch(&draft.current()?, &ops)?;
            replace_contents(draft, &next)
        })
        .await
    }

    /// Revert the latest commit and drop it from the history.
    pub async fn undo(&self) -> Result<Value, StoreError> {
        let mut state = self.state.write().await;
        let mut history = self.history.write().await;
        let commit = history.pop().ok_or(StoreError::NothingToUndo)?;
        let previous = self.manager.apply_patch(&state, &commit.inverse)?;
        *state = previous.clone();
        tracing::debug!(remaining = history.len(), "store undo");
        Ok(previous)
    }

    /// Replay the history from the initial state up to and including
    /// commit `index`.
    pub async fn replay_to(&self, index: usize) -> Result<Value, StoreError> {
        let history = self.history.read().await;
        if index >= history.len() {
            return Err(StoreError::InvalidReplayIndex {
                index,
                len: history.len(),
            });
        }

        let mut state = self.initial.read().await.clone();
        for commit in history.iter().take(index + 1) {
            state = self.manager.apply_patch(&state, &commit.forward)?;
        }
        Ok(state)
    }

    pub async fn history(&self) -> Vec<Commit> {
        self.history.read().await.clone()
    }

    pub async fn history_len(&self) -> usize {
        self.history.read().await.len()
    }

    /// Forget the history. The current state becomes the new initial state.
    pub async fn clear_history(&self) {
        let state = self.state.read().await;
        let mut history = self.history.write().await;
        *self.initial.write().await = state.clone();
        history.clear();
    }

    /// Keep only the last `keep_last` commits, folding the rest into the
    /// initial state. Returns how many commits were removed.
    pub async fn prune_history(&self, keep_last: usize) -> Result<usize, StoreError> {
        let mut history = self.history.write().await;
        let len = history.len();
        if len <= keep_last {
            return Ok(0);
        }

        let to_remove = len - keep_last;
        let mut initial = self.initial.read().await.clone();
        for commit in history.iter().take(to_remove) {
            initial = self.manager.apply_patch(&initial, &commit.forward)?;
        }
        *self.initial.write().await = initial;
        history.drain(0..to_remove);
        Ok(to_remove)
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            initial: Arc::clone(&self.initial),
            state: Arc::clone(&self.state),
            history: Arc::clone(&self.history),
        }
    }
}

/// Make `draft` hold the contents of `next`, member by member, so that
/// unchanged members keep their identity.
fn replace_contents(draft: &Draft<'_>, next: &Value) -> DraftResult<()> {
    match next {
        Value::Object(object) if !draft.is_array()? => {
            for key in draft.keys()? {
                if key.as_key().is_some_and(|k| !object.contains_key(k)) {
                    draft.delete(key)?;
                }
            }
            for (key, value) in object.iter() {
                draft.set(key.as_str(), value)?;
            }
            Ok(())
        }
        Value::Array(array) if draft.is_array()? => {
            draft.truncate(array.len())?;
            for (index, value) in array.iter().enumerate() {
                draft.set(index, value)?;
            }
            Ok(())
        }
        other => Err(DraftError::type_mismatch(
            draft.path(),
            if draft.is_array()? { "array" } else { "object" },
            other.type_name(),
        )),
    }
}
