//! The public entry point of the draft engine.
//!
//! [`Manager::manage`] opens a scope, drafts the base value, runs the recipe
//! against the draft and finalizes. Nothing suspends in between: recipes
//! are plain synchronous closures.

use crate::{Draft, DraftError, DraftResult, Field, Patch, Reducer, Scope, Value};

/// What a [`Manager::produce`] recipe wants as the result.
#[derive(Clone, Debug, Default)]
pub enum Produce {
    /// Use the finalized draft.
    #[default]
    Keep,
    /// Discard the draft and return this value instead.
    Replace(Value),
    /// Discard the draft and return `null`.
    Nothing,
}

/// Configuration for draft scopes.
///
/// # Example
///
/// ```
/// use stratum_state::{path, Manager, Value};
/// use serde_json::json;
///
/// let base = Value::from(json!({"user": {"name": "Ada"}, "tags": ["a"]}));
/// let next = Manager::new()
///     .manage(base.clone(), |draft| draft.draft("user")?.set("name", "Grace"))
///     .unwrap();
///
/// assert_eq!(next, json!({"user": {"name": "Grace"}, "tags": ["a"]}));
/// // The untouched subtree is shared, not copied.
/// let tags = path!("tags");
/// assert!(next.pointer(&tags).unwrap().is_same(base.pointer(&tags).unwrap()));
/// ```
#[derive(Clone, Debug)]
pub struct Manager {
    auto_freeze: bool,
}

impl Default for Manager {
    fn default() -> Self {
        Self { auto_freeze: true }
    }
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether finalized results are frozen (default `true`).
    pub fn with_auto_freeze(mut self, auto_freeze: bool) -> Self {
        self.auto_freeze = auto_freeze;
        self
    }

    #[inline]
    pub fn auto_freeze(&self) -> bool {
        self.auto_freeze
    }

    /// Run `recipe` against a draft of `base` and return the result.
    ///
    /// A recipe that writes nothing yields `base` itself. A base that is not
    /// an array or object cannot be drafted; it is returned unchanged and the
    /// recipe is not called. If the recipe fails, the scope is revoked and
    /// the error returned.
    pub fn manage<F>(&self, base: Value, recipe: F) -> DraftResult<Value>
    where
        F: FnOnce(&Draft<'_>) -> DraftResult<()>,
    {
        let scope = Scope::enter(self);
        let root = match scope.create_draft(base)? {
            Field::Draft(root) => root,
            Field::Value(value) => return Ok(passthrough(value)),
        };
        run(&scope, recipe(&root))?;
        scope.finalize()
    }

    /// [`Manager::manage`] with a recipe that may replace the result.
    ///
    /// Returning [`Produce::Replace`] or [`Produce::Nothing`] after modifying
    /// the draft is an error, since the modifications would be lost.
    pub fn produce<F>(&self, base: Value, recipe: F) -> DraftResult<Value>
    where
        F: FnOnce(&Draft<'_>) -> DraftResult<Produce>,
    {
        let scope = Scope::enter(self);
        let root = match scope.create_draft(base)? {
            Field::Draft(root) => root,
            Field::Value(value) => return Ok(passthrough(value)),
        };
        let replacement = match run(&scope, recipe(&root))? {
            Produce::Keep => return scope.finalize(),
            Produce::Replace(value) => value,
            Produce::Nothing => Value::Null,
        };
        let modified = root.is_modified()?;
        scope.revoke();
        if modified {
            return Err(DraftError::ReplacedAndModified);
        }
        Ok(if self.auto_freeze {
            crate::freeze(replacement, true)
        } else {
            replacement
        })
    }

    /// [`Manager::manage`] that also returns the forward patch (base to
    /// result) and the inverse patch (result back to base).
    pub fn manage_with_patches<F>(&self, base: Value, recipe: F) -> DraftResult<(Value, Patch, Patch)>
    where
        F: FnOnce(&Draft<'_>) -> DraftResult<()>,
    {
        let scope = Scope::enter(self);
        let root = match scope.create_draft(base)? {
            Field::Draft(root) => root,
            Field::Value(value) => return Ok((passthrough(value), Patch::new(), Patch::new())),
        };
        run(&scope, recipe(&root))?;
        scope.finalize_with_patches()
    }

    /// Bind a reducer into a function that applies one action to a value
    /// and returns the next value.
    ///
    /// This is the hook used by state holders: they own the storage and call
    /// the bound function for each dispatched action.
    pub fn bind<A, R>(&self, reducer: R) -> impl Fn(&Value, A) -> DraftResult<Value>
    where
        R: Reducer<A>,
    {
        let manager = self.clone();
        move |state, action| manager.manage(state.clone(), |draft| reducer.reduce(draft, action))
    }
}

/// Run `recipe` against a draft of `base` with the default [`Manager`].
pub fn manage<F>(base: Value, recipe: F) -> DraftResult<Value>
where
    F: FnOnce(&Draft<'_>) -> DraftResult<()>,
{
    Manager::default().manage(base, recipe)
}

/// [`Manager::produce`] with the default [`Manager`].
pub fn produce<F>(base: Value, recipe: F) -> DraftResult<Value>
where
    F: FnOnce(&Draft<'_>) -> DraftResult<Produce>,
{
    Manager::default().produce(base, recipe)
}

fn passthrough(value: Value) -> Value {
    tracing::debug!(kind = value.type_name(), "base is not draftable; returning it unchanged");
    value
}

fn run<T>(scope: &Scope, outcome: DraftResult<T>) -> DraftResult<T> {
    if let Err(err) = &outcome {
        tracing::debug!(error = %err, "recipe failed; discarding drafts");
        scope.revoke();
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recipe_error_revokes_scope() {
        let base = Value::from(json!({"a": 1}));
        let err = manage(base, |draft| {
            draft.set("a", 2)?;
            Err(DraftError::path_not_found(crate::path!("nope")))
        })
        .unwrap_err();
        assert!(matches!(err, DraftError::PathNotFound { .. }));
    }

    #[test]
    fn test_primitive_base_skips_recipe() {
        let mut called = false;
        let result = manage(Value::from("text"), |_| {
            called = true;
            Ok(())
        })
        .unwrap();
        assert!(!called);
        assert_eq!(result, json!("text"));
    }

    #[test]
    fn test_produce_replace() {
        let base = Value::from(json!({"a": 1}));
        let result = produce(base.clone(), |_| Ok(Produce::Replace(Value::from(json!([1]))))).unwrap();
        assert_eq!(result, json!([1]));
        assert!(result.is_frozen());

        let result = produce(base.clone(), |_| Ok(Produce::Nothing)).unwrap();
        assert!(result.is_null());

        let err = produce(base, |draft| {
            draft.set("a", 5)?;
            Ok(Produce::Replace(Value::Null))
        })
        .unwrap_err();
        assert!(matches!(err, DraftError::ReplacedAndModified));
    }

    #[test]
    fn test_auto_freeze_toggle() {
        let base = Value::from(json!({"a": {"b": 1}}));
        let frozen = Manager::new().manage(base.clone(), |d| d.set("c", 1)).unwrap();
        assert!(frozen.is_frozen());

        let base = Value::from(json!({"a": {"b": 1}}));
        let thawed = Manager::new()
            .with_auto_freeze(false)
            .manage(base, |d| d.set("c", 1))
            .unwrap();
        assert!(!thawed.is_frozen());
    }

    fn add(draft: &Draft<'_>, by: i64) -> DraftResult<()> {
        let n: i64 = draft.read("n")?;
        draft.set("n", n + by)
    }

    #[test]
    fn test_bound_reducer() {
        let apply = Manager::new().bind(add);
        let one = apply(&Value::from(json!({"n": 0})), 1).unwrap();
        let three = apply(&one, 2).unwrap();
        assert_eq!(three, json!({"n": 3}));
    }
}
