//! Replaying patches through drafts.
//!
//! Patches are applied with the same copy-on-write machinery as recipes, so
//! only containers on the changed paths are copied and everything else stays
//! shared with the input.

use crate::{Draft, DraftError, DraftResult, Field, Manager, Object, Op, Patch, Path, Seg, Value};

/// Apply a patch with the default [`Manager`].
///
/// The input is never modified. Operations run in order; the first failing
/// operation aborts the whole patch.
pub fn apply_patch(doc: &Value, patch: &Patch) -> DraftResult<Value> {
    Manager::default().apply_patch(doc, patch)
}

/// Apply several patches in sequence.
pub fn apply_patches<'a>(doc: &Value, patches: impl IntoIterator<Item = &'a Patch>) -> DraftResult<Value> {
    let manager = Manager::default();
    patches
        .into_iter()
        .try_fold(doc.clone(), |acc, patch| manager.apply_patch(&acc, patch))
}

impl Manager {
    /// Apply a patch, sharing every subtree the patch does not touch.
    pub fn apply_patch(&self, doc: &Value, patch: &Patch) -> DraftResult<Value> {
        let mut current = doc.clone();
        let mut pending: Vec<&Op> = Vec::new();
        for op in patch {
            if op.replaces_root() {
                current = self.apply_ops(current, &pending)?;
                pending.clear();
                current = match op {
                    Op::Set { value, .. } => value.clone(),
                    _ => Value::Null,
                };
            } else {
                pending.push(op);
            }
        }
        let result = self.apply_ops(current, &pending)?;
        tracing::trace!(ops = patch.len(), "patch applied");
        Ok(result)
    }

    fn apply_ops(&self, doc: Value, ops: &[&Op]) -> DraftResult<Value> {
        if ops.is_empty() {
            return Ok(doc);
        }
        if !doc.is_draftable() {
            return Err(DraftError::type_mismatch(Path::root(), "array or object", doc.type_name()));
        }
        self.manage(doc, |root| ops.iter().try_for_each(|op| apply_op(root, op)))
    }
}

fn apply_op(root: &Draft<'_>, op: &Op) -> DraftResult<()> {
    match op {
        Op::Set { path, value } => {
            let (parent, last) = split(path)?;
            descend(root, parent, true)?.set(last.clone(), value.clone())
        }
        Op::Delete { path } => {
            let (parent, last) = split(path)?;
            let Some(target) = descend_existing(root, parent)? else {
                return Ok(());
            };
            match last {
                Seg::Index(index) if *index < target.len()? => target.remove(*index).map(drop),
                Seg::Index(_) => Ok(()),
                Seg::Key(_) => target.delete(last.clone()),
            }
        }
        Op::Append { path, value } => {
            let target = match path.segments().split_last() {
                None => *root,
                Some((last, parent)) => {
                    let parent = descend(root, parent, true)?;
                    if !parent.has(last.clone())? {
                        parent.set(last.clone(), Value::Array(Default::default()))?;
                    }
                    parent.draft(last.clone())?
                }
            };
            target.push(value.clone())
        }
        Op::Insert { path, index, value } => {
            let target = descend(root, path.segments(), false)?;
            target.insert(*index, value.clone())
        }
    }
}

fn split(path: &Path) -> DraftResult<(&[Seg], &Seg)> {
    match path.segments().split_last() {
        Some((last, parent)) => Ok((parent, last)),
        None => Err(DraftError::path_not_found(Path::root())),
    }
}

/// Walk to the container at `segments`, creating missing objects on request.
fn descend<'s>(root: &Draft<'s>, segments: &[Seg], create: bool) -> DraftResult<Draft<'s>> {
    let mut current = *root;
    for seg in segments {
        if create && seg.as_key().is_some() && !current.has(seg.clone())? {
            current.set(seg.clone(), Object::new())?;
        }
        current = current.draft(seg.clone())?;
    }
    Ok(current)
}

/// Like `descend` without creation; `None` when any step is missing.
fn descend_existing<'s>(root: &Draft<'s>, segments: &[Seg]) -> DraftResult<Option<Draft<'s>>> {
    let mut current = *root;
    for seg in segments {
        current = match current.get(seg.clone())? {
            None => return Ok(None),
            Some(Field::Draft(d)) => d,
            Some(Field::Value(_)) => current.draft(seg.clone())?,
        };
    }
    Ok(Some(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    #[test]
    fn test_set_creates_parents() {
        let patch = Patch::new().with_op(Op::set(path!("a", "b", "c"), 1));
        let result = apply_patch(&doc(json!({})), &patch).unwrap();
        assert_eq!(result, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_then_edit_assigned_object() {
        let patch = Patch::new()
            .with_op(Op::set(path!("a"), doc(json!({}))))
            .with_op(Op::set(path!("a", "b"), 2));
        let result = apply_patch(&doc(json!({})), &patch).unwrap();
        assert_eq!(result, json!({"a": {"b": 2}}));
    }

    #[test]
    fn test_delete_shifts_arrays_and_ignores_missing() {
        let patch = Patch::new()
            .with_op(Op::delete(path!("arr", 0)))
            .with_op(Op::delete(path!("missing", "deep")))
            .with_op(Op::delete(path!("gone")));
        let result = apply_patch(&doc(json!({"arr": [1, 2], "gone": true})), &patch).unwrap();
        assert_eq!(result, json!({"arr": [2]}));
    }

    #[test]
    fn test_append_and_insert() {
        let patch = Patch::new()
            .with_op(Op::append(path!("log"), "a"))
            .with_op(Op::insert(path!("log"), 0, "z"));
        let result = apply_patch(&doc(json!({})), &patch).unwrap();
        assert_eq!(result, json!({"log": ["z", "a"]}));
    }

    #[test]
    fn test_root_replacement() {
        let patch = Patch::new()
            .with_op(Op::set(path!(), doc(json!({"fresh": true}))))
            .with_op(Op::set(path!("n"), 1));
        let result = apply_patch(&doc(json!([1, 2])), &patch).unwrap();
        assert_eq!(result, json!({"fresh": true, "n": 1}));
    }

    #[test]
    fn test_type_errors() {
        let patch = Patch::new().with_op(Op::set(path!("n", "x"), 1));
        let err = apply_patch(&doc(json!({"n": 5})), &patch).unwrap_err();
        assert!(matches!(err, DraftError::TypeMismatch { .. }));

        let patch = Patch::new().with_op(Op::set(path!("x"), 1));
        assert!(apply_patch(&doc(json!(3)), &patch).is_err());
    }

    #[test]
    fn test_untouched_subtrees_are_shared() {
        let base = doc(json!({"a": {"x": 1}, "b": {"y": 2}}));
        let patch = Patch::new().with_op(Op::set(path!("a", "x"), 9));
        let result = apply_patch(&base, &patch).unwrap();
        let b = path!("b");
        assert!(result.pointer(&b).unwrap().is_same(base.pointer(&b).unwrap()));
    }
}
