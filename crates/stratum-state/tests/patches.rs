//! Patch recording and replay.

use proptest::prelude::*;
use serde_json::json;
use stratum_state::{apply_patch, apply_patches, path, Draft, DraftResult, Manager, Op, Patch, Value};

fn v(json: serde_json::Value) -> Value {
    Value::from(json)
}

fn record<F>(base: &Value, recipe: F) -> (Value, Patch, Patch)
where
    F: FnOnce(&Draft<'_>) -> DraftResult<()>,
{
    Manager::new().manage_with_patches(base.clone(), recipe).unwrap()
}

fn assert_replays(base: &Value, next: &Value, forward: &Patch, inverse: &Patch) {
    assert_eq!(&apply_patch(base, forward).unwrap(), next, "forward: {forward:?}");
    assert_eq!(&apply_patch(next, inverse).unwrap(), base, "inverse: {inverse:?}");
}

// ============================================================================
// Recorded patches
// ============================================================================

#[test]
fn test_noop_records_nothing() {
    let base = v(json!({"a": 1}));
    let (next, forward, inverse) = record(&base, |_| Ok(()));
    assert!(next.is_same(&base));
    assert!(forward.is_empty());
    assert!(inverse.is_empty());
}

#[test]
fn test_scalar_set() {
    let base = v(json!({"a": 1, "b": {"c": 2}}));
    let (next, forward, inverse) = record(&base, |draft| draft.draft("b")?.set("c", 3));
    assert_eq!(forward.ops(), &[Op::set(path!("b", "c"), 3)]);
    assert_eq!(inverse.ops(), &[Op::set(path!("b", "c"), 2)]);
    assert_replays(&base, &next, &forward, &inverse);
}

#[test]
fn test_add_and_delete_keys() {
    let base = v(json!({"keep": 1, "drop": 2}));
    let (next, forward, inverse) = record(&base, |draft| {
        draft.delete("drop")?;
        draft.set("add", json!({"nested": true}))
    });
    assert_eq!(forward.len(), 2);
    assert_replays(&base, &next, &forward, &inverse);
}

#[test]
fn test_array_growth_and_shrink() {
    let base = v(json!({"grow": [1], "shrink": [1, 2, 3]}));
    let (next, forward, inverse) = record(&base, |draft| {
        let grow = draft.draft("grow")?;
        grow.push(2)?;
        grow.push(3)?;
        draft.draft("shrink")?.truncate(1)
    });
    assert_eq!(next, json!({"grow": [1, 2, 3], "shrink": [1]}));
    assert_replays(&base, &next, &forward, &inverse);
}

#[test]
fn test_array_removal_in_the_middle() {
    let base = v(json!([{"id": 1}, {"id": 2}, {"id": 3}]));
    let (next, forward, inverse) = record(&base, |draft| draft.remove(1).map(drop));
    assert_eq!(next, json!([{"id": 1}, {"id": 3}]));
    assert_replays(&base, &next, &forward, &inverse);
}

#[test]
fn test_assigned_draft_is_recorded_as_a_value() {
    let base = v(json!({"a": {"n": 1}}));
    let (next, forward, inverse) = record(&base, |draft| {
        let a = draft.draft("a")?;
        a.set("n", 2)?;
        draft.set("b", a)
    });
    assert_replays(&base, &next, &forward, &inverse);
}

#[test]
fn test_patch_wire_format() {
    let base = v(json!({"list": []}));
    let (_, forward, _) = record(&base, |draft| draft.draft("list")?.push("x"));
    let wire = serde_json::to_value(&forward).unwrap();
    assert_eq!(wire, json!([{"op": "set", "path": ["list", 0], "value": "x"}]));
    let back: Patch = serde_json::from_value(wire).unwrap();
    assert_eq!(back, forward);
}

// ============================================================================
// apply_patch
// ============================================================================

#[test]
fn test_apply_empty_patch_returns_input() {
    let base = v(json!({"x": 1}));
    let result = apply_patch(&base, &Patch::new()).unwrap();
    assert!(result.is_same(&base));
}

#[test]
fn test_apply_ops_in_order() {
    let patch = Patch::new()
        .with_op(Op::set(path!("x"), 1))
        .with_op(Op::set(path!("x"), 2))
        .with_op(Op::set(path!("x"), 3));
    let result = apply_patch(&v(json!({})), &patch).unwrap();
    assert_eq!(result, json!({"x": 3}));
}

#[test]
fn test_apply_patches_in_sequence() {
    let first = Patch::new().with_op(Op::set(path!("a"), 1));
    let second = Patch::new().with_op(Op::append(path!("log"), "a set"));
    let result = apply_patches(&v(json!({})), [&first, &second]).unwrap();
    assert_eq!(result, json!({"a": 1, "log": ["a set"]}));
}

#[test]
fn test_insert_out_of_bounds_fails() {
    let patch = Patch::new().with_op(Op::insert(path!("list"), 5, 0));
    let err = apply_patch(&v(json!({"list": [1]})), &patch).unwrap_err();
    assert!(matches!(err, stratum_state::DraftError::IndexOutOfBounds { index: 5, len: 1, .. }));
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Clone, Debug)]
enum Edit {
    Set(String, i64),
    Delete(String),
    Push(i64),
    Remove(usize),
    Nested(String, i64),
}

fn edit() -> impl Strategy<Value = Edit> {
    let key = prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string);
    prop_oneof![
        (key.clone(), any::<i64>()).prop_map(|(k, n)| Edit::Set(k, n)),
        key.clone().prop_map(Edit::Delete),
        any::<i64>().prop_map(Edit::Push),
        (0usize..6).prop_map(Edit::Remove),
        (key, any::<i64>()).prop_map(|(k, n)| Edit::Nested(k, n)),
    ]
}

fn run(draft: &Draft<'_>, edits: &[Edit]) -> DraftResult<()> {
    for edit in edits {
        match edit {
            Edit::Set(key, n) => draft.draft("obj")?.set(key.as_str(), *n)?,
            Edit::Delete(key) => draft.draft("obj")?.delete(key.as_str())?,
            Edit::Push(n) => draft.draft("list")?.push(*n)?,
            Edit::Remove(index) => {
                let list = draft.draft("list")?;
                if *index < list.len()? {
                    list.remove(*index)?;
                }
            }
            Edit::Nested(key, n) => draft.draft("nested")?.draft("inner")?.set(key.as_str(), *n)?,
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_patches_replay_and_invert(edits in prop::collection::vec(edit(), 0..12)) {
        let base = v(json!({
            "obj": {"a": 1, "b": 2},
            "list": [10, 20, 30],
            "nested": {"inner": {"c": 3}},
            "untouched": {"deep": [1, 2, 3]}
        }));
        let (next, forward, inverse) = Manager::new()
            .manage_with_patches(base.clone(), |draft| run(draft, &edits))
            .unwrap();

        prop_assert_eq!(&apply_patch(&base, &forward).unwrap(), &next);
        prop_assert_eq!(&apply_patch(&next, &inverse).unwrap(), &base);

        let untouched = path!("untouched");
        prop_assert!(next.pointer(&untouched).unwrap().is_same(base.pointer(&untouched).unwrap()));
    }

    #[test]
    fn prop_noop_is_identity(n in any::<i64>(), s in "[a-z]{0,8}") {
        let base = v(json!({"n": n, "s": s, "o": {"k": [n]}}));
        let result = Manager::new().manage(base.clone(), |_| Ok(())).unwrap();
        prop_assert!(result.is_same(&base));
    }
}
