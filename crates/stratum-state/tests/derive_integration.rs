//! Integration tests for the Drafted derive macro.
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use stratum_state::{manage, Draft, DraftError, DraftResult, Drafted, Manager, Value};

/// Run a typed recipe against `base` and return the result.
fn with_view<T, F>(base: serde_json::Value, f: F) -> Value
where
    T: Drafted,
    F: for<'s> FnOnce(T::Draft<'s>) -> DraftResult<()>,
{
    manage(Value::from(base), |draft: &Draft<'_>| f(draft.typed::<T>())).unwrap()
}

// ============================================================================
// Basic struct tests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Drafted)]
struct Todo {
    title: String,
    done: bool,
    priority: u32,
}

#[test]
fn test_simple_struct_read() {
    let base = json!({"title": "write tests", "done": false, "priority": 2});
    let result = with_view::<Todo, _>(base.clone(), |todo| {
        assert_eq!(todo.title()?, "write tests");
        assert!(!todo.done()?);
        assert_eq!(todo.priority()?, 2);
        assert!(!todo.is_modified()?);
        Ok(())
    });
    assert_eq!(result, base);
}

#[test]
fn test_simple_struct_write() {
    let result = with_view::<Todo, _>(json!({"title": "a", "done": false, "priority": 1}), |todo| {
        todo.set_done(true)?;
        todo.set_priority(todo.priority()? + 1)?;
        assert!(todo.is_modified()?);
        Ok(())
    });
    assert_eq!(result, json!({"title": "a", "done": true, "priority": 2}));
}

#[test]
fn test_simple_struct_delete() {
    let result = with_view::<Todo, _>(json!({"title": "a", "done": true, "priority": 1}), |todo| {
        todo.delete_done()?;
        assert!(matches!(todo.done(), Err(DraftError::PathNotFound { .. })));
        Ok(())
    });
    assert_eq!(result, json!({"title": "a", "priority": 1}));
}

#[test]
fn test_current_deserializes() {
    with_view::<Todo, _>(json!({"title": "a", "done": false, "priority": 1}), |todo| {
        todo.set_title("b".to_string())?;
        assert_eq!(
            todo.current()?,
            Todo {
                title: "b".into(),
                done: false,
                priority: 1
            }
        );
        Ok(())
    });
}

#[test]
fn test_unchanged_setter_keeps_identity() {
    let base = Value::from(json!({"title": "a", "done": false, "priority": 1}));
    let result = manage(base.clone(), |draft| draft.typed::<Todo>().set_done(false)).unwrap();
    assert!(result.is_same(&base));
}

// ============================================================================
// Attributes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Drafted)]
struct Settings {
    #[serde(rename = "displayName")]
    #[stratum(rename = "displayName")]
    display_name: String,
    #[stratum(default = "10")]
    #[serde(default)]
    page_size: u32,
    #[stratum(skip)]
    #[serde(skip)]
    cache: Option<String>,
    theme: Option<String>,
    tags: Vec<String>,
    limits: BTreeMap<String, u32>,
}

#[test]
fn test_rename_and_default() {
    with_view::<Settings, _>(json!({"displayName": "Ada", "tags": [], "limits": {}}), |s| {
        assert_eq!(s.display_name()?, "Ada");
        assert_eq!(s.page_size()?, 10);
        assert_eq!(s.theme()?, None);
        Ok(())
    });
}

#[test]
fn test_option_null_reads_none() {
    with_view::<Settings, _>(json!({"theme": null}), |s| {
        assert_eq!(s.theme()?, None);
        s.set_theme(Some("dark".into()))?;
        assert_eq!(s.theme()?, Some("dark".to_string()));
        Ok(())
    });
}

#[test]
fn test_vec_push_creates_array() {
    let result = with_view::<Settings, _>(json!({}), |s| {
        s.push_tags("a".into())?;
        s.push_tags("b".into())?;
        Ok(())
    });
    assert_eq!(result, json!({"tags": ["a", "b"]}));
}

#[test]
fn test_map_round_trip() {
    let result = with_view::<Settings, _>(json!({"limits": {"x": 1}}), |s| {
        let mut limits = s.limits()?;
        limits.insert("y".into(), 2);
        s.set_limits(limits)
    });
    assert_eq!(result, json!({"limits": {"x": 1, "y": 2}}));
}

// ============================================================================
// Nested views
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Drafted)]
struct Profile {
    email: String,
    verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Drafted)]
struct User {
    name: String,
    #[stratum(nested)]
    profile: Profile,
    #[stratum(nested)]
    backup: Option<Profile>,
}

#[test]
fn test_nested_write_shares_siblings() {
    let base = Value::from(json!({
        "name": "Ada",
        "profile": {"email": "ada@example.com", "verified": false},
        "backup": {"email": "old@example.com", "verified": true}
    }));
    let result = manage(base.clone(), |draft| {
        let user = draft.typed::<User>();
        user.profile()?.set_verified(true)
    })
    .unwrap();

    assert_eq!(result.pointer(&stratum_state::path!("profile", "verified")), Some(&Value::Bool(true)));
    let backup = stratum_state::path!("backup");
    assert!(result.pointer(&backup).unwrap().is_same(base.pointer(&backup).unwrap()));
}

#[test]
fn test_optional_nested() {
    with_view::<User, _>(json!({"name": "Ada", "profile": {"email": "", "verified": false}, "backup": null}), |user| {
        assert!(user.backup()?.is_none());
        user.set_backup(Some(Profile {
            email: "b@example.com".into(),
            verified: false,
        }))?;
        let backup = user.backup()?.expect("backup was set");
        backup.set_verified(true)?;
        assert!(backup.verified()?);
        Ok(())
    });
}

#[test]
fn test_typed_patches_round_trip() {
    let base = Value::from(json!({"title": "a", "done": false, "priority": 1}));
    let (next, forward, inverse) = Manager::new()
        .manage_with_patches(base.clone(), |draft| draft.typed::<Todo>().set_done(true))
        .unwrap();
    assert_eq!(stratum_state::apply_patch(&base, &forward).unwrap(), next);
    assert_eq!(stratum_state::apply_patch(&next, &inverse).unwrap(), base);
}
