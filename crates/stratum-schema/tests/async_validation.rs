//! Async evaluation: awaited effects, concurrency and parity with sync parsing.
#![allow(missing_docs)]

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stratum_schema::{array, issue_path, number, object, string, union, SchemaExt};

#[tokio::test]
async fn test_async_refinement() {
    let schema = string().add_async(
        |value: Value| async move { value.as_str() != Some("taken") },
        "username is taken",
    );
    assert_eq!(schema.validate(&json!("free")).await.unwrap(), json!("free"));

    let err = schema.validate(&json!("taken")).await.unwrap_err();
    assert_eq!(err.errors()[0].code_name(), "custom");
    assert_eq!(err.errors()[0].message, "username is taken");
}

#[tokio::test]
async fn test_async_convert() {
    let schema = string().convert_async(|value: Value| async move {
        tokio::task::yield_now().await;
        json!(value.as_str().unwrap_or_default().to_uppercase())
    });
    assert_eq!(schema.validate(&json!("ada")).await.unwrap(), json!("ADA"));
}

#[tokio::test]
async fn test_elements_merge_in_index_order() {
    // Later elements finish first.
    let delays = array(number().convert_async(|value: Value| async move {
        let ms = value.as_u64().unwrap_or_default();
        tokio::time::sleep(Duration::from_millis(ms)).await;
        value
    }));
    let output = delays.validate(&json!([30, 20, 10, 0])).await.unwrap();
    assert_eq!(output, json!([30, 20, 10, 0]));
}

#[tokio::test]
async fn test_elements_run_concurrently() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (r, p) = (Arc::clone(&running), Arc::clone(&peak));
    let schema = array(string().add_async(
        move |_| {
            let (running, peak) = (Arc::clone(&r), Arc::clone(&p));
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                true
            }
        },
        "unused",
    ));
    schema.validate(&json!(["a", "b", "c"])).await.unwrap();
    assert_eq!(peak.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_async_issue_paths() {
    let schema = object().field(
        "items",
        array(string().add_async(|_| async { false }, "rejected")),
    );
    let err = schema.validate(&json!({"items": ["a", "b"]})).await.unwrap_err();
    let mut paths: Vec<_> = err.errors().iter().map(|i| i.path.clone()).collect();
    paths.sort_by_key(|p| format!("{p:?}"));
    assert_eq!(paths, vec![issue_path!["items", 0], issue_path!["items", 1]]);
}

#[tokio::test]
async fn test_async_union_prefers_valid_option() {
    let schema = union(vec![
        string().add_async(|_| async { false }, "never").into(),
        string().min(1).into(),
    ]);
    assert_eq!(schema.validate(&json!("x")).await.unwrap(), json!("x"));
}

#[tokio::test]
async fn test_sync_and_async_agree() {
    let schema = object()
        .field("name", string().min(2).trim())
        .field("age", number().int().min(0.0))
        .field("tags", array(string().email()).max(2))
        .field("nick", string().or(number()).optional())
        .strict()
        .into_schema();

    let inputs = [
        json!({"name": " ada ", "age": 36, "tags": ["a@example.com"]}),
        json!({"name": "a", "age": -1.5, "tags": ["x", "y", "z"], "extra": 1}),
        json!({"name": 3, "nick": null}),
        json!(null),
        json!([]),
    ];
    for input in &inputs {
        let sync = schema.safe_parse(input);
        let asynchronous = schema.validate(input).await;
        assert_eq!(sync, asynchronous, "input: {input}");
    }
}
