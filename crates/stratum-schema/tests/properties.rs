//! Property tests for validation.
#![allow(missing_docs)]

use proptest::prelude::*;
use serde_json::{json, Value};
use stratum_schema::{array, boolean, number, object, string, Schema, SchemaExt};

fn schemas() -> Vec<Schema> {
    vec![
        string().trim().min(1).into(),
        number().min(-5.0).max(5.0).into(),
        array(string().max(3)).max(4).into(),
        object()
            .field("name", string().trim())
            .field("flag", boolean().optional())
            .field("score", number().default_value(0))
            .into(),
        object()
            .field("tags", array(string()).optional())
            .passthrough()
            .into(),
        string().or(number()).nullable().into(),
    ]
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-10i64..10).prop_map(|n| json!(n)),
        "[ a-c]{0,5}".prop_map(Value::String),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::vec(
                (prop_oneof![Just("name"), Just("flag"), Just("score"), Just("tags"), Just("x")], inner),
                0..4
            )
            .prop_map(|pairs| {
                Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
            }),
        ]
    })
}

proptest! {
    // Re-validating a successful output succeeds with the same output.
    #[test]
    fn prop_successful_output_is_stable(index in 0usize..6, input in value()) {
        let schema = &schemas()[index];
        if let Ok(output) = schema.safe_parse(&input) {
            prop_assert_eq!(schema.safe_parse(&output), Ok(output));
        }
    }

    #[test]
    fn prop_failures_always_carry_issues(index in 0usize..6, input in value()) {
        if let Err(err) = schemas()[index].safe_parse(&input) {
            prop_assert!(!err.is_empty());
        }
    }
}
