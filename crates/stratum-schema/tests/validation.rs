//! End-to-end validation behaviour through the public API.
#![allow(missing_docs)]

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use stratum_schema::{
    array, issue_path, number, object, string, Bound, IssueCode, ParseError, ParseParams, Params,
    PathSegment, SchemaError, SchemaExt, SizeKind,
};

fn login() -> stratum_schema::ObjectSchema {
    object()
        .field("username", string().min(2))
        .field("password", string().min(2).max(4))
}

// ============================================================================
// Login example
// ============================================================================

#[test]
fn test_login_accepts_valid_credentials() {
    let input = json!({"username": "us", "password": "***7"});
    assert_eq!(login().safe_parse(&input).unwrap(), input);
}

#[test]
fn test_login_reports_both_fields() {
    let err = login()
        .safe_parse(&json!({"username": "u", "password": "toolong"}))
        .unwrap_err();
    assert_eq!(err.len(), 2);

    let username = &err.errors()[0];
    assert_eq!(username.path, issue_path!["username"]);
    assert_eq!(
        username.code,
        IssueCode::TooSmall {
            minimum: Bound::Int(2),
            inclusive: true,
            kind: SizeKind::String
        }
    );

    let password = &err.errors()[1];
    assert_eq!(password.path, issue_path!["password"]);
    assert_eq!(password.message, "String must contain at most 4 character(s)");
}

// ============================================================================
// Paths and omission
// ============================================================================

#[test]
fn test_nested_issue_path() {
    let schema = object().field("a", array(object().field("b", string().min(5))));
    let err = schema.safe_parse(&json!({"a": [{"b": "x"}]})).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors()[0].path, issue_path!["a", 0, "b"]);
}

#[test]
fn test_missing_field_is_invalid_type() {
    let err = object()
        .field("x", string())
        .safe_parse(&json!({}))
        .unwrap_err();
    assert_eq!(err.errors()[0].path, issue_path!["x"]);
    assert_eq!(err.errors()[0].message, "Expected string, received undefined");
}

#[test]
fn test_tolerant_field_is_absent_from_output() {
    let output = object()
        .field("x", string().optional())
        .safe_parse(&json!({}))
        .unwrap();
    assert!(output.as_object().unwrap().get("x").is_none());
}

#[test]
fn test_strict_unknown_keys() {
    let err = object()
        .field("a", number())
        .strict()
        .safe_parse(&json!({"a": 1, "b": 2}))
        .unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(
        err.errors()[0].code,
        IssueCode::UnrecognizedKeys {
            keys: vec!["b".to_string()]
        }
    );
}

#[test]
fn test_array_cardinality() {
    let err = array(string()).min(2).safe_parse(&json!(["x"])).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(
        err.errors()[0].code,
        IssueCode::TooSmall {
            minimum: Bound::Int(2),
            inclusive: true,
            kind: SizeKind::Array
        }
    );
}

// A regression to first-failure short-circuiting would drop the later issues.
#[test]
fn test_checks_accumulate_across_tree() {
    let schema = object()
        .field("email", string().min(10).email())
        .field("tags", array(string().max(2)).max(1));
    let err = schema
        .safe_parse(&json!({"email": "nope", "tags": ["abc", "de", "fgh"]}))
        .unwrap_err();
    let summary: Vec<(Vec<PathSegment>, &str)> = err
        .errors()
        .iter()
        .map(|i| (i.path.clone(), i.code_name()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (issue_path!["email"], "too_small"),
            (issue_path!["email"], "invalid_string"),
            (issue_path!["tags"], "too_big"),
            (issue_path!["tags", 0], "too_big"),
            (issue_path!["tags", 2], "too_big"),
        ]
    );
}

// ============================================================================
// Key order
// ============================================================================

fn keys(value: &serde_json::Value) -> Vec<&str> {
    value.as_object().unwrap().keys().map(String::as_str).collect()
}

#[test]
fn test_output_follows_declared_shape_order() {
    let schema = object().field("zeta", string()).field("alpha", string());
    let output = schema
        .safe_parse(&json!({"alpha": "a", "zeta": "z"}))
        .unwrap();
    assert_eq!(keys(&output), vec!["zeta", "alpha"]);
}

#[test]
fn test_passthrough_keeps_input_order() {
    let input: serde_json::Value =
        serde_json::from_str(r#"{"m": 1, "zeta": 2, "b": 3, "a": 4}"#).unwrap();
    let output = object()
        .field("zeta", number())
        .passthrough()
        .safe_parse(&input)
        .unwrap();
    assert_eq!(keys(&output), vec!["zeta", "m", "b", "a"]);
}

#[test]
fn test_unrecognized_keys_keep_input_order() {
    let input: serde_json::Value =
        serde_json::from_str(r#"{"z": 1, "id": 2, "c": 3, "a": 4}"#).unwrap();
    let err = object()
        .field("id", number())
        .strict()
        .safe_parse(&input)
        .unwrap_err();
    assert_eq!(
        err.errors()[0].code,
        IssueCode::UnrecognizedKeys {
            keys: vec!["z".to_string(), "c".to_string(), "a".to_string()]
        }
    );
}

// ============================================================================
// Error shapes
// ============================================================================

#[test]
fn test_format_and_flatten_from_parse() {
    let err = login()
        .add(|v| v["username"] != v["password"], "must differ")
        .safe_parse(&json!({"username": "u", "password": "pw"}))
        .unwrap_err();

    let formatted = serde_json::to_value(err.format()).unwrap();
    assert_eq!(
        formatted,
        json!({
            "_errors": [],
            "username": {"_errors": ["String must contain at least 2 character(s)"]}
        })
    );

    let err = login()
        .add(|v| v["username"] != v["password"], "must differ")
        .safe_parse(&json!({"username": "same", "password": "same"}))
        .unwrap_err();
    let flattened = err.flatten();
    assert_eq!(flattened.form_errors, vec!["must differ".to_string()]);
    assert!(flattened.field_errors.is_empty());
}

// ============================================================================
// Messages
// ============================================================================

#[test]
fn test_check_message_overrides_maps() {
    let err = string()
        .min(3)
        .message("too short")
        .into_schema()
        .safe_parse_with(
            &json!("a"),
            ParseParams::new().error_map(|_, _| "contextual".to_string()),
        );
    assert_eq!(err.unwrap_err().errors()[0].message, "too short");
}

#[test]
fn test_contextual_map_and_base_path() {
    let err = string()
        .min(3)
        .into_schema()
        .safe_parse_with(
            &json!("a"),
            ParseParams::new()
                .path(issue_path!["form", "name"])
                .error_map(|issue, ctx| format!("{}: {}", issue.code.name(), ctx.default_error)),
        )
        .unwrap_err();
    let issue = &err.errors()[0];
    assert_eq!(issue.path, issue_path!["form", "name"]);
    assert_eq!(issue.message, "too_small: String must contain at least 3 character(s)");
}

#[test]
fn test_required_and_invalid_type_shorthands() {
    let schema = object().field(
        "name",
        string()
            .params(
                Params::new()
                    .required_error("name is required")
                    .invalid_type_error("name must be text"),
            )
            .unwrap(),
    );
    let missing = schema.safe_parse(&json!({})).unwrap_err();
    assert_eq!(missing.errors()[0].message, "name is required");
    let wrong = schema.safe_parse(&json!({"name": 1})).unwrap_err();
    assert_eq!(wrong.errors()[0].message, "name must be text");
}

#[test]
fn test_error_map_conflict() {
    let result = string().params(
        Params::new()
            .error_map(|_, ctx| ctx.default_error.to_string())
            .invalid_type_error("x"),
    );
    assert!(matches!(result, Err(SchemaError::ErrorMapConflict)));
}

#[test]
fn test_schema_map_applies_to_own_node_only() {
    let schema = object()
        .field("inner", string())
        .params(Params::new().error_map(|_, _| "object map".to_string()))
        .unwrap();
    let err = schema.safe_parse(&json!({"inner": 1})).unwrap_err();
    assert_eq!(err.errors()[0].message, "Expected string, received number");
    let err = schema.safe_parse(&json!(1)).unwrap_err();
    assert_eq!(err.errors()[0].message, "object map");
}

// ============================================================================
// Typed output
// ============================================================================

#[derive(Debug, Deserialize, PartialEq)]
struct Login {
    username: String,
    password: String,
}

#[test]
fn test_parse_as() {
    let login_value: Login = login()
        .parse_as(&json!({"username": "ada", "password": "pw", "extra": true}))
        .unwrap();
    assert_eq!(
        login_value,
        Login {
            username: "ada".into(),
            password: "pw".into()
        }
    );

    let err = login().parse_as::<Login>(&json!({})).unwrap_err();
    assert_eq!(err.validation().map(|e| e.len()), Some(2));

    let mismatch = string().parse_as::<u32>(&json!("abc")).unwrap_err();
    assert!(matches!(mismatch, ParseError::Deserialize(_)));
}
