//! Composable schemas that validate JSON values and report every problem.
//!
//! A schema is built from constructors ([`string`], [`number`], [`array`],
//! [`object`], ...) and chainable modifiers. Validating never stops at the
//! first failure: each failing check records an [`Issue`] with a code, the
//! path to the offending value and a message, and evaluation continues as
//! far as the data allows.
//!
//! # Quick Start
//!
//! ```
//! use serde_json::json;
//! use stratum_schema::{object, string, SchemaExt};
//!
//! let login = object()
//!     .field("username", string().min(2))
//!     .field("password", string().min(2).max(4));
//!
//! let ok = login.safe_parse(&json!({"username": "us", "password": "***7"}));
//! assert_eq!(ok.unwrap(), json!({"username": "us", "password": "***7"}));
//!
//! let err = login
//!     .safe_parse(&json!({"username": "u", "password": "toolong"}))
//!     .unwrap_err();
//! let codes: Vec<_> = err.errors().iter().map(|i| i.code_name()).collect();
//! assert_eq!(codes, ["too_small", "too_big"]);
//! ```
//!
//! # Status
//!
//! Each node finishes as valid, dirty (issues recorded, value still usable by
//! the parent) or aborted (no value). Arrays and objects take the worst
//! status of their parts. A parse call succeeds only when the root is valid.
//!
//! # Sync and async
//!
//! [`Schema::safe_parse`] evaluates synchronously and panics if it reaches an
//! async effect ([`SchemaExt::add_async`], [`SchemaExt::convert_async`]).
//! [`Schema::validate`] awaits such effects and evaluates sibling elements
//! concurrently. For schemas without async effects both give the same
//! result.
//!
//! # Messages
//!
//! Messages come from the explicit message of a check, then the per-call map
//! in [`ParseParams`], the schema's map from [`Params`], the process-wide map
//! ([`set_error_map`]) and finally built-in English text.

mod context;
mod error;
mod error_map;
mod issue;
mod schema;
mod status;
mod validation_error;

pub use context::{Mode, ParseParams, RefinementCtx};
pub use error::{ParseError, SchemaError};
pub use error_map::{default_message, reset_error_map, set_error_map, ErrorMap, ErrorMapCtx, Params};
pub use issue::{
    Bound, Issue, IssueCode, IssueData, PathSegment, SizeKind, StringValidation, ValueKind,
};
pub use schema::{
    array, boolean, number, object, preprocess, string, union, ArraySchema, BooleanSchema,
    DefaultSchema, EffectSchema, MissingObject, NullableSchema, NumberSchema, ObjectSchema,
    OptionalSchema, Schema, SchemaExt, StringSchema, UnionSchema, UnknownKeys,
};
pub use status::{merge_array, merge_object, Outcome, Pair, Status};
pub use validation_error::{FlattenedError, FormattedError, ValidationError};
