//! Immutable state updates and schema validation for JSON-like data.
//!
//! This crate bundles two independent engines:
//!
//! - [`state`]: copy-on-write drafts. A recipe edits a [`Draft`] as if it
//!   were mutable; the result shares every untouched subtree with the base
//!   and can be recorded as [`Patch`]es.
//! - [`schema`]: composable schemas that validate a value and report every
//!   problem as a path-tagged [`Issue`].
//!
//! A common pairing validates untrusted input first and then folds it into
//! held state:
//!
//! ```
//! use serde_json::json;
//! use stratum::prelude::*;
//!
//! let todo = object()
//!     .field("title", string().trim().min(1))
//!     .field("done", boolean().default_value(false));
//!
//! let input = todo.safe_parse(&json!({"title": "  ship it "})).unwrap();
//!
//! let base = Value::from(json!({"todos": []}));
//! let next = manage(base, |draft| draft.draft("todos")?.push(input)).unwrap();
//! assert_eq!(next, json!({"todos": [{"title": "ship it", "done": false}]}));
//! ```

pub use stratum_schema as schema;
pub use stratum_state as state;

pub use stratum_schema::{Issue, Schema, SchemaExt, ValidationError};
pub use stratum_state::{manage, produce, Draft, DraftError, Patch, Store, Value};

pub use stratum_state::Drafted;

pub mod prelude;
