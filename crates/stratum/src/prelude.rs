//! Prelude for convenient imports.
//!
//! ```
//! use stratum::prelude::*;
//! ```
//!
//! `Value` here is the persistent [`stratum_state::Value`]; schemas take and
//! return `serde_json::Value`, and the two convert with `Value::from` and
//! [`Value::to_json`](stratum_state::Value::to_json).

// Drafting
pub use stratum_state::{
    apply_patch, current, freeze, manage, original, produce, Draft, DraftError, DraftResult,
    Manager, Patch, Store, Value,
};

pub use stratum_state::Drafted;

// Validation
pub use stratum_schema::{
    array, boolean, number, object, preprocess, string, union, IssueData, ParseParams, Params,
    RefinementCtx, Schema, SchemaExt, ValidationError,
};
