//! Copy-on-write drafts over structurally shared values.
//!
//! `stratum-state` lets you write ordinary imperative edits against a
//! *draft* of an immutable value and get back a new value that shares every
//! untouched subtree with the original.
//!
//! # Core Concepts
//!
//! - **Value**: A JSON-like tree whose arrays and objects are reference-counted
//!   nodes, so clones are cheap and identity can be compared
//! - **Draft**: A handle intercepting reads and writes on one drafted container
//! - **Scope**: The bookkeeping for one recipe call; revoked when finalized
//! - **Manager**: Runs recipes (`manage`, `produce`) and optionally records patches
//! - **Patch**: A serializable record of operations, replayable with `apply_patch`
//! - **Store**: Shared state with commit history, undo and replay
//!
//! # Structural Sharing
//!
//! ```text
//! next = manage(base, recipe)
//! ```
//!
//! - A recipe that changes nothing returns `base` itself
//! - Only containers on a changed path are copied
//! - Results are frozen unless the manager disables auto-freeze
//!
//! # Quick Start
//!
//! ```
//! use stratum_state::{manage, path, Value};
//! use serde_json::json;
//!
//! let base = Value::from(json!({"todos": [{"title": "write", "done": false}], "filter": "all"}));
//!
//! let next = manage(base.clone(), |draft| {
//!     let todo = draft.draft("todos")?.draft(0)?;
//!     todo.set("done", true)
//! })
//! .unwrap();
//!
//! assert_eq!(next, json!({"todos": [{"title": "write", "done": true}], "filter": "all"}));
//! assert_eq!(base, json!({"todos": [{"title": "write", "done": false}], "filter": "all"}));
//! assert!(next.is_frozen());
//! ```
//!
//! # Patches
//!
//! ```
//! use stratum_state::{apply_patch, Manager, Value};
//! use serde_json::json;
//!
//! let base = Value::from(json!({"count": 1}));
//! let (next, forward, inverse) = Manager::new()
//!     .manage_with_patches(base.clone(), |draft| draft.set("count", 2))
//!     .unwrap();
//!
//! assert_eq!(apply_patch(&base, &forward).unwrap(), next);
//! assert_eq!(apply_patch(&next, &inverse).unwrap(), base);
//! ```
//!
//! # Using Typed Drafts (with derive macro)
//!
//! ```ignore
//! use stratum_state::{manage, Drafted};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize, Drafted)]
//! struct Counter {
//!     value: i64,
//!     label: String,
//! }
//!
//! let next = manage(base, |draft| {
//!     let counter = draft.typed::<Counter>();
//!     counter.set_value(counter.value()? + 1)?;
//!     counter.set_label("updated".to_string())
//! })?;
//! ```

mod apply;
mod draft;
mod error;
mod manager;
mod op;
mod patch;
mod path;
mod scope;
mod store;
mod typed;
mod value;

// Value model
pub use value::{freeze, is_draftable, same_value, Array, Map, Object, Opaque, Value};

// Paths and patches
pub use apply::{apply_patch, apply_patches};
pub use op::Op;
pub use patch::Patch;
pub use path::{Path, Seg};

// Drafting
pub use draft::{current, original, Draft, Field, IntoField};
pub use error::{DraftError, DraftResult};
pub use manager::{manage, produce, Manager, Produce};
pub use scope::Scope;
pub use typed::{from_value, to_value, Drafted};

// State holders
pub use store::{Commit, Reducer, Store, StoreError};

// Re-export derive macro when feature is enabled
#[cfg(feature = "derive")]
pub use stratum_state_derive::Drafted;
