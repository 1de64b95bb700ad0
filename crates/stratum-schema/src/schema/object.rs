use super::{evaluate, Schema};
use crate::context::{Ctx, Mode};
use crate::error_map::Def;
use crate::issue::{IssueCode, IssueData, ValueKind};
use crate::status::{merge_object, Outcome, Pair, Status};
use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// What happens to input keys the shape does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop them from the output.
    #[default]
    Strip,
    /// Report them in one `unrecognized_keys` issue.
    Strict,
    /// Copy them to the output unvalidated.
    Passthrough,
}

/// How a `null` or absent object input is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingObject {
    /// Validate the fields against an empty object, so a shape whose fields
    /// all tolerate absence still succeeds.
    #[default]
    Empty,
    /// Reject with `invalid_type`.
    Reject,
}

/// Object schema with an ordered shape.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub(crate) def: Def,
    shape: IndexMap<String, Schema>,
    unknown_keys: UnknownKeys,
    missing: MissingObject,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shape(shape: IndexMap<String, Schema>) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Declare a field; redeclaring replaces the schema in place.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.shape.insert(key.into(), schema.into());
        self
    }

    pub fn shape(&self) -> &IndexMap<String, Schema> {
        &self.shape
    }

    /// Add or replace fields from another shape.
    #[must_use]
    pub fn extend(mut self, shape: IndexMap<String, Schema>) -> Self {
        self.shape.extend(shape);
        self
    }

    /// Add or replace the fields of `other`, adopting its unknown-key policy.
    #[must_use]
    pub fn merge(self, other: &ObjectSchema) -> Self {
        let mut merged = self.extend(other.shape.clone());
        merged.unknown_keys = other.unknown_keys;
        merged
    }

    /// Keep only `keys`.
    #[must_use]
    pub fn pick(mut self, keys: &[&str]) -> Self {
        self.shape.retain(|key, _| keys.contains(&key.as_str()));
        self
    }

    /// Drop `keys`.
    #[must_use]
    pub fn omit(mut self, keys: &[&str]) -> Self {
        self.shape.retain(|key, _| !keys.contains(&key.as_str()));
        self
    }

    #[must_use]
    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    #[must_use]
    pub fn strip(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strip;
        self
    }

    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Passthrough;
        self
    }

    #[must_use]
    pub fn missing(mut self, policy: MissingObject) -> Self {
        self.missing = policy;
        self
    }

    pub(crate) async fn evaluate(&self, data: Option<Value>, ctx: Ctx) -> Outcome {
        let object = match data {
            Some(Value::Object(object)) => object,
            None | Some(Value::Null) if self.missing == MissingObject::Empty => Map::new(),
            other => {
                ctx.add_issue(
                    other.as_ref(),
                    IssueData::new(IssueCode::InvalidType {
                        expected: ValueKind::Object,
                        received: ValueKind::of(other.as_ref()),
                    }),
                );
                return Outcome::Aborted;
            }
        };

        let fields = self.shape.iter().map(|(key, schema)| {
            let value = object.get(key).cloned();
            evaluate(schema, value, ctx.child(key.as_str()))
        });
        let outcomes = match ctx.mode() {
            Mode::Sync => {
                let mut outcomes = Vec::with_capacity(self.shape.len());
                for field in fields {
                    outcomes.push(field.await);
                }
                outcomes
            }
            Mode::Async => join_all(fields).await,
        };

        let mut pairs: Vec<Pair> = self
            .shape
            .keys()
            .zip(outcomes)
            .map(|(key, outcome)| Pair {
                key: key.clone(),
                always_set: object.contains_key(key),
                outcome,
            })
            .collect();

        let mut status = Status::Valid;
        match self.unknown_keys {
            UnknownKeys::Strip => {}
            UnknownKeys::Passthrough => {
                for (key, value) in &object {
                    if !self.shape.contains_key(key) {
                        pairs.push(Pair {
                            key: key.clone(),
                            outcome: Outcome::Valid(Some(value.clone())),
                            always_set: true,
                        });
                    }
                }
            }
            UnknownKeys::Strict => {
                let keys: Vec<String> = object
                    .keys()
                    .filter(|key| !self.shape.contains_key(*key))
                    .cloned()
                    .collect();
                if !keys.is_empty() {
                    ctx.add_issue(
                        Some(&Value::Object(object)),
                        IssueData::new(IssueCode::UnrecognizedKeys { keys }),
                    );
                    status.dirty();
                }
            }
        }

        merge_object(status, pairs)
    }
}
