//! Wrappers that widen what an inner schema accepts.

use super::{evaluate, Schema};
use crate::context::Ctx;
use crate::error_map::Def;
use crate::status::Outcome;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

/// Accepts an absent input; anything else goes to the inner schema.
#[derive(Debug, Clone)]
pub struct OptionalSchema {
    pub(crate) def: Def,
    inner: Schema,
}

impl OptionalSchema {
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            def: Def::default(),
            inner: inner.into(),
        }
    }

    pub fn unwrap(&self) -> &Schema {
        &self.inner
    }

    pub(crate) fn evaluate(&self, data: Option<Value>, ctx: Ctx) -> BoxFuture<'_, Outcome> {
        match data {
            None => futures::future::ready(Outcome::Valid(None)).boxed(),
            data => evaluate(&self.inner, data, ctx),
        }
    }
}

/// Accepts `null`; anything else goes to the inner schema.
#[derive(Debug, Clone)]
pub struct NullableSchema {
    pub(crate) def: Def,
    inner: Schema,
}

impl NullableSchema {
    pub fn new(inner: impl Into<Schema>) -> Self {
        Self {
            def: Def::default(),
            inner: inner.into(),
        }
    }

    pub fn unwrap(&self) -> &Schema {
        &self.inner
    }

    pub(crate) fn evaluate(&self, data: Option<Value>, ctx: Ctx) -> BoxFuture<'_, Outcome> {
        match data {
            Some(Value::Null) => futures::future::ready(Outcome::Valid(Some(Value::Null))).boxed(),
            data => evaluate(&self.inner, data, ctx),
        }
    }
}

/// Substitutes a default for an absent input, then runs the inner schema.
#[derive(Debug, Clone)]
pub struct DefaultSchema {
    pub(crate) def: Def,
    inner: Schema,
    default: Value,
}

impl DefaultSchema {
    pub fn new(inner: impl Into<Schema>, default: Value) -> Self {
        Self {
            def: Def::default(),
            inner: inner.into(),
            default,
        }
    }

    pub fn fallback(&self) -> &Value {
        &self.default
    }

    pub(crate) fn evaluate(&self, data: Option<Value>, ctx: Ctx) -> BoxFuture<'_, Outcome> {
        let data = data.or_else(|| Some(self.default.clone()));
        evaluate(&self.inner, data, ctx)
    }
}
