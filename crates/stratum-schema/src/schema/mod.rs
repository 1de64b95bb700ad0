//! Schema nodes and the evaluator that walks them.
//!
//! [`Schema`] is a closed enum over the node kinds. Builders live on the
//! concrete node types ([`StringSchema::min`], [`ObjectSchema::strict`], ...)
//! and consume `self`, so a schema value is never changed after another
//! schema starts referring to it. Composition shared by every kind
//! (`optional`, `array`, `add`, `convert`, ...) comes from [`SchemaExt`].
//!
//! One algorithm body serves both entry points: [`Schema::validate`] awaits
//! it, [`Schema::safe_parse`] polls it once and requires it to be ready.

mod array;
mod boolean;
mod effect;
mod number;
mod object;
mod string;
mod union;
mod wrap;

pub use array::ArraySchema;
pub use boolean::BooleanSchema;
pub use effect::EffectSchema;
pub use number::NumberSchema;
pub use object::{MissingObject, ObjectSchema, UnknownKeys};
pub use string::StringSchema;
pub use union::UnionSchema;
pub use wrap::{DefaultSchema, NullableSchema, OptionalSchema};

use crate::context::{Ctx, Mode, ParseParams, RefinementCtx};
use crate::error::ParseError;
use crate::issue::{Bound, IssueCode, SizeKind};
use crate::status::Outcome;
use crate::validation_error::ValidationError;
use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A schema node.
#[derive(Clone)]
pub enum Schema {
    String(Arc<StringSchema>),
    Number(Arc<NumberSchema>),
    Boolean(Arc<BooleanSchema>),
    Array(Arc<ArraySchema>),
    Object(Arc<ObjectSchema>),
    Union(Arc<UnionSchema>),
    Optional(Arc<OptionalSchema>),
    Nullable(Arc<NullableSchema>),
    Default(Arc<DefaultSchema>),
    Effect(Arc<EffectSchema>),
}

impl Schema {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Schema::String(_) => "string",
            Schema::Number(_) => "number",
            Schema::Boolean(_) => "boolean",
            Schema::Array(_) => "array",
            Schema::Object(_) => "object",
            Schema::Union(_) => "union",
            Schema::Optional(_) => "optional",
            Schema::Nullable(_) => "nullable",
            Schema::Default(_) => "default",
            Schema::Effect(_) => "effect",
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.def().description.as_deref()
    }

    fn def(&self) -> &crate::error_map::Def {
        match self {
            Schema::String(s) => &s.def,
            Schema::Number(s) => &s.def,
            Schema::Boolean(s) => &s.def,
            Schema::Array(s) => &s.def,
            Schema::Object(s) => &s.def,
            Schema::Union(s) => &s.def,
            Schema::Optional(s) => &s.def,
            Schema::Nullable(s) => &s.def,
            Schema::Default(s) => &s.def,
            Schema::Effect(s) => &s.def,
        }
    }

    /// Validate synchronously.
    ///
    /// # Panics
    ///
    /// When the schema contains an async effect; use
    /// [`validate`](Self::validate) for those.
    pub fn safe_parse(&self, data: &Value) -> Result<Value, ValidationError> {
        self.safe_parse_with(data, ParseParams::default())
    }

    pub fn safe_parse_with(
        &self,
        data: &Value,
        params: ParseParams,
    ) -> Result<Value, ValidationError> {
        self.run(data.clone(), Mode::Sync, params)
            .now_or_never()
            .unwrap_or_else(|| {
                panic!("synchronous parse did not complete; use `validate().await` for async schemas")
            })
    }

    /// Validate synchronously and deserialize the output into `T`.
    pub fn parse_as<T: DeserializeOwned>(&self, data: &Value) -> Result<T, ParseError> {
        let output = self.safe_parse(data)?;
        Ok(serde_json::from_value(output)?)
    }

    /// Validate, awaiting async effects. Sibling array elements, object
    /// members and union options are evaluated concurrently.
    pub async fn validate(&self, data: &Value) -> Result<Value, ValidationError> {
        self.validate_with(data, ParseParams::default()).await
    }

    pub async fn validate_with(
        &self,
        data: &Value,
        params: ParseParams,
    ) -> Result<Value, ValidationError> {
        self.run(data.clone(), Mode::Async, params).await
    }

    pub async fn validate_as<T: DeserializeOwned>(&self, data: &Value) -> Result<T, ParseError> {
        let output = self.validate(data).await?;
        Ok(serde_json::from_value(output)?)
    }

    async fn run(
        &self,
        data: Value,
        mode: Mode,
        params: ParseParams,
    ) -> Result<Value, ValidationError> {
        let ctx = Ctx::root(mode, params);
        tracing::debug!(schema = self.kind_name(), ?mode, "validation started");

        let outcome = evaluate(self, Some(data), ctx.clone()).await;
        let issues = ctx.take_issues();
        tracing::debug!(
            status = ?outcome.status(),
            issues = issues.len(),
            "validation finished"
        );

        match outcome {
            Outcome::Valid(value) => Ok(value.unwrap_or(Value::Null)),
            Outcome::Dirty(value) if issues.is_empty() => Ok(value.unwrap_or(Value::Null)),
            Outcome::Aborted if issues.is_empty() => {
                panic!("validation aborted without recording an issue")
            }
            _ => Err(ValidationError::new(issues)),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::String(s) => fmt::Debug::fmt(s, f),
            Schema::Number(s) => fmt::Debug::fmt(s, f),
            Schema::Boolean(s) => fmt::Debug::fmt(s, f),
            Schema::Array(s) => fmt::Debug::fmt(s, f),
            Schema::Object(s) => fmt::Debug::fmt(s, f),
            Schema::Union(s) => fmt::Debug::fmt(s, f),
            Schema::Optional(s) => fmt::Debug::fmt(s, f),
            Schema::Nullable(s) => fmt::Debug::fmt(s, f),
            Schema::Default(s) => fmt::Debug::fmt(s, f),
            Schema::Effect(s) => fmt::Debug::fmt(s, f),
        }
    }
}

macro_rules! impl_into_schema {
    ($($variant:ident => $ty:ty),* $(,)?) => {$(
        impl From<$ty> for Schema {
            fn from(schema: $ty) -> Self {
                Schema::$variant(Arc::new(schema))
            }
        }
    )*};
}

impl_into_schema! {
    String => StringSchema,
    Number => NumberSchema,
    Boolean => BooleanSchema,
    Array => ArraySchema,
    Object => ObjectSchema,
    Union => UnionSchema,
    Optional => OptionalSchema,
    Nullable => NullableSchema,
    Default => DefaultSchema,
    Effect => EffectSchema,
}

/// `params`, `describe` and `description` for every concrete node type.
macro_rules! impl_def_builders {
    ($($ty:ty),* $(,)?) => {$(
        impl $ty {
            /// Apply message options.
            pub fn params(
                mut self,
                params: $crate::error_map::Params,
            ) -> Result<Self, $crate::error::SchemaError> {
                let def = $crate::error_map::Def::from_params(params)?;
                self.def.error_map = def.error_map;
                if def.description.is_some() {
                    self.def.description = def.description;
                }
                Ok(self)
            }

            #[must_use]
            pub fn describe(mut self, description: impl Into<String>) -> Self {
                self.def.description = Some(description.into());
                self
            }

            pub fn description(&self) -> Option<&str> {
                self.def.description.as_deref()
            }
        }
    )*};
}

impl_def_builders! {
    StringSchema,
    NumberSchema,
    BooleanSchema,
    ArraySchema,
    ObjectSchema,
    UnionSchema,
    OptionalSchema,
    NullableSchema,
    DefaultSchema,
    EffectSchema,
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluate one node. `None` is an absent input.
pub(crate) fn evaluate(schema: &Schema, data: Option<Value>, ctx: Ctx) -> BoxFuture<'_, Outcome> {
    let ctx = ctx.for_node(schema.def().error_map.as_ref());
    match schema {
        Schema::String(s) => futures::future::ready(s.check(data, &ctx)).boxed(),
        Schema::Number(s) => futures::future::ready(s.check(data, &ctx)).boxed(),
        Schema::Boolean(s) => futures::future::ready(s.check(data, &ctx)).boxed(),
        Schema::Array(s) => s.evaluate(data, ctx).boxed(),
        Schema::Object(s) => s.evaluate(data, ctx).boxed(),
        Schema::Union(s) => s.evaluate(data, ctx).boxed(),
        Schema::Optional(s) => s.evaluate(data, ctx),
        Schema::Nullable(s) => s.evaluate(data, ctx),
        Schema::Default(s) => s.evaluate(data, ctx),
        Schema::Effect(s) => s.evaluate(data, ctx).boxed(),
    }
}

/// A check plus its explicit message.
#[derive(Debug, Clone)]
pub(crate) struct Check<K> {
    pub(crate) kind: K,
    pub(crate) message: Option<String>,
}

impl<K> Check<K> {
    pub(crate) fn new(kind: K) -> Self {
        Self {
            kind,
            message: None,
        }
    }
}

/// Set the message of the most recently added check.
pub(crate) fn set_last_message<K>(checks: &mut [Check<K>], message: String) {
    if let Some(last) = checks.last_mut() {
        last.message = Some(message);
    }
}

/// Length bound shared by strings and arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizeCheck {
    Min(usize),
    Max(usize),
    Length(usize),
}

impl SizeCheck {
    /// The issue for `len`, if it violates the bound.
    pub(crate) fn violation(self, len: usize, kind: SizeKind) -> Option<IssueCode> {
        match self {
            SizeCheck::Min(min) | SizeCheck::Length(min) if len < min => {
                Some(IssueCode::TooSmall {
                    minimum: Bound::from(min),
                    inclusive: true,
                    kind,
                })
            }
            SizeCheck::Max(max) | SizeCheck::Length(max) if len > max => Some(IssueCode::TooBig {
                maximum: Bound::from(max),
                inclusive: true,
                kind,
            }),
            _ => None,
        }
    }
}

// ============================================================================
// Composition
// ============================================================================

/// Composition available on every schema type.
pub trait SchemaExt: Into<Schema> + Clone {
    /// Accept an absent input, producing an absent output.
    fn optional(self) -> OptionalSchema {
        OptionalSchema::new(self)
    }

    /// Accept `null`.
    fn nullable(self) -> NullableSchema {
        NullableSchema::new(self)
    }

    /// Replace an absent input with `value` before validating.
    fn default_value(self, value: impl Into<Value>) -> DefaultSchema {
        DefaultSchema::new(self, value.into())
    }

    /// An array of this schema.
    fn array(self) -> ArraySchema {
        ArraySchema::new(self)
    }

    /// A union of this schema and `other`.
    fn or(self, other: impl Into<Schema>) -> UnionSchema {
        UnionSchema::new(vec![self.into(), other.into()])
    }

    /// Record a `custom` issue with `message` when `check` fails.
    fn add<F>(self, check: F, message: impl Into<String>) -> EffectSchema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        self.super_refine(move |value, ctx| {
            if !check(value) {
                ctx.add_issue(crate::issue::IssueData::custom(message.clone()));
            }
        })
    }

    /// Refine with full control over the recorded issues.
    fn super_refine<F>(self, refine: F) -> EffectSchema
    where
        F: Fn(&Value, &mut RefinementCtx) + Send + Sync + 'static,
    {
        EffectSchema::refinement(self, refine)
    }

    /// Like [`add`](Self::add) with an async check. Requires
    /// [`Schema::validate`].
    fn add_async<F, Fut>(self, check: F, message: impl Into<String>) -> EffectSchema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        EffectSchema::async_refinement(self, check, message.into())
    }

    /// Map a valid output to a new value.
    fn convert<F>(self, convert: F) -> EffectSchema
    where
        F: Fn(Value, &mut RefinementCtx) -> Value + Send + Sync + 'static,
    {
        EffectSchema::convert(self, convert)
    }

    /// Like [`convert`](Self::convert) with an async function. Requires
    /// [`Schema::validate`].
    fn convert_async<F, Fut>(self, convert: F) -> EffectSchema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        EffectSchema::async_convert(self, convert)
    }

    fn into_schema(self) -> Schema {
        self.into()
    }

    fn safe_parse(&self, data: &Value) -> Result<Value, ValidationError> {
        self.clone().into_schema().safe_parse(data)
    }

    fn parse_as<T: DeserializeOwned>(&self, data: &Value) -> Result<T, ParseError> {
        self.clone().into_schema().parse_as(data)
    }

    fn validate(&self, data: &Value) -> impl Future<Output = Result<Value, ValidationError>> + Send {
        let schema = self.clone().into_schema();
        let data = data.clone();
        async move { schema.validate(&data).await }
    }
}

impl<T: Into<Schema> + Clone> SchemaExt for T {}

// ============================================================================
// Constructors
// ============================================================================

pub fn string() -> StringSchema {
    StringSchema::new()
}

pub fn number() -> NumberSchema {
    NumberSchema::new()
}

pub fn boolean() -> BooleanSchema {
    BooleanSchema::new()
}

pub fn array(element: impl Into<Schema>) -> ArraySchema {
    ArraySchema::new(element)
}

/// An object schema with no fields; add them with [`ObjectSchema::field`].
pub fn object() -> ObjectSchema {
    ObjectSchema::new()
}

pub fn union(options: Vec<Schema>) -> UnionSchema {
    UnionSchema::new(options)
}

/// Rewrite the raw input before `schema` sees it. `None` is an absent input.
pub fn preprocess<F>(transform: F, schema: impl Into<Schema>) -> EffectSchema
where
    F: Fn(Option<Value>) -> Option<Value> + Send + Sync + 'static,
{
    EffectSchema::preprocess(schema, transform)
}
