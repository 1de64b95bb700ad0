use super::{evaluate, Schema};
use crate::context::{Ctx, Mode, RefinementCtx};
use crate::error_map::Def;
use crate::issue::IssueData;
use crate::status::Outcome;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type RefineFn = Arc<dyn Fn(&Value, &mut RefinementCtx) + Send + Sync>;
type AsyncCheckFn = Arc<dyn Fn(Value) -> BoxFuture<'static, bool> + Send + Sync>;
type ConvertFn = Arc<dyn Fn(Value, &mut RefinementCtx) -> Value + Send + Sync>;
type AsyncConvertFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Value> + Send + Sync>;
type PreprocessFn = Arc<dyn Fn(Option<Value>) -> Option<Value> + Send + Sync>;

#[derive(Clone)]
enum Effect {
    Refinement(RefineFn),
    AsyncRefinement { check: AsyncCheckFn, message: String },
    Convert(ConvertFn),
    AsyncConvert(AsyncConvertFn),
    Preprocess(PreprocessFn),
}

impl Effect {
    fn name(&self) -> &'static str {
        match self {
            Effect::Refinement(_) => "refinement",
            Effect::AsyncRefinement { .. } => "async_refinement",
            Effect::Convert(_) => "convert",
            Effect::AsyncConvert(_) => "async_convert",
            Effect::Preprocess(_) => "preprocess",
        }
    }
}

/// A schema with a refinement, conversion or preprocessing step attached.
///
/// Refinements run on the inner output and may add issues; the value passes
/// through unchanged. Conversions run only when the inner schema produced a
/// valid output, and their result becomes the output. Neither runs when the
/// inner output is absent.
#[derive(Clone)]
pub struct EffectSchema {
    pub(crate) def: Def,
    inner: Schema,
    effect: Effect,
}

impl fmt::Debug for EffectSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectSchema")
            .field("effect", &self.effect.name())
            .field("inner", &self.inner)
            .finish()
    }
}

impl EffectSchema {
    fn new(inner: impl Into<Schema>, effect: Effect) -> Self {
        Self {
            def: Def::default(),
            inner: inner.into(),
            effect,
        }
    }

    pub fn inner(&self) -> &Schema {
        &self.inner
    }

    pub(crate) fn refinement<F>(inner: impl Into<Schema>, refine: F) -> Self
    where
        F: Fn(&Value, &mut RefinementCtx) + Send + Sync + 'static,
    {
        Self::new(inner, Effect::Refinement(Arc::new(refine)))
    }

    pub(crate) fn async_refinement<F, Fut>(inner: impl Into<Schema>, check: F, message: String) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let check: AsyncCheckFn = Arc::new(move |value| check(value).boxed());
        Self::new(inner, Effect::AsyncRefinement { check, message })
    }

    pub(crate) fn convert<F>(inner: impl Into<Schema>, convert: F) -> Self
    where
        F: Fn(Value, &mut RefinementCtx) -> Value + Send + Sync + 'static,
    {
        Self::new(inner, Effect::Convert(Arc::new(convert)))
    }

    pub(crate) fn async_convert<F, Fut>(inner: impl Into<Schema>, convert: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Value> + Send + 'static,
    {
        let convert: AsyncConvertFn = Arc::new(move |value| convert(value).boxed());
        Self::new(inner, Effect::AsyncConvert(convert))
    }

    pub(crate) fn preprocess<F>(inner: impl Into<Schema>, transform: F) -> Self
    where
        F: Fn(Option<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        Self::new(inner, Effect::Preprocess(Arc::new(transform)))
    }

    pub(crate) async fn evaluate(&self, data: Option<Value>, ctx: Ctx) -> Outcome {
        if let Effect::Preprocess(transform) = &self.effect {
            return evaluate(&self.inner, transform(data), ctx).await;
        }

        if ctx.mode() == Mode::Sync
            && matches!(
                self.effect,
                Effect::AsyncRefinement { .. } | Effect::AsyncConvert(_)
            )
        {
            panic!(
                "{} effect encountered during a synchronous parse; use `validate().await`",
                self.effect.name()
            );
        }

        let inner = evaluate(&self.inner, data.clone(), ctx.clone()).await;
        match &self.effect {
            Effect::Refinement(refine) => {
                let mut status = inner.status();
                if status.is_aborted() {
                    return Outcome::Aborted;
                }
                let value = inner.into_value();
                if let Some(value) = &value {
                    let mut refinement = RefinementCtx::new(ctx, data);
                    refine(value, &mut refinement);
                    status.absorb(refinement.status());
                }
                status.with(value)
            }
            Effect::AsyncRefinement { check, message } => {
                let mut status = inner.status();
                if status.is_aborted() {
                    return Outcome::Aborted;
                }
                let value = inner.into_value();
                if let Some(value) = &value {
                    if !check(value.clone()).await {
                        let mut refinement = RefinementCtx::new(ctx, data);
                        refinement.add_issue(IssueData::custom(message.clone()));
                        status.absorb(refinement.status());
                    }
                }
                status.with(value)
            }
            Effect::Convert(convert) => match inner {
                Outcome::Valid(Some(value)) => {
                    let mut conversion = RefinementCtx::new(ctx, data);
                    let converted = convert(value, &mut conversion);
                    conversion.status().with(Some(converted))
                }
                other => other,
            },
            Effect::AsyncConvert(convert) => match inner {
                Outcome::Valid(Some(value)) => Outcome::Valid(Some(convert(value).await)),
                other => other,
            },
            Effect::Preprocess(_) => unreachable!("handled above"),
        }
    }
}
