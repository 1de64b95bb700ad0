//! Bridges between drafts and plain Rust types.
//!
//! Types that derive `Drafted` get a generated view over a [`Draft`] with one
//! accessor per field; everything else can still be read and written through
//! serde with [`Draft::read`] and [`Draft::write`].

use crate::{Draft, DraftResult, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A type with a generated draft view.
///
/// Usually implemented with `#[derive(Drafted)]`:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Drafted)]
/// struct Todo {
///     title: String,
///     done: bool,
/// }
///
/// manage(base, |draft| {
///     let todo = draft.typed::<Todo>();
///     todo.set_done(true)
/// })?;
/// ```
pub trait Drafted: Serialize + DeserializeOwned {
    /// The view type, borrowing the draft's scope.
    type Draft<'s>;

    /// Wrap a draft of a value of this type.
    fn wrap<'s>(draft: Draft<'s>) -> Self::Draft<'s>;

    /// Deserialize from a [`Value`].
    fn from_value(value: &Value) -> DraftResult<Self> {
        from_value(value)
    }

    /// Serialize into a [`Value`].
    fn to_value(&self) -> DraftResult<Value> {
        to_value(self)
    }
}

/// Serialize any value into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> DraftResult<Value> {
    Ok(Value::from(serde_json::to_value(value)?))
}

/// Deserialize a [`Value`] into any type.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> DraftResult<T> {
    Ok(serde_json::from_value(value.to_json())?)
}
