//! Derive macro for the stratum-state `Drafted` trait.
//!
//! This crate provides `#[derive(Drafted)]`, which generates:
//! - `{Name}Draft<'s>`: a typed view over a `Draft<'s>` of the struct
//! - `impl Drafted for {Name}`
//!
//! # Usage
//!
//! ```ignore
//! use stratum_state::Drafted;
//!
//! #[derive(Serialize, Deserialize, Drafted)]
//! struct User {
//!     name: String,
//!     age: i64,
//!     #[stratum(nested)]
//!     profile: Profile,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod codegen;
mod field_kind;
mod parse;

/// Derive the `Drafted` trait for a struct with named fields.
///
/// The generated `{StructName}Draft<'s>` has, for every included field:
/// - `field()`: read the member through serde
/// - `set_field(value)`: serialize and assign the member
/// - `delete_field()`: remove the member
/// - `push_field(item)`: for `Vec` fields, append one element
///
/// # Field Attributes
///
/// - `#[stratum(rename = "json_name")]`: Use a different member name
/// - `#[stratum(default = "expr")]`: Value returned when the member is missing
/// - `#[stratum(skip)]`: No accessors for this field
/// - `#[stratum(nested)]`: The field type derives `Drafted` too; its getter
///   returns the nested view instead of a deserialized copy
///
/// # Examples
///
/// ```ignore
/// #[derive(Serialize, Deserialize, Drafted)]
/// struct Counter {
///     value: i64,
///     #[stratum(rename = "display_name")]
///     label: String,
/// }
///
/// manage(base, |draft| {
///     let counter = draft.typed::<Counter>();
///     counter.set_value(counter.value()? + 1)?;
///     counter.set_label("Updated".into())
/// })?;
/// ```
#[proc_macro_derive(Drafted, attributes(stratum))]
pub fn derive_drafted(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match codegen::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
