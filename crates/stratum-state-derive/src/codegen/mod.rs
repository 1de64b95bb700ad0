//! Code generation for the Drafted derive macro.

mod draft_view;
mod utils;

use crate::field_kind::FieldKind;
use crate::parse::DraftedInput;
use darling::FromDeriveInput;
use proc_macro2::TokenStream;
use syn::DeriveInput;

/// Main entry point for code generation.
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let parsed = DraftedInput::from_derive_input(input)
        .map_err(|e| syn::Error::new_spanned(input, e.to_string()))?;

    if !parsed.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &parsed.generics,
            "#[derive(Drafted)] does not support generic structs",
        ));
    }

    for field in parsed.fields() {
        let kind = FieldKind::from_type(&field.ty, field.nested);
        if field.nested && matches!(kind, FieldKind::Vec(_) | FieldKind::Map) {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "#[stratum(nested)] supports plain and Option fields only; \
                 collections of nested values are read and written whole",
            ));
        }
        if field.skip && (field.nested || field.default.is_some() || field.rename.is_some()) {
            return Err(syn::Error::new_spanned(
                field.ident(),
                "#[stratum(skip)] cannot be combined with other field attributes",
            ));
        }
    }

    draft_view::generate(&parsed)
}
