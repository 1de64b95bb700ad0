//! Draft view generation.
//!
//! Generates `{Name}Draft<'s>`, a typed wrapper over `stratum_state::Draft`
//! whose accessors read and write members through serde, and the matching
//! `Drafted` impl.

use super::utils::{extract_inner_type, parse_default};
use crate::field_kind::FieldKind;
use crate::parse::{DraftedInput, FieldInput};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Generate the view struct and the `Drafted` implementation.
pub fn generate(input: &DraftedInput) -> syn::Result<TokenStream> {
    let struct_name = &input.ident;
    let view_name = format_ident!("{}Draft", struct_name);
    let vis = &input.vis;

    let mut accessors = TokenStream::new();
    for field in input.fields().into_iter().filter(|f| f.is_included()) {
        accessors.extend(generate_read_method(field)?);
        accessors.extend(generate_write_methods(field));
    }

    let view_doc = format!("Typed draft view of [`{struct_name}`].");

    Ok(quote! {
        #[doc = #view_doc]
        #[derive(Clone, Copy, Debug)]
        #vis struct #view_name<'s> {
            draft: ::stratum_state::Draft<'s>,
        }

        impl<'s> #view_name<'s> {
            pub fn new(draft: ::stratum_state::Draft<'s>) -> Self {
                Self { draft }
            }

            /// The untyped draft behind this view.
            pub fn draft(&self) -> ::stratum_state::Draft<'s> {
                self.draft
            }

            /// Deserialize a snapshot of the draft's latest contents.
            pub fn current(&self) -> ::stratum_state::DraftResult<#struct_name> {
                ::stratum_state::from_value(&self.draft.current()?)
            }

            pub fn is_modified(&self) -> ::stratum_state::DraftResult<bool> {
                self.draft.is_modified()
            }

            #accessors
        }

        impl ::stratum_state::Drafted for #struct_name {
            type Draft<'s> = #view_name<'s>;

            fn wrap<'s>(draft: ::stratum_state::Draft<'s>) -> Self::Draft<'s> {
                #view_name::new(draft)
            }
        }
    })
}

/// Generate the getter for one field.
fn generate_read_method(field: &FieldInput) -> syn::Result<TokenStream> {
    let field_name = field.ident();
    let field_ty = &field.ty;
    let key = field.member_key();

    let method = match FieldKind::from_type(field_ty, field.nested) {
        FieldKind::Nested => quote! {
            /// Draft the nested member.
            pub fn #field_name(&self) -> ::stratum_state::DraftResult<<#field_ty as ::stratum_state::Drafted>::Draft<'s>> {
                self.draft
                    .draft(#key)
                    .map(<#field_ty as ::stratum_state::Drafted>::wrap)
            }
        },
        FieldKind::Option(inner) if inner.is_nested() => {
            let inner_ty = extract_inner_type(field_ty);
            quote! {
                /// Draft the nested member; `None` when it is missing or `null`.
                pub fn #field_name(&self) -> ::stratum_state::DraftResult<Option<<#inner_ty as ::stratum_state::Drafted>::Draft<'s>>> {
                    match self.draft.get(#key)? {
                        None => Ok(None),
                        Some(::stratum_state::Field::Value(::stratum_state::Value::Null)) => Ok(None),
                        Some(_) => self
                            .draft
                            .draft(#key)
                            .map(|d| Some(<#inner_ty as ::stratum_state::Drafted>::wrap(d))),
                    }
                }
            }
        }
        FieldKind::Option(_) => quote! {
            pub fn #field_name(&self) -> ::stratum_state::DraftResult<#field_ty> {
                self.draft.read_opt(#key)
            }
        },
        _ => match &field.default {
            Some(default) => {
                let expr = parse_default(default, field_ty)?;
                quote! {
                    /// Read the member, falling back to its default when missing.
                    pub fn #field_name(&self) -> ::stratum_state::DraftResult<#field_ty> {
                        match self.draft.get_value(#key)? {
                            None => Ok(#expr),
                            Some(value) => ::stratum_state::from_value(&value),
                        }
                    }
                }
            }
            None => quote! {
                pub fn #field_name(&self) -> ::stratum_state::DraftResult<#field_ty> {
                    self.draft.read(#key)
                }
            },
        },
    };

    Ok(method)
}

/// Generate `set_*`, `delete_*` and, for `Vec` fields, `push_*`.
fn generate_write_methods(field: &FieldInput) -> TokenStream {
    let field_name = field.ident();
    let field_ty = &field.ty;
    let key = field.member_key();
    let setter = format_ident!("set_{}", field_name);
    let deleter = format_ident!("delete_{}", field_name);

    let pusher = match FieldKind::from_type(field_ty, field.nested) {
        FieldKind::Vec(_) => {
            let item_ty = extract_inner_type(field_ty);
            let push_name = format_ident!("push_{}", field_name);
            quote! {
                /// Append one element, creating the array when missing.
                pub fn #push_name(&self, item: #item_ty) -> ::stratum_state::DraftResult<()> {
                    if !self.draft.has(#key)? {
                        self.draft.set(#key, ::stratum_state::Array::new())?;
                    }
                    self.draft.draft(#key)?.push(::stratum_state::to_value(&item)?)
                }
            }
        }
        _ => TokenStream::new(),
    };

    quote! {
        pub fn #setter(&self, value: #field_ty) -> ::stratum_state::DraftResult<()> {
            self.draft.write(#key, &value)
        }

        pub fn #deleter(&self) -> ::stratum_state::DraftResult<()> {
            self.draft.delete(#key)
        }

        #pusher
    }
}
