//! Attribute parsing for the Drafted derive macro.

use darling::{ast, FromDeriveInput, FromField};
use syn::{Generics, Ident, Type, Visibility};

/// Parsed struct-level options.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(stratum), supports(struct_named))]
pub struct DraftedInput {
    pub ident: Ident,

    pub vis: Visibility,

    pub generics: Generics,

    pub data: ast::Data<(), FieldInput>,
}

impl DraftedInput {
    pub fn fields(&self) -> Vec<&FieldInput> {
        self.data
            .as_ref()
            .take_struct()
            .map(|s| s.fields.to_vec())
            .unwrap_or_default()
    }
}

/// Parsed field-level options.
#[derive(Debug, FromField)]
#[darling(attributes(stratum))]
pub struct FieldInput {
    pub ident: Option<Ident>,

    pub ty: Type,

    /// Member name in the drafted object.
    #[darling(default)]
    pub rename: Option<String>,

    /// Expression returned when the member is missing.
    #[darling(default)]
    pub default: Option<String>,

    #[darling(default)]
    pub skip: bool,

    /// The field type has its own draft view.
    #[darling(default)]
    pub nested: bool,
}

impl FieldInput {
    /// `supports(struct_named)` guarantees an identifier.
    pub fn ident(&self) -> &Ident {
        self.ident.as_ref().expect("named field required")
    }

    pub fn member_key(&self) -> String {
        self.rename
            .clone()
            .unwrap_or_else(|| self.ident().to_string())
    }

    pub fn is_included(&self) -> bool {
        !self.skip
    }
}
