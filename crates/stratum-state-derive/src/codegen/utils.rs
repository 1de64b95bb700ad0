//! Shared helpers for code generation.

/// The `T` of `Option<T>` or `Vec<T>`; the type itself otherwise.
pub fn extract_inner_type(ty: &syn::Type) -> syn::Type {
    if let syn::Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if let syn::PathArguments::AngleBracketed(ab) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = ab.args.first() {
                    return inner.clone();
                }
            }
        }
    }
    ty.clone()
}

/// Parse a `#[stratum(default = "...")]` expression.
pub fn parse_default(expr: &str, ty: &syn::Type) -> syn::Result<syn::Expr> {
    syn::parse_str(expr)
        .map_err(|e| syn::Error::new_spanned(ty, format!("invalid default expression: {e}")))
}
