//! Field type analysis for code generation.

use syn::{GenericArgument, PathArguments, Type, TypePath};

/// How a field is accessed through the generated view.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Read and written as one serialized value.
    Primitive,

    /// `Option<T>`; missing and `null` members read as `None`.
    Option(Box<FieldKind>),

    /// `Vec<T>`; also gets a `push_*` method.
    Vec(Box<FieldKind>),

    /// `BTreeMap`, `HashMap` or `IndexMap`.
    Map,

    /// A type with its own draft view.
    Nested,
}

impl FieldKind {
    /// Classify a field type.
    ///
    /// `nested` marks the leaf type; `Option` and `Vec` wrappers are kept, so
    /// `Option<Profile>` with `nested` is `Option(Nested)`.
    pub fn from_type(ty: &Type, nested: bool) -> Self {
        match ty {
            Type::Path(type_path) => Self::from_type_path(type_path, nested),
            _ => FieldKind::Primitive,
        }
    }

    fn from_type_path(type_path: &TypePath, nested: bool) -> Self {
        let Some(segment) = type_path.path.segments.last() else {
            return FieldKind::Primitive;
        };

        match segment.ident.to_string().as_str() {
            "Option" => match single_generic_arg(&segment.arguments) {
                Some(inner) => FieldKind::Option(Box::new(Self::from_type(inner, nested))),
                None => FieldKind::Primitive,
            },
            "Vec" => match single_generic_arg(&segment.arguments) {
                Some(inner) => FieldKind::Vec(Box::new(Self::from_type(inner, nested))),
                None => FieldKind::Primitive,
            },
            "BTreeMap" | "HashMap" | "IndexMap" => FieldKind::Map,
            "String" | "str" | "bool" | "char" | "i8" | "i16" | "i32" | "i64" | "i128"
            | "isize" | "u8" | "u16" | "u32" | "u64" | "u128" | "usize" | "f32" | "f64" => {
                FieldKind::Primitive
            }
            _ if nested => FieldKind::Nested,
            _ => FieldKind::Primitive,
        }
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, FieldKind::Nested)
    }
}

fn single_generic_arg(args: &PathArguments) -> Option<&Type> {
    match args {
        PathArguments::AngleBracketed(ab) if ab.args.len() == 1 => match ab.args.first()? {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_primitive_types() {
        let types: [Type; 3] = [parse_quote!(String), parse_quote!(i32), parse_quote!(bool)];
        for ty in types {
            assert_eq!(FieldKind::from_type(&ty, false), FieldKind::Primitive);
        }
    }

    #[test]
    fn test_wrappers() {
        let ty: Type = parse_quote!(Option<String>);
        assert_eq!(
            FieldKind::from_type(&ty, false),
            FieldKind::Option(Box::new(FieldKind::Primitive))
        );

        let ty: Type = parse_quote!(Vec<i32>);
        assert_eq!(
            FieldKind::from_type(&ty, false),
            FieldKind::Vec(Box::new(FieldKind::Primitive))
        );

        let ty: Type = parse_quote!(std::collections::BTreeMap<String, i32>);
        assert_eq!(FieldKind::from_type(&ty, false), FieldKind::Map);
    }

    #[test]
    fn test_nested_attr() {
        let ty: Type = parse_quote!(Profile);
        assert!(FieldKind::from_type(&ty, true).is_nested());
        assert_eq!(FieldKind::from_type(&ty, false), FieldKind::Primitive);

        let ty: Type = parse_quote!(Option<Profile>);
        assert_eq!(
            FieldKind::from_type(&ty, true),
            FieldKind::Option(Box::new(FieldKind::Nested))
        );

        // Primitives stay primitive even when marked nested.
        let ty: Type = parse_quote!(u32);
        assert_eq!(FieldKind::from_type(&ty, true), FieldKind::Primitive);
    }
}
