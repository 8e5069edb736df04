//! Type helper utilities for syn type analysis.

use pgqs_schema::DomainType;

fn last_segment(ty: &syn::Type) -> Option<&syn::PathSegment> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    type_path.path.segments.last()
}

fn single_generic<'a>(ty: &'a syn::Type, wrapper: &str) -> Option<&'a syn::Type> {
    let seg = last_segment(ty)?;
    if seg.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic(ty, "Option")
}

/// Extract the inner type T from Vec<T>, or return None if not a Vec type.
pub fn vec_inner(ty: &syn::Type) -> Option<&syn::Type> {
    single_generic(ty, "Vec")
}

/// Whether `ty` is the `RowState` marker (any path ending in `RowState`).
pub fn is_row_state(ty: &syn::Type) -> bool {
    last_segment(ty).is_some_and(|seg| seg.ident == "RowState" && seg.arguments.is_empty())
}

/// Domain type of a non-optional Rust field type, when it can be read off
/// the type itself.
///
/// `Vec<T>` maps to an array of `T`'s domain type; `DateTime<_>` and
/// `NaiveDateTime` map to `datetime`.
pub fn infer_domain_type(ty: &syn::Type) -> Option<DomainType> {
    if let Some(inner) = vec_inner(ty) {
        return infer_domain_type(inner).map(DomainType::array_of);
    }
    let seg = last_segment(ty)?;
    let domain = match seg.ident.to_string().as_str() {
        "bool" => DomainType::Boolean,
        "i32" => DomainType::Int32,
        "i64" => DomainType::Int64,
        "f64" => DomainType::Float64,
        "DateTime" | "NaiveDateTime" => DomainType::DateTime,
        "String" => DomainType::String,
        _ => return None,
    };
    Some(domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_option_inner() {
        let ty: syn::Type = parse_quote!(Option<String>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(std::option::Option<i32>);
        assert!(option_inner(&ty).is_some());

        let ty: syn::Type = parse_quote!(String);
        assert!(option_inner(&ty).is_none());

        let ty: syn::Type = parse_quote!(Vec<String>);
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_row_state_detection() {
        let ty: syn::Type = parse_quote!(pgqs::RowState);
        assert!(is_row_state(&ty));

        let ty: syn::Type = parse_quote!(RowState);
        assert!(is_row_state(&ty));

        let ty: syn::Type = parse_quote!(Option<RowState>);
        assert!(!is_row_state(&ty));
    }

    #[test]
    fn test_infer_domain_type() {
        let cases: [(syn::Type, Option<&str>); 7] = [
            (parse_quote!(i64), Some("int64")),
            (parse_quote!(bool), Some("bool")),
            (parse_quote!(chrono::DateTime<chrono::Utc>), Some("datetime")),
            (parse_quote!(Vec<String>), Some("string[]")),
            (parse_quote!(Vec<Vec<f64>>), Some("float64[][]")),
            (parse_quote!(uuid::Uuid), None),
            (parse_quote!(Vec<u8>), None),
        ];
        for (ty, expected) in cases {
            assert_eq!(
                infer_domain_type(&ty).map(|d| d.to_string()).as_deref(),
                expected
            );
        }
    }
}
