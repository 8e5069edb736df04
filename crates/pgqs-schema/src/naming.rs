//! Identifier helpers shared by schema resolution and the derive macro.

use heck::{ToSnakeCase, ToUpperCamelCase};

/// `blog_post` -> `BlogPost`.
pub fn struct_name(table: &str) -> String {
    let mut s = table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_upper_camel_case();

    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    s
}

/// Column name to a field identifier, raw-escaped when it collides with a keyword.
pub fn sanitize_field_ident(column: &str) -> String {
    let mut s = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_snake_case();

    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if is_rust_keyword(&s) {
        format!("r#{s}")
    } else {
        s
    }
}

/// Field identifier without a raw prefix, for building method names.
pub fn unraw(ident: &str) -> &str {
    ident.trim_start_matches("r#")
}

/// Relation method stem for a foreign-key column: `author_id` -> `author`.
pub fn relation_name(column: &str) -> String {
    let field = sanitize_field_ident(column);
    match unraw(&field).strip_suffix("_id") {
        Some(base) if !base.is_empty() => base.to_string(),
        _ => unraw(&field).to_string(),
    }
}

/// Default accessor name for a reverse relation: `comment` -> `comments`.
pub fn pluralize(base: &str) -> String {
    let base = unraw(base);
    if base.ends_with('y')
        && base.len() > 1
        && !matches!(
            base.chars().nth(base.len() - 2),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        )
    {
        format!("{}ies", &base[..base.len() - 1])
    } else if base.ends_with('s')
        || base.ends_with('x')
        || base.ends_with('z')
        || base.ends_with("ch")
        || base.ends_with("sh")
    {
        format!("{base}es")
    } else {
        format!("{base}s")
    }
}

pub fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "break"
            | "const"
            | "continue"
            | "crate"
            | "else"
            | "enum"
            | "extern"
            | "false"
            | "fn"
            | "for"
            | "if"
            | "impl"
            | "in"
            | "let"
            | "loop"
            | "match"
            | "mod"
            | "move"
            | "mut"
            | "pub"
            | "ref"
            | "return"
            | "static"
            | "struct"
            | "super"
            | "trait"
            | "true"
            | "type"
            | "unsafe"
            | "use"
            | "where"
            | "while"
            | "async"
            | "await"
            | "dyn"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_idents() {
        assert_eq!(sanitize_field_ident("createdAt"), "created_at");
        assert_eq!(sanitize_field_ident("type"), "r#type");
        assert_eq!(sanitize_field_ident("2fa"), "_2fa");
    }

    #[test]
    fn relation_names() {
        assert_eq!(relation_name("author_id"), "author");
        assert_eq!(relation_name("parent"), "parent");
        assert_eq!(relation_name("_id"), "id");
    }

    #[test]
    fn struct_names_and_plurals() {
        assert_eq!(struct_name("blog_post"), "BlogPost");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("comment"), "comments");
    }
}
