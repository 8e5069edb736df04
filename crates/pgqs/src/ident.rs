//! SQL identifier quoting.

/// Double-quote an identifier, escaping embedded `"` as `""`.
///
/// ```
/// assert_eq!(pgqs::ident::quote_ident("user"), r#""user""#);
/// assert_eq!(pgqs::ident::quote_ident(r#"a"b"#), r#""a""b""#);
/// ```
pub fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    push_quoted(&mut out, name);
    out
}

/// Append a quoted identifier to `out`.
pub fn push_quoted(out: &mut String, name: &str) {
    out.push('"');
    for c in name.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
}

/// Quoted, comma-separated column list: `"id","name"`.
pub fn column_list(columns: &[&str]) -> String {
    let mut out = String::new();
    for (i, c) in columns.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_quoted(&mut out, c);
    }
    out
}
