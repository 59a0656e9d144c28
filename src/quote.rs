//! Extended string literals (`E'...'`).

/// Quote `text` as a PostgreSQL extended string literal.
///
/// Backslash escapes are applied before quotes are doubled; the other
/// order would double-process quotes.
///
/// ```
/// assert_eq!(pgpattern::quote::string_literal("can't"), "E'can''t'");
/// ```
pub fn string_literal(text: &str) -> String {
    let escaped = escape_backslashes(text);
    let doubled = double_quotes(&escaped);
    format!("E'{}'", doubled)
}

/// Escape everything that needs a backslash in an extended literal.
///
/// The output is pure ASCII: non-ASCII characters become `\uXXXX` or
/// `\UXXXXXXXX`.
pub fn escape_backslashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c => out.push_str(&numeric_escape(c)),
        }
    }
    out
}

/// `\xHH` for ASCII control characters, `\uXXXX` or `\UXXXXXXXX` otherwise.
fn numeric_escape(c: char) -> String {
    let code = c as u32;
    if c.is_ascii() {
        format!("\\x{:02x}", code)
    } else if code <= 0xffff {
        format!("\\u{:04x}", code)
    } else {
        format!("\\U{:08x}", code)
    }
}

/// Double every single quote.
pub fn double_quotes(text: &str) -> String {
    text.replace('\'', "''")
}
