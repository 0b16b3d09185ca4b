//! Static extraction of string literals from component props.
//!
//! Only a fixed set of literal forms is understood:
//!
//! | form | example |
//! |---|---|
//! | double-quoted attribute | `code="a\"b"` |
//! | template literal expression | ``code={`a`}`` |
//! | quoted string expression | `code={"a"}`, `code={'a'}` |
//!
//! Anything else inside braces is an expression whose value is only known at
//! runtime, and is reported as [`Extraction::Dynamic`].

/// Result of reading a prop value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A constant string, escapes resolved.
    Literal(String),
    /// An expression or interpolated string.
    Dynamic,
    /// No value in a recognized form.
    Missing,
}

impl Extraction {
    /// The literal text, if any.
    pub fn literal(&self) -> Option<&str> {
        match self {
            Extraction::Literal(s) => Some(s),
            _ => None,
        }
    }
}

/// Read the raw text of a prop value, delimiters included.
pub fn extract_string_content(prop_value: &str) -> Extraction {
    let literal = if let Some(inner) = strip_delims(prop_value, "\"", "\"") {
        if has_unescaped(inner, '"') {
            return Extraction::Missing;
        }
        inner
    } else if let Some((inner, quote)) = brace_string(prop_value) {
        // `{`a` + `b`}` is a concatenation, not one literal.
        if has_unescaped(inner, quote) {
            return Extraction::Dynamic;
        }
        inner
    } else if prop_value.starts_with('{') && prop_value.ends_with('}') {
        return Extraction::Dynamic;
    } else {
        return Extraction::Missing;
    };

    if literal.contains("${") {
        return Extraction::Dynamic;
    }

    Extraction::Literal(decode_escapes(literal))
}

fn brace_string(value: &str) -> Option<(&str, char)> {
    ['`', '"', '\'']
        .into_iter()
        .find_map(|quote| {
            let open = format!("{{{quote}");
            let close = format!("{quote}}}");
            strip_delims(value, &open, &close).map(|inner| (inner, quote))
        })
}

fn has_unescaped(inner: &str, quote: char) -> bool {
    let mut escaped = false;
    for ch in inner.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == quote => return true,
            _ => {}
        }
    }
    false
}

fn strip_delims<'a>(value: &'a str, open: &str, close: &str) -> Option<&'a str> {
    if value.len() < open.len() + close.len() {
        return None;
    }
    value.strip_prefix(open)?.strip_suffix(close)
}

/// Resolve `\"`, `\'`, `` \` ``, `\\`, `\n`, `\t` and `\r`.
///
/// Unknown escapes are kept as written.
pub fn decode_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some(c @ ('"' | '\'' | '`' | '\\')) => out.push(c),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

/// Decode the HTML entities markdown renderers emit for inline code.
pub fn decode_html_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#123;", "{")
        .replace("&#125;", "}")
        .replace("&amp;", "&")
}
