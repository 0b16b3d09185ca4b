//! Pattern matching for the code-carrying tags in Svelte markup.

use std::sync::LazyLock;

use regex::Regex;

use crate::literal::{decode_html_entities, extract_string_content, Extraction};

/// Language used when a tag has no `lang` prop.
pub const DEFAULT_LANG: &str = "typescript";

/// `<CodeBlock ... code=... />` or `<CodeBlock ... code=...>...</CodeBlock>`.
pub(crate) static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<CodeBlock\s+[^>]*?\bcode\s*=.*?(?:/>|</CodeBlock>)")
        .expect("Invalid CodeBlock regex")
});

/// `<InlineCode lang=...>content</InlineCode>`.
pub(crate) static INLINE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<InlineCode\s+[^>]*?\blang\s*=[^>]*>[^<]*</InlineCode>")
        .expect("Invalid InlineCode regex")
});

/// A bare `<code>` element with text content only.
pub(crate) static PLAIN_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<code>([^<]+)</code>").expect("Invalid plain code regex"));

static HTML_PROP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bhtml\s*=").expect("Invalid html prop regex"));

static LANG_PROP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blang\s*=\s*(?:"([^"]+)"|\{["'`]([^"'`]+)["'`]\})"#)
        .expect("Invalid lang prop regex")
});

static CODE_LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?s)\bcode\s*=\s*("(?:[^"\\]|\\.)*""#,
        r#"|\{`(?:[^`\\]|\\.)*`\}"#,
        r#"|\{"(?:[^"\\]|\\.)*"\}"#,
        r#"|\{'(?:[^'\\]|\\.)*'\})"#,
    ))
    .expect("Invalid code literal regex")
});

static CODE_EXPR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcode\s*=\s*\{").expect("Invalid code expression regex"));

static INLINE_PARTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<InlineCode([^>]*)>([^<]*)</InlineCode>$").expect("Invalid InlineCode parts regex")
});

/// A parsed `<CodeBlock>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockTag {
    pub lang: String,
    pub code: Extraction,
    pub has_html: bool,
    /// Byte offset within the tag where a new prop is inserted: the `/` of a
    /// self-closing `/>`, or the `>` ending the opening tag.
    pub insert_at: Option<usize>,
    pub self_closing: bool,
}

impl CodeBlockTag {
    pub fn parse(tag: &str) -> Self {
        let end = opening_tag_end(tag);
        let self_closing = end.is_some_and(|i| tag[..i].ends_with('/'));
        let insert_at = end.map(|i| if self_closing { i - 1 } else { i });

        Self {
            lang: lang_prop(tag),
            code: code_prop(tag),
            has_html: HTML_PROP_RE.is_match(tag),
            insert_at,
            self_closing,
        }
    }

    /// Rewrite `tag` with an added ``html={`...`}`` prop.
    ///
    /// `escaped_html` must already be safe inside a template literal.
    pub fn with_html(&self, tag: &str, escaped_html: &str) -> Option<String> {
        let at = self.insert_at?;
        let head = tag[..at].trim_end();
        let sep = if self.self_closing { " " } else { "" };

        Some(format!("{head} html={{`{escaped_html}`}}{sep}{}", &tag[at..]))
    }
}

/// A parsed `<InlineCode>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCodeTag {
    pub lang: String,
    /// Text between the tags, entities decoded.
    pub content: String,
    /// Attribute text of the opening tag.
    pub attrs: String,
    pub has_html: bool,
}

impl InlineCodeTag {
    pub fn parse(tag: &str) -> Option<Self> {
        let caps = INLINE_PARTS_RE.captures(tag)?;
        let attrs = caps.get(1).map_or("", |m| m.as_str());

        Some(Self {
            lang: lang_prop(attrs),
            content: decode_html_entities(caps.get(2).map_or("", |m| m.as_str())),
            attrs: attrs.trim_end().to_string(),
            has_html: HTML_PROP_RE.is_match(attrs),
        })
    }

    /// The self-closing replacement tag carrying `escaped_html`.
    pub fn with_html(&self, escaped_html: &str) -> String {
        format!("<InlineCode{} html={{`{escaped_html}`}} />", self.attrs)
    }
}

fn lang_prop(tag: &str) -> String {
    LANG_PROP_RE
        .captures(tag)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map_or_else(|| DEFAULT_LANG.to_string(), |m| m.as_str().to_string())
}

fn code_prop(tag: &str) -> Extraction {
    if let Some(value) = CODE_LITERAL_RE.captures(tag).and_then(|caps| caps.get(1)) {
        return extract_string_content(value.as_str());
    }

    if CODE_EXPR_RE.is_match(tag) {
        Extraction::Dynamic
    } else {
        Extraction::Missing
    }
}

/// Offset of the `>` closing the opening tag, skipping quoted and braced
/// prop values.
pub(crate) fn opening_tag_end(tag: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;

    for (i, ch) in tag.char_indices() {
        if let Some(q) = quote {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '>' if depth == 0 => return Some(i),
            _ => {}
        }
    }

    None
}
