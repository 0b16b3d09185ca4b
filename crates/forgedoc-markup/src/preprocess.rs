//! Markup preprocessor that pre-renders highlighted HTML for code tags.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use forgedoc_highlight::{escape_template_braces, HighlightError, Highlighter, HighlighterCache};

use crate::detect::detect_inline_language;
use crate::edits::{Edit, EditSet};
use crate::literal::{decode_html_entities, Extraction};
use crate::tags::{CodeBlockTag, InlineCodeTag, CODE_BLOCK_RE, INLINE_CODE_RE, PLAIN_CODE_RE};

/// Components whose own source must not be rewritten.
const SKIPPED_COMPONENTS: &[&str] = &["CodeBlock.svelte", "InlineCode.svelte"];

/// Escape text for use inside a JavaScript template literal.
pub fn escape_template_literal(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

/// What to render for one matched occurrence.
enum Target {
    Block { tag: CodeBlockTag, code: String },
    Inline { tag: InlineCodeTag },
    Plain { code: String },
}

struct Occurrence<'a> {
    start: usize,
    source: &'a str,
    target: Target,
}

impl Occurrence<'_> {
    fn kind(&self) -> &'static str {
        match self.target {
            Target::Block { .. } => "CodeBlock",
            Target::Inline { .. } => "InlineCode",
            Target::Plain { .. } => "inline code",
        }
    }

    fn render(&self, highlighter: &Highlighter) -> Result<Option<String>, HighlightError> {
        Ok(match &self.target {
            Target::Block { tag, code } => {
                let html = escape_template_braces(&highlighter.highlight(code, &tag.lang)?);
                tag.with_html(self.source, &escape_template_literal(&html))
            }
            Target::Inline { tag } => {
                let html = escape_template_braces(&highlighter.highlight_inline(&tag.content, &tag.lang)?);
                Some(tag.with_html(&escape_template_literal(&html)))
            }
            Target::Plain { code } => {
                let lang = detect_inline_language(code);
                Some(escape_template_braces(
                    &highlighter.highlight_inline(code, lang.as_str())?,
                ))
            }
        })
    }
}

/// Adds pre-rendered highlighting to `<CodeBlock>`, `<InlineCode>` and bare
/// `<code>` elements in `.svelte` and `.svx` sources.
#[derive(Debug, Clone)]
pub struct CodeBlockPreprocessor {
    highlighter: Arc<HighlighterCache>,
}

impl CodeBlockPreprocessor {
    pub fn new(highlighter: Arc<HighlighterCache>) -> Self {
        Self { highlighter }
    }

    /// Whether a file with this name is rewritten at all.
    pub fn should_process(filename: &str) -> bool {
        let path = Path::new(filename);

        if path.components().any(|c| c.as_os_str() == "node_modules") {
            return false;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if SKIPPED_COMPONENTS.contains(&name) {
            return false;
        }

        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("svelte" | "svx")
        )
    }

    /// Rewrite `content`, returning `None` when nothing changed.
    ///
    /// Occurrences whose code cannot be read statically are left as they
    /// are, as is any occurrence that fails to highlight.
    pub fn markup(&self, content: &str, filename: &str) -> Option<String> {
        self.markup_outside(content, filename, &[])
    }

    /// Like [`markup`](Self::markup), but leaves every occurrence that
    /// touches one of the `protected` byte ranges alone.
    pub fn markup_outside(
        &self,
        content: &str,
        filename: &str,
        protected: &[Range<usize>],
    ) -> Option<String> {
        if !Self::should_process(filename) {
            return None;
        }

        let mut occurrences = collect(content, filename);
        occurrences.retain(|o| {
            let end = o.start + o.source.len();
            !protected.iter().any(|r| o.start < r.end && r.start < end)
        });
        if occurrences.is_empty() {
            return None;
        }

        let highlighter = match self.highlighter.get() {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("Skipping highlighting in {}: {}", filename, e);
                return None;
            }
        };

        let mut edits = EditSet::new();
        for occurrence in &occurrences {
            let replacement = match occurrence.render(highlighter) {
                Ok(Some(r)) => r,
                Ok(None) => {
                    tracing::debug!(
                        "Skipping {} without a closing '>' in {}",
                        occurrence.kind(),
                        filename
                    );
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to highlight {} in {}: {} ({})",
                        occurrence.kind(),
                        filename,
                        e,
                        snippet(occurrence.source)
                    );
                    continue;
                }
            };

            let range = occurrence.start..occurrence.start + occurrence.source.len();
            if let Err(e) = edits.push(Edit::new(range, replacement)) {
                tracing::debug!("Skipping {} in {}: {}", occurrence.kind(), filename, e);
            }
        }

        if edits.is_empty() {
            return None;
        }

        let mut result = content.to_string();
        match edits.apply(&mut result) {
            Ok(_) => Some(result),
            Err(e) => {
                tracing::warn!("Failed to rewrite {}: {}", filename, e);
                None
            }
        }
    }
}

/// Find every occurrence whose code can be read statically.
fn collect<'a>(content: &'a str, filename: &str) -> Vec<Occurrence<'a>> {
    let mut occurrences = Vec::new();

    for m in CODE_BLOCK_RE.find_iter(content) {
        let tag = CodeBlockTag::parse(m.as_str());
        if tag.has_html {
            continue;
        }

        let code = match &tag.code {
            Extraction::Literal(code) if !code.is_empty() => code.clone(),
            Extraction::Dynamic => {
                tracing::debug!("Skipping CodeBlock with dynamic code in {}", filename);
                continue;
            }
            _ => continue,
        };

        occurrences.push(Occurrence {
            start: m.start(),
            source: m.as_str(),
            target: Target::Block { tag, code },
        });
    }

    for m in INLINE_CODE_RE.find_iter(content) {
        let Some(tag) = InlineCodeTag::parse(m.as_str()) else {
            continue;
        };
        if tag.has_html || tag.content.trim().is_empty() {
            continue;
        }

        occurrences.push(Occurrence {
            start: m.start(),
            source: m.as_str(),
            target: Target::Inline { tag },
        });
    }

    for caps in PLAIN_CODE_RE.captures_iter(content) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if inside_pre(content, whole.start()) || inner.as_str().trim().is_empty() {
            continue;
        }

        occurrences.push(Occurrence {
            start: whole.start(),
            source: whole.as_str(),
            target: Target::Plain {
                code: decode_html_entities(inner.as_str()),
            },
        });
    }

    occurrences
}

/// Whether `offset` sits inside a `<pre>` element.
///
/// Looks only at the last `<pre` and `</pre>` before the offset, so nested
/// or unbalanced markup can fool it.
fn inside_pre(content: &str, offset: usize) -> bool {
    let before = &content[..offset];
    before.rfind("<pre") > before.rfind("</pre>")
}

fn snippet(source: &str) -> String {
    const MAX: usize = 60;

    match source.char_indices().nth(MAX) {
        Some((i, _)) => format!("{}...", &source[..i]),
        None => source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgedoc_highlight::{HighlightConfig, INLINE_CLASS};
    use pretty_assertions::assert_eq;

    fn preprocessor() -> CodeBlockPreprocessor {
        CodeBlockPreprocessor::new(Arc::new(HighlighterCache::new(HighlightConfig::default())))
    }

    #[test]
    fn filters_files() {
        assert!(CodeBlockPreprocessor::should_process("src/routes/+page.svelte"));
        assert!(CodeBlockPreprocessor::should_process("docs/intro.svx"));
        assert!(!CodeBlockPreprocessor::should_process("docs/intro.md"));
        assert!(!CodeBlockPreprocessor::should_process("node_modules/pkg/A.svelte"));
        assert!(!CodeBlockPreprocessor::should_process("src/lib/CodeBlock.svelte"));
        assert!(!CodeBlockPreprocessor::should_process("src/lib/InlineCode.svelte"));
        assert!(CodeBlockPreprocessor::should_process("src/lib/MyCodeBlock.svelte"));
    }

    #[test]
    fn adds_html_to_code_block() {
        let content = r#"<CodeBlock lang="rust" code="fn main() {}" />"#;

        let result = preprocessor().markup(content, "page.svelte").unwrap();

        assert!(result.starts_with(r#"<CodeBlock lang="rust" code="fn main() {}" html={`"#));
        assert!(result.ends_with("`} />"));
        assert!(result.contains("<span"));
    }

    #[test]
    fn inserted_html_has_no_raw_braces() {
        let content = r#"<CodeBlock lang="rust" code="fn main() {}" />"#;

        let result = preprocessor().markup(content, "page.svelte").unwrap();
        let start = result.find("html={`").unwrap() + "html={`".len();
        let end = result.rfind("`}").unwrap();

        assert!(!result[start..end].contains('{'));
        assert!(result[start..end].contains("&#123;"));
    }

    #[test]
    fn dynamic_code_is_untouched() {
        let p = preprocessor();

        assert_eq!(p.markup("<CodeBlock code={`a ${b}`} />", "page.svelte"), None);
        assert_eq!(p.markup("<CodeBlock code={source} />", "page.svelte"), None);
        assert_eq!(p.markup(r#"<CodeBlock code="" />"#, "page.svelte"), None);
    }

    #[test]
    fn existing_html_is_untouched() {
        let content = r#"<CodeBlock code="x" html={cached} />"#;
        assert_eq!(preprocessor().markup(content, "page.svelte"), None);
    }

    #[test]
    fn inline_code_becomes_self_closing() {
        let content = r#"<p>Use <InlineCode lang="ts">let x = 1</InlineCode> here</p>"#;

        let result = preprocessor().markup(content, "page.svelte").unwrap();

        assert!(result.starts_with(r#"<p>Use <InlineCode lang="ts" html={`<code class=""#));
        assert!(result.ends_with("`} /> here</p>"));
        assert!(!result.contains("</InlineCode>"));
    }

    #[test]
    fn bare_code_outside_pre_is_highlighted() {
        let content = "<p>Run <code>npm install</code></p><pre><code>raw</code></pre>";

        let result = preprocessor().markup(content, "page.svx").unwrap();

        assert!(result.contains(&format!(r#"<code class="{INLINE_CLASS}">"#)));
        assert!(result.ends_with("<pre><code>raw</code></pre>"));
    }

    #[test]
    fn bare_code_inside_pre_is_untouched() {
        let content = "<pre class=\"x\"><code>let a = 1;</code></pre>";
        assert_eq!(preprocessor().markup(content, "page.svelte"), None);
    }

    #[test]
    fn protected_ranges_are_untouched() {
        let content = "<p><code>a</code></p>\n<p><code>b</code></p>";
        let second = content.rfind("<p>").unwrap();

        let result = preprocessor()
            .markup_outside(content, "page.svx", &[second..content.len()])
            .unwrap();

        assert_eq!(result.matches(INLINE_CLASS).count(), 1);
        assert!(result.ends_with("\n<p><code>b</code></p>"));
        assert_eq!(
            preprocessor().markup_outside(content, "page.svx", &[0..content.len()]),
            None
        );
    }

    #[test]
    fn skips_other_files() {
        let content = r#"<CodeBlock lang="rust" code="fn main() {}" />"#;
        assert_eq!(preprocessor().markup(content, "page.md"), None);
    }

    #[test]
    fn later_occurrences_keep_their_offsets() {
        let content = concat!(
            r#"<CodeBlock code="a" />"#,
            "\n<p><code>b</code></p>\n",
            r#"<CodeBlock code="c" />"#,
        );

        let result = preprocessor().markup(content, "page.svelte").unwrap();

        assert_eq!(result.matches("html={`").count(), 2);
        assert_eq!(result.matches(INLINE_CLASS).count(), 1);
        assert!(result.contains("\n<p><code class="));
    }

    #[test]
    fn escapes_template_literal() {
        assert_eq!(escape_template_literal(r"a\b`c${d}"), r"a\\b\`c\${d}");
    }

    #[test]
    fn truncates_snippet() {
        let long = "x".repeat(100);
        assert_eq!(snippet(&long).len(), 63);
        assert_eq!(snippet("short"), "short");
    }
}
