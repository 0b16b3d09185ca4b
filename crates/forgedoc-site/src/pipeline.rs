//! Per-file content transforms.

use std::ops::Range;
use std::path::Path;

use forgedoc_markup::CodeBlockPreprocessor;
use forgedoc_mdx::{
    is_component_block, Document, MacroBlockPairer, PairError, PairReport, ParseError,
};

/// What kind of source a file is, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// `.svelte`: markup highlighting only
    Svelte,
    /// `.svx`: fence pairing, then markup highlighting outside code fences
    Svx,
    /// `.md`: fence pairing only
    Markdown,
    /// Anything else is copied through.
    Other,
}

impl ContentKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("svelte") => Self::Svelte,
            Some("svx") => Self::Svx,
            Some("md") => Self::Markdown,
            _ => Self::Other,
        }
    }

    pub fn is_text(self) -> bool {
        self != Self::Other
    }
}

/// Result of running one file through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Processed {
    /// New content, or `None` when the file is unchanged.
    pub content: Option<String>,
    pub report: PairReport,
}

/// Errors that fail a single file.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pair(#[from] PairError),
}

/// Runs the markup preprocessor and the fence pairer over content files.
#[derive(Debug, Clone)]
pub struct ContentPipeline {
    markup: CodeBlockPreprocessor,
    pairer: MacroBlockPairer,
}

impl ContentPipeline {
    pub fn new(markup: CodeBlockPreprocessor, pairer: MacroBlockPairer) -> Self {
        Self { markup, pairer }
    }

    /// Transform `content` read from `path`.
    pub fn process(&self, content: &str, path: &Path) -> Result<Processed, PipelineError> {
        let filename = path.to_string_lossy();

        match ContentKind::of(path) {
            ContentKind::Svelte => Ok(Processed {
                content: self.markup.markup(content, &filename),
                report: PairReport::default(),
            }),

            ContentKind::Svx => {
                let (doc, report) = self.pair(content)?;
                let paired = doc.to_markdown();
                let content = self
                    .markup
                    .markup_outside(&paired, &filename, &protected_ranges(&doc))
                    .or_else(|| report.is_changed().then_some(paired));
                Ok(Processed { content, report })
            }

            ContentKind::Markdown => {
                let (doc, report) = self.pair(content)?;
                let content = report.is_changed().then(|| doc.to_markdown());
                Ok(Processed { content, report })
            }

            ContentKind::Other => Ok(Processed::default()),
        }
    }

    fn pair(&self, content: &str) -> Result<(Document, PairReport), PipelineError> {
        let mut doc = Document::parse(content)?;
        let report = self.pairer.transform(&mut doc)?;
        Ok((doc, report))
    }
}

/// Code fences and emitted components, whose text is not markup.
fn protected_ranges(doc: &Document) -> Vec<Range<usize>> {
    doc.spans()
        .into_iter()
        .filter(|(_, block)| block.code().is_some() || is_component_block(block))
        .map(|(range, _)| range)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use forgedoc_highlight::{HighlightConfig, HighlighterCache};

    fn pipeline() -> ContentPipeline {
        let cache = Arc::new(HighlighterCache::new(HighlightConfig::default()));
        ContentPipeline::new(
            CodeBlockPreprocessor::new(cache.clone()),
            MacroBlockPairer::new(cache),
        )
    }

    const PAIRED: &str = "# Debug\n\n```ts before\nclass A {}\n```\n\n```ts after\nclass A { toString() {} }\n```\n";

    #[test]
    fn classifies_by_extension() {
        assert_eq!(ContentKind::of(Path::new("a/+page.svelte")), ContentKind::Svelte);
        assert_eq!(ContentKind::of(Path::new("a/+page.svx")), ContentKind::Svx);
        assert_eq!(ContentKind::of(Path::new("README.md")), ContentKind::Markdown);
        assert_eq!(ContentKind::of(Path::new("logo.png")), ContentKind::Other);
        assert!(!ContentKind::Other.is_text());
    }

    #[test]
    fn markdown_is_paired() {
        let out = pipeline().process(PAIRED, Path::new("debug.md")).unwrap();

        assert_eq!(out.report.examples, 1);
        let content = out.content.unwrap();
        assert!(content.contains("<MacroExample"));
        assert!(!content.contains("```ts after"));
    }

    #[test]
    fn markdown_without_tags_is_unchanged() {
        let out = pipeline()
            .process("# Title\n\n```ts\nlet a = 1;\n```\n", Path::new("plain.md"))
            .unwrap();
        assert_eq!(out.content, None);
    }

    #[test]
    fn svx_is_paired_and_highlighted() {
        let source = format!("{}\nUse <code>expandSync()</code> here.\n", PAIRED);
        let out = pipeline().process(&source, Path::new("debug.svx")).unwrap();
        let content = out.content.unwrap();

        assert!(content.contains("<MacroExample"));
        assert!(content.contains("forgedoc-inline"));
    }

    #[test]
    fn svx_fence_content_is_left_verbatim() {
        let source = "Use <code>npm i</code>.\n\n```html\n<p><code>x</code></p>\n```\n";
        let out = pipeline().process(source, Path::new("page.svx")).unwrap();
        let content = out.content.unwrap();

        assert_eq!(content.matches("forgedoc-inline").count(), 1);
        assert!(content.ends_with("```html\n<p><code>x</code></p>\n```\n"));
    }

    #[test]
    fn svx_example_strings_stay_valid() {
        let source = "```html before\n<p><code>x</code></p>\n```\n\n```html after\n<p>y</p>\n```\n";
        let out = pipeline().process(source, Path::new("page.svx")).unwrap();
        let content = out.content.unwrap();

        let start = content.find("before={").unwrap() + "before={".len();
        let end = start + content[start..].find("} after=").unwrap();
        let before: String = serde_json::from_str(&content[start..end]).unwrap();
        assert_eq!(before, "<p><code>x</code></p>");
    }

    #[test]
    fn svx_without_changes_is_unchanged() {
        let out = pipeline()
            .process("# Title\n\n```html\n<code>x</code>\n```\n", Path::new("page.svx"))
            .unwrap();
        assert_eq!(out.content, None);
    }

    #[test]
    fn svelte_is_highlighted() {
        let out = pipeline()
            .process(
                "<CodeBlock code=\"let a = 1;\" lang=\"ts\" />",
                Path::new("src/routes/+page.svelte"),
            )
            .unwrap();

        assert!(out.content.unwrap().contains("html={`"));
    }

    #[test]
    fn other_files_pass_through() {
        let out = pipeline().process("body {}", Path::new("app.css")).unwrap();
        assert_eq!(out, Processed::default());
    }
}
