//! Turns tagged code fences into macro example components.
//!
//! A `before` fence followed by an `after` fence (with only paragraphs in
//! between) becomes one `<MacroExample>`. An `interactive` fence becomes an
//! `<InteractiveMacro>` whose expansion comes from the macro engine, and a
//! `macro` fence becomes a `<MacroExample>` whose "after" half does.

use std::collections::BTreeSet;
use std::sync::Arc;

use forgedoc_adapters::{ExpandError, ExpandedExample, FormatError, MacroExpander};
use forgedoc_highlight::{HighlightError, Highlighter, HighlighterCache, Lang};
use forgedoc_markup::{Edit, EditError, EditSet};

use crate::fence::Flag;
use crate::tree::{Block, BlockKind, CodeFence, Document};

/// Filename handed to the engine when a fence names none.
const DEFAULT_FILENAME: &str = "example.ts";

/// A Svelte component the pairer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Component {
    MacroExample,
    InteractiveMacro,
}

impl Component {
    pub fn name(self) -> &'static str {
        match self {
            Self::MacroExample => "MacroExample",
            Self::InteractiveMacro => "InteractiveMacro",
        }
    }

    /// The import statement, without its semicolon.
    pub fn import(self) -> String {
        format!(
            "import {0} from '$lib/components/ui/{0}.svelte'",
            self.name()
        )
    }
}

/// Whether `block` is a component node this pairer emitted.
pub fn is_component_block(block: &Block) -> bool {
    matches!(block.kind, BlockKind::Html)
        && [Component::MacroExample, Component::InteractiveMacro]
            .iter()
            .any(|c| {
                block
                    .source
                    .strip_prefix('<')
                    .and_then(|rest| rest.strip_prefix(c.name()))
                    .is_some_and(|rest| rest.starts_with(char::is_whitespace))
            })
}

/// A `<script>` block importing `components`.
pub fn import_preamble(components: &[Component]) -> String {
    let imports: Vec<String> = components.iter().map(|c| c.import()).collect();
    format!("<script>\n{};\n</script>\n\n", imports.join(";\n"))
}

/// What a [`MacroBlockPairer::transform`] run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairReport {
    /// Before/after pairs combined.
    pub examples: usize,
    /// Interactive fences replaced.
    pub interactive: usize,
    /// `macro` fences expanded into examples.
    pub expanded: usize,
    /// Fences left alone after a highlighting or engine failure.
    pub skipped: usize,
}

impl PairReport {
    pub fn is_changed(&self) -> bool {
        self.examples + self.interactive + self.expanded > 0
    }
}

/// Errors that abort a document.
#[derive(Debug, thiserror::Error)]
pub enum PairError {
    #[error("Highlighter unavailable: {0}")]
    Highlight(#[from] HighlightError),

    #[error("Formatting failed: {0}")]
    Format(#[from] FormatError),

    #[error("Failed to apply block edits: {0}")]
    Edit(#[from] EditError),
}

/// Rewrites tagged code fences of a [`Document`].
#[derive(Debug, Clone)]
pub struct MacroBlockPairer {
    highlighter: Arc<HighlighterCache>,
    expander: Option<Arc<MacroExpander>>,
}

impl MacroBlockPairer {
    pub fn new(highlighter: Arc<HighlighterCache>) -> Self {
        Self {
            highlighter,
            expander: None,
        }
    }

    /// Use `expander` for `interactive` and `macro` fences.
    ///
    /// Without one those fences are left as plain code.
    pub fn with_expander(mut self, expander: Arc<MacroExpander>) -> Self {
        self.expander = Some(expander);
        self
    }

    /// Replace tagged fences in `doc`.
    ///
    /// Highlighting and engine failures leave the fence in place and are
    /// counted in [`PairReport::skipped`]. A formatter error (production
    /// builds only) aborts with [`PairError::Format`] and leaves `doc`
    /// unchanged.
    pub fn transform(&self, doc: &mut Document) -> Result<PairReport, PairError> {
        let mut report = PairReport::default();
        let mut consumed = vec![false; doc.blocks.len()];
        let mut edits: EditSet<Vec<Block>> = EditSet::new();
        let mut used = BTreeSet::new();

        for i in 0..doc.blocks.len() {
            if consumed[i] {
                continue;
            }
            let block = &doc.blocks[i];
            let Some(fence) = block.code() else {
                continue;
            };

            if fence.info.has(Flag::Before) {
                if let Some(j) = find_after(&doc.blocks, i) {
                    let after = doc.blocks[j].code().map_or("", CodeFence::code);
                    let lang = Lang::resolve(fence.info.lang_or_default());

                    match self.render_pair(lang, fence.code(), after)? {
                        Some((before_html, after_html)) => {
                            let html = macro_example(lang, fence.code(), after, &before_html, &after_html);
                            edits.push(Edit::new(i..i + 1, vec![replacement(block, html)]))?;
                            edits.push(Edit::new(j..j + 1, Vec::new()))?;
                            consumed[i] = true;
                            consumed[j] = true;
                            used.insert(Component::MacroExample);
                            report.examples += 1;
                            continue;
                        }
                        None => report.skipped += 1,
                    }
                }
            }

            let component = if fence.info.has(Flag::Interactive) {
                Component::InteractiveMacro
            } else if fence.info.has(Flag::Macro) {
                Component::MacroExample
            } else {
                continue;
            };

            let Some(html) = self.render_expanded(fence, component)? else {
                report.skipped += 1;
                continue;
            };

            edits.push(Edit::new(i..i + 1, vec![replacement(block, html)]))?;
            consumed[i] = true;
            used.insert(component);
            match component {
                Component::InteractiveMacro => report.interactive += 1,
                Component::MacroExample => report.expanded += 1,
            }
        }

        if edits.is_empty() {
            return Ok(report);
        }

        edits.apply(&mut doc.blocks)?;
        insert_imports(doc, &used);

        Ok(report)
    }

    fn highlighter(&self) -> Result<&Highlighter, PairError> {
        Ok(self.highlighter.get()?)
    }

    /// Highlight both halves of a pair concurrently.
    fn render_pair(
        &self,
        lang: Lang,
        first: &str,
        second: &str,
    ) -> Result<Option<(String, String)>, PairError> {
        let highlighter = self.highlighter()?;
        let (a, b) = rayon::join(
            || highlighter.highlight(first, lang.as_str()),
            || highlighter.highlight(second, lang.as_str()),
        );

        match (a, b) {
            (Ok(a), Ok(b)) => Ok(Some((a, b))),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Failed to highlight macro example: {} ({})", e, first_line(first));
                Ok(None)
            }
        }
    }

    /// Expand a fence and render it as `component`.
    fn render_expanded(
        &self,
        fence: &CodeFence,
        component: Component,
    ) -> Result<Option<String>, PairError> {
        let Some(expander) = &self.expander else {
            tracing::debug!("No macro engine configured; leaving {} fence", component.name());
            return Ok(None);
        };

        let filename = fence.info.filename.as_deref().unwrap_or(DEFAULT_FILENAME);
        let example = match expander.expand_example(fence.code(), filename) {
            Ok(example) => example,
            Err(ExpandError::Format(e)) => return Err(e.into()),
            Err(ExpandError::Engine(e)) => {
                tracing::warn!("Macro expansion failed: {} ({})", e, first_line(fence.code()));
                return Ok(None);
            }
        };
        log_diagnostics(&example, filename);

        // The playground shows the code as authored.
        let code: &str = match component {
            Component::InteractiveMacro => fence.code(),
            Component::MacroExample => &example.before,
        };

        let lang = Lang::resolve(fence.info.lang_or_default());
        let Some((code_html, expanded_html)) = self.render_pair(lang, code, &example.after)? else {
            return Ok(None);
        };

        Ok(Some(match component {
            Component::InteractiveMacro => format!(
                "<InteractiveMacro code={{{}}} expanded={{{}}} codeHtml={{{}}} expandedHtml={{{}}} />",
                js_string(code),
                js_string(&example.after),
                js_string(&code_html),
                js_string(&expanded_html),
            ),
            Component::MacroExample => {
                macro_example(lang, code, &example.after, &code_html, &expanded_html)
            }
        }))
    }
}

/// The nearest code fence after `before`, skipping paragraphs, if it is
/// tagged `after`.
fn find_after(blocks: &[Block], before: usize) -> Option<usize> {
    for (j, block) in blocks.iter().enumerate().skip(before + 1) {
        match block.code() {
            Some(fence) if fence.info.has(Flag::After) => return Some(j),
            Some(_) => return None,
            None if block.is_paragraph() => continue,
            None => return None,
        }
    }
    None
}

/// An HTML block taking the place of `original`.
fn replacement(original: &Block, mut html: String) -> Block {
    if original.source.ends_with('\n') {
        html.push('\n');
    }
    Block::html(original.leading.clone(), html)
}

fn macro_example(lang: Lang, before: &str, after: &str, before_html: &str, after_html: &str) -> String {
    format!(
        "<MacroExample lang=\"{}\" before={{{}}} after={{{}}} beforeHtml={{{}}} afterHtml={{{}}} />",
        lang,
        js_string(before),
        js_string(after),
        js_string(before_html),
        js_string(after_html),
    )
}

/// A JSON string literal, usable as a Svelte expression.
fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn log_diagnostics(example: &ExpandedExample, filename: &str) {
    for diagnostic in &example.diagnostics {
        tracing::warn!(
            "Macro engine reported {:?} in {}: {}",
            diagnostic.level,
            filename,
            diagnostic.message
        );
    }
}

fn first_line(code: &str) -> &str {
    code.lines().next().unwrap_or("")
}

/// Add imports for `used` components, once.
///
/// Imports go into the document's existing instance `<script>` when there
/// is one; otherwise a new script block is placed first, after any
/// frontmatter.
fn insert_imports(doc: &mut Document, used: &BTreeSet<Component>) {
    let missing: Vec<Component> = used
        .iter()
        .copied()
        .filter(|c| {
            let import = c.import();
            !doc.blocks.iter().any(|b| b.source.contains(&import))
        })
        .collect();

    if missing.is_empty() {
        return;
    }

    if let Some(script) = doc.blocks.iter_mut().find(|b| is_instance_script(b)) {
        if let Some(open_end) = script.source.find('>') {
            let lines: String = missing
                .iter()
                .map(|c| format!("\n{};", c.import()))
                .collect();
            script.source.insert_str(open_end + 1, &lines);
            return;
        }
    }

    doc.blocks.insert(0, Block::html("", import_preamble(&missing)));
}

fn is_instance_script(block: &Block) -> bool {
    if !matches!(block.kind, BlockKind::Html) {
        return false;
    }

    let source = block.source.trim_start();
    if !source.starts_with("<script") {
        return false;
    }

    let open_tag = source.split('>').next().unwrap_or("");
    !open_tag.contains("module")
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgedoc_adapters::{
        CodeFormatter, EngineError, EngineOutput, MacroEngine, PassthroughFormatter,
    };
    use forgedoc_highlight::HighlightConfig;
    use pretty_assertions::assert_eq;

    struct StubEngine;

    impl MacroEngine for StubEngine {
        fn name(&self) -> &str {
            "stub"
        }

        fn expand(&self, source: &str, filename: &str) -> Result<EngineOutput, EngineError> {
            if source.contains("Broken") {
                return Err(EngineError::Failed {
                    filename: filename.to_string(),
                    message: "unknown macro".to_string(),
                });
            }
            Ok(EngineOutput {
                code: format!("{}\n// generated", source.trim()),
                diagnostics: Vec::new(),
            })
        }
    }

    struct RejectingFormatter;

    impl CodeFormatter for RejectingFormatter {
        fn format(&self, _code: &str, label: Option<&str>) -> Result<String, FormatError> {
            Err(FormatError::Exit {
                label: label.unwrap_or("?").to_string(),
                status: "exit status: 1".to_string(),
                stderr: "parse error".to_string(),
            })
        }
    }

    /// Breaks empty braces over two lines.
    struct ReflowingFormatter;

    impl CodeFormatter for ReflowingFormatter {
        fn format(&self, code: &str, _label: Option<&str>) -> Result<String, FormatError> {
            Ok(code.trim().replace("{}", "{\n}"))
        }
    }

    fn cache() -> Arc<HighlighterCache> {
        Arc::new(HighlighterCache::new(HighlightConfig::default()))
    }

    fn pairer() -> MacroBlockPairer {
        MacroBlockPairer::new(cache())
    }

    fn pairer_with(formatter: Arc<dyn CodeFormatter>) -> MacroBlockPairer {
        let expander = MacroExpander::new(Arc::new(StubEngine), formatter);
        MacroBlockPairer::new(cache()).with_expander(Arc::new(expander))
    }

    fn run(pairer: &MacroBlockPairer, source: &str) -> (PairReport, Document) {
        let mut doc = Document::parse(source).unwrap();
        let report = pairer.transform(&mut doc).unwrap();
        (report, doc)
    }

    fn html_blocks(doc: &Document) -> Vec<&str> {
        doc.blocks
            .iter()
            .filter(|b| matches!(b.kind, BlockKind::Html))
            .map(|b| b.source.as_str())
            .collect()
    }

    const PAIR: &str = "# Example\n\n```ts before\nclass A {}\n```\n\n```ts after\nclass A { x: number; }\n```\n";

    #[test]
    fn combines_before_and_after() {
        let (report, doc) = run(&pairer(), PAIR);

        assert_eq!(report.examples, 1);
        assert_eq!(doc.code_blocks().count(), 0);

        let examples: Vec<_> = html_blocks(&doc)
            .into_iter()
            .filter(|s| s.starts_with("<MacroExample"))
            .collect();
        assert_eq!(examples.len(), 1);
        assert!(examples[0].contains(r#"lang="typescript""#));
        assert!(examples[0].contains(r#"before={"class A {}"}"#));
        assert!(examples[0].contains(r#"after={"class A { x: number; }"}"#));
        assert!(examples[0].contains(r#"beforeHtml={"<pre class=\"forgedoc\""#));
        assert!(examples[0].contains("<span"));
    }

    #[test]
    fn prepends_import_preamble() {
        let (_, doc) = run(&pairer(), PAIR);
        let markdown = doc.to_markdown();

        assert!(markdown.starts_with(
            "<script>\nimport MacroExample from '$lib/components/ui/MacroExample.svelte';\n</script>\n\n# Example\n"
        ));
        assert_eq!(markdown.matches("<script>").count(), 1);
    }

    #[test]
    fn preamble_follows_frontmatter() {
        let source = format!("---\ntitle: Debug\n---\n{}", PAIR);
        let (_, doc) = run(&pairer(), &source);

        assert!(doc
            .to_markdown()
            .starts_with("---\ntitle: Debug\n---\n<script>\nimport MacroExample"));
    }

    #[test]
    fn unpaired_before_is_left_alone() {
        let source = "```ts before\nclass A {}\n```\n\n```ts\nclass B {}\n```\n";
        let (report, doc) = run(&pairer(), source);

        assert!(!report.is_changed());
        assert_eq!(doc.to_markdown(), source);
    }

    #[test]
    fn heading_between_blocks_prevents_pairing() {
        let source = "```ts before\nclass A {}\n```\n\n## Then\n\n```ts after\nclass A {}\n```\n";
        let (report, doc) = run(&pairer(), source);

        assert!(!report.is_changed());
        assert_eq!(doc.to_markdown(), source);
    }

    #[test]
    fn keeps_paragraphs_between_pair_in_order() {
        let source = "Intro.\n\n```ts before\nA\n```\n\nExpands to:\n\n```ts after\nB\n```\n\n## Next\n";
        let (_, doc) = run(&pairer(), source);

        let order: Vec<&str> = doc
            .blocks
            .iter()
            .map(|b| match &b.kind {
                BlockKind::Html if b.source.starts_with("<script") => "script",
                BlockKind::Html => "example",
                BlockKind::Paragraph => b.source.trim(),
                BlockKind::Heading { .. } => "heading",
                _ => "other",
            })
            .collect();

        assert_eq!(
            order,
            vec!["script", "Intro.", "example", "Expands to:", "heading"]
        );
    }

    #[test]
    fn second_run_changes_nothing() {
        let (_, doc) = run(&pairer(), PAIR);
        let once = doc.to_markdown();

        let (report, doc) = run(&pairer(), &once);

        assert!(!report.is_changed());
        assert_eq!(doc.to_markdown(), once);
    }

    #[test]
    fn interactive_fence_is_expanded() {
        let source = "```ts interactive\nclass A {}\n```\n";
        let (report, doc) = run(&pairer_with(Arc::new(PassthroughFormatter)), source);

        assert_eq!(report.interactive, 1);
        let markdown = doc.to_markdown();
        assert!(markdown.contains(r#"<InteractiveMacro code={"class A {}"} expanded={"class A {}\n// generated"}"#));
        assert!(markdown.contains("import InteractiveMacro from"));
        assert!(!markdown.contains("import MacroExample from"));
    }

    #[test]
    fn macro_fence_gets_generated_after() {
        let source = "```ts macro\nclass A {}\n```\n";
        let (report, doc) = run(&pairer_with(Arc::new(PassthroughFormatter)), source);

        assert_eq!(report.expanded, 1);
        assert!(doc
            .to_markdown()
            .contains(r#"before={"class A {}"} after={"class A {}\n// generated"}"#));
    }

    #[test]
    fn interactive_code_is_the_authored_text() {
        let source = "```ts interactive\nclass A {}\n```\n";
        let (_, doc) = run(&pairer_with(Arc::new(ReflowingFormatter)), source);
        let markdown = doc.to_markdown();

        assert!(markdown.contains(r#"<InteractiveMacro code={"class A {}"}"#));
        assert!(markdown.contains(r#"expanded={"class A {\n}\n// generated"}"#));
    }

    #[test]
    fn recognizes_emitted_components() {
        let (_, doc) = run(&pairer(), PAIR);
        let flagged: Vec<_> = doc.blocks.iter().filter(|b| is_component_block(b)).collect();

        assert_eq!(flagged.len(), 1);
        assert!(!is_component_block(&Block::html("", "<MacroExampleList />")));
        assert!(!is_component_block(&Block::html("", "<script>\n</script>")));
    }

    #[test]
    fn engine_failure_leaves_fence() {
        let source = "```ts interactive\nclass Broken {}\n```\n";
        let (report, doc) = run(&pairer_with(Arc::new(PassthroughFormatter)), source);

        assert_eq!(report.skipped, 1);
        assert_eq!(doc.to_markdown(), source);
    }

    #[test]
    fn interactive_without_engine_is_left() {
        let source = "```ts interactive\nclass A {}\n```\n";
        let (report, doc) = run(&pairer(), source);

        assert_eq!(report.skipped, 1);
        assert_eq!(doc.to_markdown(), source);
    }

    #[test]
    fn formatter_failure_aborts() {
        let source = "Intro.\n\n```ts interactive\nclass A {}\n```\n";
        let mut doc = Document::parse(source).unwrap();

        let result = pairer_with(Arc::new(RejectingFormatter)).transform(&mut doc);

        assert!(matches!(result, Err(PairError::Format(_))));
        assert_eq!(doc.to_markdown(), source);
    }

    #[test]
    fn merges_imports_into_existing_script() {
        let source = format!("<script>\n  let count = 0;\n</script>\n\n{}", PAIR);
        let (_, doc) = run(&pairer(), &source);
        let markdown = doc.to_markdown();

        assert_eq!(markdown.matches("<script").count(), 1);
        assert!(markdown.starts_with(
            "<script>\nimport MacroExample from '$lib/components/ui/MacroExample.svelte';\n  let count = 0;"
        ));
    }

    #[test]
    fn builds_preamble() {
        assert_eq!(
            import_preamble(&[Component::MacroExample, Component::InteractiveMacro]),
            "<script>\nimport MacroExample from '$lib/components/ui/MacroExample.svelte';\nimport InteractiveMacro from '$lib/components/ui/InteractiveMacro.svelte';\n</script>\n\n"
        );
    }
}
