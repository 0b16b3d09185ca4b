//! Markdown documents as a flat list of top-level blocks.
//!
//! Every block keeps the exact source text it was parsed from, along with
//! the text between it and the previous block, so a document with no
//! changes writes back identical to its input.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

use crate::fence::FenceInfo;
use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// A fenced or indented code block.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeFence {
    pub info: FenceInfo,
    /// Code content, without fences.
    pub value: String,
}

impl CodeFence {
    /// The code without the final line break before the closing fence.
    pub fn code(&self) -> &str {
        self.value.strip_suffix('\n').unwrap_or(&self.value)
    }
}

/// What a top-level block is.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Code(CodeFence),
    Paragraph,
    Heading { level: u8, text: String },
    Html,
    Other,
}

/// A top-level block of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Text between the previous block and this one.
    pub leading: String,
    /// Source text of the block itself.
    pub source: String,
    pub kind: BlockKind,
}

impl Block {
    /// A raw HTML block.
    pub fn html(leading: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            leading: leading.into(),
            source: source.into(),
            kind: BlockKind::Html,
        }
    }

    pub fn code(&self) -> Option<&CodeFence> {
        match &self.kind {
            BlockKind::Code(fence) => Some(fence),
            _ => None,
        }
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(self.kind, BlockKind::Paragraph)
    }
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Errors that can occur when parsing a document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// A parsed Markdown document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The frontmatter block exactly as written, or empty.
    pub frontmatter_raw: String,
    pub frontmatter: Option<Frontmatter>,
    pub blocks: Vec<Block>,
    /// Text after the last block.
    pub trailing: String,
}

impl Document {
    /// Parse a document into frontmatter and top-level blocks.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let (frontmatter, body) = extract_frontmatter(source)?;
        let (frontmatter_raw, frontmatter) = match frontmatter {
            Some(block) => (block.raw.to_string(), Some(block.data)),
            None => (String::new(), None),
        };

        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;

        let mut blocks = Vec::new();
        let mut depth = 0usize;
        let mut cursor = 0usize;
        let mut current: Option<(usize, BlockKind)> = None;

        for (event, range) in Parser::new_ext(body, options).into_offset_iter() {
            match event {
                Event::Start(tag) => {
                    if depth == 0 {
                        current = Some((range.start, kind_for(&tag)));
                    }
                    depth += 1;
                }

                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth > 0 {
                        continue;
                    }
                    let Some((start, kind)) = current.take() else {
                        continue;
                    };
                    let start = start.max(cursor);
                    let end = range.end.max(start);
                    blocks.push(Block {
                        leading: body[cursor..start].to_string(),
                        source: body[start..end].to_string(),
                        kind,
                    });
                    cursor = end;
                }

                Event::Text(text) | Event::Code(text) => {
                    if let Some((_, kind)) = current.as_mut() {
                        match kind {
                            BlockKind::Code(fence) => fence.value.push_str(&text),
                            BlockKind::Heading { text: heading, .. } => heading.push_str(&text),
                            _ => {}
                        }
                    }
                }

                // Leaf events outside any container, such as thematic breaks.
                _ if depth == 0 && range.start >= cursor => {
                    blocks.push(Block {
                        leading: body[cursor..range.start].to_string(),
                        source: body[range.clone()].to_string(),
                        kind: BlockKind::Other,
                    });
                    cursor = range.end;
                }

                _ => {}
            }
        }

        Ok(Self {
            frontmatter_raw,
            frontmatter,
            blocks,
            trailing: body[cursor..].to_string(),
        })
    }

    /// Write the document back to Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::with_capacity(
            self.frontmatter_raw.len()
                + self
                    .blocks
                    .iter()
                    .map(|b| b.leading.len() + b.source.len())
                    .sum::<usize>()
                + self.trailing.len(),
        );

        out.push_str(&self.frontmatter_raw);
        for block in &self.blocks {
            out.push_str(&block.leading);
            out.push_str(&block.source);
        }
        out.push_str(&self.trailing);
        out
    }

    /// Each block with its byte range in [`Document::to_markdown`] output.
    pub fn spans(&self) -> Vec<(Range<usize>, &Block)> {
        let mut offset = self.frontmatter_raw.len();
        self.blocks
            .iter()
            .map(|block| {
                let start = offset + block.leading.len();
                offset = start + block.source.len();
                (start..offset, block)
            })
            .collect()
    }

    /// Code blocks in document order with their block index.
    pub fn code_blocks(&self) -> impl Iterator<Item = (usize, &CodeFence)> {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, block)| block.code().map(|fence| (i, fence)))
    }

    /// Table of contents from the top-level headings.
    pub fn toc(&self) -> Vec<TocEntry> {
        self.blocks
            .iter()
            .filter_map(|block| match &block.kind {
                BlockKind::Heading { level, text } => Some(TocEntry {
                    title: text.clone(),
                    id: slugify(text),
                    level: *level,
                }),
                _ => None,
            })
            .collect()
    }
}

fn kind_for(tag: &Tag<'_>) -> BlockKind {
    match tag {
        Tag::CodeBlock(kind) => {
            let info = match kind {
                CodeBlockKind::Fenced(info) => info.as_ref(),
                CodeBlockKind::Indented => "",
            };
            BlockKind::Code(CodeFence {
                info: FenceInfo::parse(info),
                value: String::new(),
            })
        }
        Tag::Paragraph => BlockKind::Paragraph,
        Tag::Heading { level, .. } => BlockKind::Heading {
            level: *level as u8,
            text: String::new(),
        },
        Tag::HtmlBlock => BlockKind::Html,
        _ => BlockKind::Other,
    }
}

/// Convert a heading to a URL-safe slug.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fence::Flag;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"---
title: Debug
---

# Debug

Generates a `toString()` method.

```ts before
/** @derive(Debug) */
class User {}
```

Expands to:

```ts after
class User {
  toString() {}
}
```

---

<div>raw</div>

## Options
"#;

    #[test]
    fn round_trips_exactly() {
        let doc = Document::parse(PAGE).unwrap();
        assert_eq!(doc.to_markdown(), PAGE);
    }

    #[test]
    fn round_trips_without_trailing_newline() {
        let source = "para one\n\n```rs\nfn a() {}\n```";
        assert_eq!(Document::parse(source).unwrap().to_markdown(), source);
    }

    #[test]
    fn splits_top_level_blocks() {
        let doc = Document::parse(PAGE).unwrap();
        let kinds: Vec<_> = doc
            .blocks
            .iter()
            .map(|b| match &b.kind {
                BlockKind::Code(_) => "code",
                BlockKind::Paragraph => "p",
                BlockKind::Heading { .. } => "h",
                BlockKind::Html => "html",
                BlockKind::Other => "other",
            })
            .collect();

        assert_eq!(
            kinds,
            vec!["h", "p", "code", "p", "code", "other", "html", "h"]
        );
        assert_eq!(doc.frontmatter.unwrap().title.as_deref(), Some("Debug"));
    }

    #[test]
    fn reads_code_values_and_flags() {
        let doc = Document::parse(PAGE).unwrap();
        let fences: Vec<_> = doc.code_blocks().map(|(_, f)| f).collect();

        assert_eq!(fences.len(), 2);
        assert!(fences[0].info.has(Flag::Before));
        assert_eq!(fences[0].value, "/** @derive(Debug) */\nclass User {}\n");
        assert!(fences[1].info.has(Flag::After));
    }

    #[test]
    fn spans_index_the_written_markdown() {
        let doc = Document::parse(PAGE).unwrap();
        let markdown = doc.to_markdown();

        for (range, block) in doc.spans() {
            assert_eq!(&markdown[range], block.source);
        }
    }

    #[test]
    fn builds_toc() {
        let doc = Document::parse(PAGE).unwrap();

        assert_eq!(
            doc.toc(),
            vec![
                TocEntry {
                    title: "Debug".to_string(),
                    id: "debug".to_string(),
                    level: 1
                },
                TocEntry {
                    title: "Options".to_string(),
                    id: "options".to_string(),
                    level: 2
                },
            ]
        );
    }

    #[test]
    fn nested_code_is_not_top_level() {
        let doc = Document::parse("- item\n\n  ```ts before\n  x\n  ```\n").unwrap();
        assert_eq!(doc.code_blocks().count(), 0);
    }

    #[test]
    fn slugify_works() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API Reference"), "api-reference");
        assert_eq!(slugify("Field Options (Debug)"), "field-options-debug");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
    }
}
