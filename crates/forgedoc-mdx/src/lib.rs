//! Markdown handling for forgedoc.
//!
//! Parses documentation pages into frontmatter and top-level blocks, and
//! rewrites tagged code fences into macro example components.

pub mod fence;
pub mod frontmatter;
pub mod pairer;
pub mod tree;

pub use fence::{extract_filename, FenceInfo, Flag};
pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterBlock, FrontmatterError};
pub use pairer::{import_preamble, is_component_block, Component, MacroBlockPairer, PairError, PairReport};
pub use tree::{slugify, Block, BlockKind, CodeFence, Document, ParseError, TocEntry};
