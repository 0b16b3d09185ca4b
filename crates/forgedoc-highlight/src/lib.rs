//! Dual-theme syntax highlighting for forgedoc.
//!
//! Renders code to HTML fragments whose token spans carry both a light and a
//! dark color, and keeps one lazily built highlighter per process.

pub mod cache;
pub mod highlighter;
pub mod lang;

pub use cache::HighlighterCache;
pub use highlighter::{
    escape_template_braces, HighlightConfig, HighlightError, Highlighter, BLOCK_CLASS,
    INLINE_CLASS,
};
pub use lang::Lang;
