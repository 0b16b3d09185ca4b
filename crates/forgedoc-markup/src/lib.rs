//! Build-time highlighting for code examples written in Svelte markup.
//!
//! Finds `<CodeBlock>`, `<InlineCode>` and bare `<code>` elements, reads
//! their code when it is a constant string, and splices pre-rendered
//! highlighted HTML back into the source.

pub mod detect;
pub mod edits;
pub mod literal;
pub mod preprocess;
pub mod tags;

pub use detect::detect_inline_language;
pub use edits::{Edit, EditError, EditSet, Splice};
pub use literal::{decode_escapes, extract_string_content, Extraction};
pub use preprocess::{escape_template_literal, CodeBlockPreprocessor};
pub use tags::{CodeBlockTag, InlineCodeTag, DEFAULT_LANG};
