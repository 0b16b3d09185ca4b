//! Adapters for forgedoc's external collaborators.
//!
//! The macro engine and the code formatter are separate programs. This crate
//! defines the traits the pipeline talks to, subprocess-backed
//! implementations, and the expansion helper used for documentation examples.

pub mod engine;
pub mod expand;
pub mod format;
pub mod process;
pub mod traits;

pub use engine::CommandEngine;
pub use expand::{
    strip_macroforge_import, ExpandError, ExpandedExample, Expansion, MacroExpander,
};
pub use format::{BuildMode, CommandFormatter, DEFAULT_MAX_OUTPUT};
pub use process::CommandSpec;
pub use traits::{
    CodeFormatter, Diagnostic, DiagnosticLevel, EngineError, EngineOutput, FormatError,
    MacroEngine, PassthroughFormatter,
};
