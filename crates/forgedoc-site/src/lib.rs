//! Page data and the content build for the macroforge documentation site.
//!
//! Ties the highlighter, the markup preprocessor and the fence pairer into a
//! build over a content directory, and produces per-route JSON from the
//! pre-generated API documentation.

pub mod api_docs;
pub mod assets;
pub mod builder;
pub mod navigation;
pub mod pages;
pub mod pipeline;
pub mod site;

pub use api_docs::{
    ApiDocs, ApiItem, ApiModule, ApiParam, ApiReturns, ApiSource, BuiltinMacroDoc, CliDoc,
    CliFunction, ExampleCodeBlock, ModuleKind,
};
pub use builder::{BuildConfig, BuildError, BuildResult, FileOutcome, SiteBuilder};
pub use navigation::{NavError, NavItem, NavSection, PrevNext, NAVIGATION};
pub use pages::{ApiQuery, ApiStats, PageData, PageError, PageLoader, RouteManifest, RouteSpec};
pub use pipeline::{ContentKind, ContentPipeline, PipelineError, Processed};
pub use site::{SiteLinks, SiteMeta};
