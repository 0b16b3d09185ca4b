//! Per-route page data.
//!
//! Routes are listed in a TOML manifest. Each one names the API docs and
//! example files it needs; [`PageLoader`] turns that into the JSON view model
//! the page renders from.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use forgedoc_adapters::{ExpandError, ExpandedExample, MacroExpander};
use serde::{Deserialize, Serialize};

use crate::api_docs::{ApiDocs, ApiItem, ApiSource, BuiltinMacroDoc, CliDoc};
use crate::navigation::{self, PrevNext};

fn default_source() -> ApiSource {
    ApiSource::Rust
}

/// Items a page pulls from one documented module.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiQuery {
    #[serde(default = "default_source")]
    pub source: ApiSource,
    pub module: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// One `[[route]]` entry of the manifest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteSpec {
    /// URL path, e.g. `/docs/builtin-macros/debug`
    pub path: String,

    /// Rust crate whose version the page shows
    #[serde(default)]
    pub version: Option<String>,

    /// Builtin macro documented by the page
    #[serde(default)]
    pub builtin_macro: Option<String>,

    #[serde(default)]
    pub api: Option<ApiQuery>,

    /// Rust crate to count items of
    #[serde(default)]
    pub stats: Option<String>,

    /// Include the CLI documentation
    #[serde(default)]
    pub cli: bool,

    /// Example key to source file, relative to the content directory
    #[serde(default)]
    pub examples: BTreeMap<String, PathBuf>,
}

impl RouteSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: None,
            builtin_macro: None,
            api: None,
            stats: None,
            cli: false,
            examples: BTreeMap::new(),
        }
    }

    /// Where the route's data lands, relative to the data directory.
    ///
    /// `/docs/api` becomes `docs/api.json`; `/` becomes `index.json`.
    pub fn data_file(&self) -> PathBuf {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            PathBuf::from("index.json")
        } else {
            PathBuf::from(format!("{}.json", trimmed))
        }
    }
}

/// The route manifest, usually `routes.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteManifest {
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteSpec>,
}

impl RouteManifest {
    pub fn parse(source: &str) -> Result<Self, PageError> {
        toml::from_str(source).map_err(|e| PageError::Manifest(e.to_string()))
    }

    /// Read a manifest; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self, PageError> {
        if !path.exists() {
            tracing::warn!("Route manifest not found: {}", path.display());
            return Ok(Self::default());
        }

        let source = fs::read_to_string(path)
            .map_err(|e| PageError::Read(format!("{}: {}", path.display(), e)))?;
        Self::parse(&source)
    }
}

/// Item counts for API overview pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApiStats {
    pub functions: usize,
    pub structs: usize,
    pub total: usize,
}

/// Everything a page renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builtin_macro: Option<BuiltinMacroDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<BTreeMap<String, Option<ApiItem>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ApiStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli: Option<CliDoc>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub examples: BTreeMap<String, ExpandedExample>,
    pub nav: PrevNext,
}

/// Errors that stop a page from loading.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Failed to read {0}")]
    Read(String),

    #[error("Invalid route manifest: {0}")]
    Manifest(String),

    #[error("Failed to expand example {key} for {path}: {source}")]
    Example {
        path: String,
        key: String,
        #[source]
        source: ExpandError,
    },
}

/// Builds [`PageData`] for manifest routes.
#[derive(Debug, Clone)]
pub struct PageLoader {
    docs: Arc<ApiDocs>,
    expander: Option<Arc<MacroExpander>>,
    content_dir: PathBuf,
}

impl PageLoader {
    pub fn new(docs: Arc<ApiDocs>, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs,
            expander: None,
            content_dir: content_dir.into(),
        }
    }

    /// Expand route examples with `expander`. Without one they are omitted.
    pub fn with_expander(mut self, expander: Arc<MacroExpander>) -> Self {
        self.expander = Some(expander);
        self
    }

    pub fn docs(&self) -> &Arc<ApiDocs> {
        &self.docs
    }

    /// Load one route.
    ///
    /// Missing documentation leaves the matching field empty. An example
    /// that the engine rejects, or whose file cannot be read, is logged and
    /// left out. Formatter errors abort the page.
    pub fn load(&self, route: &RouteSpec) -> Result<PageData, PageError> {
        let docs = &self.docs;

        let api = route
            .api
            .as_ref()
            .map(|query| docs.items(query.source, &query.module, &query.items));

        let stats = route.stats.as_deref().map(|name| {
            docs.module(ApiSource::Rust, name)
                .map(|module| ApiStats {
                    functions: module.count_kind("function"),
                    structs: module.count_kind("struct"),
                    total: module.items.len(),
                })
                .unwrap_or_default()
        });

        Ok(PageData {
            path: route.path.clone(),
            title: navigation::find(&route.path).map(|item| item.title),
            version: route
                .version
                .as_deref()
                .and_then(|name| docs.version(ApiSource::Rust, name)),
            builtin_macro: route
                .builtin_macro
                .as_deref()
                .and_then(|name| docs.builtin_macro(name)),
            api,
            stats,
            cli: if route.cli {
                docs.cli_docs().map(|cli| (*cli).clone())
            } else {
                None
            },
            examples: self.load_examples(route)?,
            nav: navigation::prev_next(&route.path),
        })
    }

    fn load_examples(
        &self,
        route: &RouteSpec,
    ) -> Result<BTreeMap<String, ExpandedExample>, PageError> {
        let mut examples = BTreeMap::new();
        if route.examples.is_empty() {
            return Ok(examples);
        }

        let Some(expander) = &self.expander else {
            tracing::warn!(
                "No macro engine available, skipping {} examples for {}",
                route.examples.len(),
                route.path
            );
            return Ok(examples);
        };

        for (key, file) in &route.examples {
            let path = self.content_dir.join(file);
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!("Failed to read example {}: {}", path.display(), e);
                    continue;
                }
            };

            match expander.expand_example(&source, &format!("{}.ts", key)) {
                Ok(example) => {
                    examples.insert(key.clone(), example);
                }
                Err(ExpandError::Engine(e)) => {
                    tracing::warn!("Failed to expand example {} for {}: {}", key, route.path, e);
                }
                Err(e) => {
                    return Err(PageError::Example {
                        path: route.path.clone(),
                        key: key.clone(),
                        source: e,
                    });
                }
            }
        }

        Ok(examples)
    }
}
