//! Pre-generated API documentation.
//!
//! Pages pull signatures, parameters and descriptions from JSON files written
//! by the API extraction step:
//!
//! ```text
//! <dir>/rust/<crate>.json
//! <dir>/typescript/<package>.json
//! <dir>/rust/builtin-macros.json
//! <dir>/rust/cli.json
//! ```
//!
//! Each file is read at most once per [`ApiDocs`]. Missing or malformed files
//! are logged and treated as absent, and they are read again on the next
//! lookup.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A documented parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub description: String,
}

/// A documented return value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiReturns {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub description: String,
}

/// One documented function, type or constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiItem {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<ApiParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ApiReturns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Whether a module documents a Rust crate or a TypeScript package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    RustCrate,
    TypescriptPackage,
}

/// Documentation for a whole crate or package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiModule {
    pub name: String,
    pub kind: ModuleKind,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub items: Vec<ApiItem>,
}

impl ApiModule {
    pub fn item(&self, name: &str) -> Option<&ApiItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.items.iter().filter(|item| item.kind == kind).count()
    }
}

/// A code block taken from a builtin macro's doc comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleCodeBlock {
    pub lang: String,
    pub code: String,
    #[serde(default)]
    pub raw_code: String,
}

/// Documentation for one builtin derive macro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltinMacroDoc {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub generated_output: String,
    #[serde(default)]
    pub field_options: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub example_code: Vec<ExampleCodeBlock>,
    #[serde(default)]
    pub raw: String,
}

/// A documented function exported for Node integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliFunction {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<ApiParam>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ApiReturns>,
}

/// Documentation for the command-line tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliDoc {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Command name to its documentation section
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
    #[serde(default)]
    pub output_file_naming: String,
    #[serde(default)]
    pub exit_codes: String,
    #[serde(default)]
    pub node_integration: String,
    #[serde(default)]
    pub functions: Vec<CliFunction>,
    #[serde(default)]
    pub raw: String,
}

/// Which documentation tree a module lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiSource {
    #[serde(alias = "rs")]
    Rust,
    #[serde(alias = "typescript")]
    Ts,
}

impl ApiSource {
    fn dir(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Ts => "typescript",
        }
    }

    fn cache_prefix(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Ts => "ts",
        }
    }
}

const BUILTIN_MACROS_KEY: &str = "builtin-macros";
const CLI_KEY: &str = "cli";

#[derive(Debug, Clone)]
enum Cached {
    Module(Arc<ApiModule>),
    Macros(Arc<BTreeMap<String, BuiltinMacroDoc>>),
    Cli(Arc<CliDoc>),
}

/// Lazily loaded API documentation, shared across page loads.
#[derive(Debug)]
pub struct ApiDocs {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Cached>>,
}

impl ApiDocs {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a crate or package.
    pub fn module(&self, source: ApiSource, name: &str) -> Option<Arc<ApiModule>> {
        let key = format!("{}:{}", source.cache_prefix(), name);
        if let Some(Cached::Module(module)) = self.cached(&key) {
            return Some(module);
        }

        let path = self.dir.join(source.dir()).join(format!("{}.json", name));
        let module = Arc::new(load_json::<ApiModule>(&path, name)?);
        self.store(key, Cached::Module(module.clone()));
        Some(module)
    }

    /// Look up one item of a module.
    pub fn item(&self, source: ApiSource, module: &str, name: &str) -> Option<ApiItem> {
        self.module(source, module)?.item(name).cloned()
    }

    /// Look up several items; names that are not documented map to `None`.
    pub fn items(
        &self,
        source: ApiSource,
        module: &str,
        names: &[String],
    ) -> BTreeMap<String, Option<ApiItem>> {
        let loaded = self.module(source, module);
        names
            .iter()
            .map(|name| {
                let item = loaded.as_ref().and_then(|m| m.item(name).cloned());
                (name.clone(), item)
            })
            .collect()
    }

    /// Version of a module; `None` when it is missing or has no version.
    pub fn version(&self, source: ApiSource, name: &str) -> Option<String> {
        self.module(source, name)
            .map(|m| m.version.clone())
            .filter(|v| !v.is_empty())
    }

    pub fn items_by_kind(&self, source: ApiSource, module: &str, kind: &str) -> Vec<ApiItem> {
        self.module(source, module)
            .map(|m| m.items.iter().filter(|i| i.kind == kind).cloned().collect())
            .unwrap_or_default()
    }

    /// Every builtin macro, keyed by snake_case name.
    pub fn builtin_macros(&self) -> Arc<BTreeMap<String, BuiltinMacroDoc>> {
        if let Some(Cached::Macros(macros)) = self.cached(BUILTIN_MACROS_KEY) {
            return macros;
        }

        let path = self.dir.join("rust").join("builtin-macros.json");
        match load_json::<BTreeMap<String, BuiltinMacroDoc>>(&path, "builtin macros") {
            Some(macros) => {
                let macros = Arc::new(macros);
                self.store(BUILTIN_MACROS_KEY.to_string(), Cached::Macros(macros.clone()));
                macros
            }
            None => Arc::new(BTreeMap::new()),
        }
    }

    /// One builtin macro; `partial-eq` and `partial_eq` both work.
    pub fn builtin_macro(&self, name: &str) -> Option<BuiltinMacroDoc> {
        self.builtin_macros().get(&name.replace('-', "_")).cloned()
    }

    pub fn builtin_macros_named(&self, names: &[String]) -> BTreeMap<String, Option<BuiltinMacroDoc>> {
        names
            .iter()
            .map(|name| (name.clone(), self.builtin_macro(name)))
            .collect()
    }

    pub fn cli_docs(&self) -> Option<Arc<CliDoc>> {
        if let Some(Cached::Cli(cli)) = self.cached(CLI_KEY) {
            return Some(cli);
        }

        let path = self.dir.join("rust").join("cli.json");
        let cli = Arc::new(load_json::<CliDoc>(&path, "CLI")?);
        self.store(CLI_KEY.to_string(), Cached::Cli(cli.clone()));
        Some(cli)
    }

    /// Keys of everything loaded so far, sorted.
    pub fn cache_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn cached(&self, key: &str) -> Option<Cached> {
        self.lock().get(key).cloned()
    }

    fn store(&self, key: String, value: Cached) {
        self.lock().entry(key).or_insert(value);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Cached>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Option<T> {
    if !path.exists() {
        tracing::warn!("API docs not found for {}: {}", what, path.display());
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("Failed to read API docs for {}: {}", what, e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::error!("Failed to load API docs for {}: {}", what, e);
            None
        }
    }
}
