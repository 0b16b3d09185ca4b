//! `forgedoc.toml` and the services built from it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use forgedoc_adapters::{
    BuildMode, CodeFormatter, CommandEngine, CommandFormatter, CommandSpec, MacroExpander,
    PassthroughFormatter, DEFAULT_MAX_OUTPUT,
};
use forgedoc_highlight::{HighlightConfig, HighlighterCache};
use forgedoc_markup::CodeBlockPreprocessor;
use forgedoc_mdx::MacroBlockPairer;
use forgedoc_site::{ApiDocs, BuildConfig, ContentPipeline, PageLoader, SiteBuilder, SiteMeta};

/// Configuration file structure (forgedoc.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteMeta,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub highlight: HighlightSettings,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub formatter: FormatterConfig,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_content_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_api_data")]
    pub api_data: PathBuf,
    #[serde(default = "default_routes")]
    pub routes: PathBuf,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
            output: default_output(),
            api_data: default_api_data(),
            routes: default_routes(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HighlightSettings {
    #[serde(default = "default_light_theme")]
    pub light_theme: String,
    #[serde(default = "default_dark_theme")]
    pub dark_theme: String,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            light_theme: default_light_theme(),
            dark_theme: default_dark_theme(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_program")]
    pub program: String,
    #[serde(default = "default_engine_args")]
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: default_engine_program(),
            args: default_engine_args(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FormatterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_formatter_program")]
    pub program: String,
    #[serde(default = "default_formatter_args")]
    pub args: Vec<String>,
    #[serde(default = "default_max_output")]
    pub max_output: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_formatter_program(),
            args: default_formatter_args(),
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default)]
    pub mode: BuildMode,
    #[serde(default = "default_true")]
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            mode: BuildMode::Development,
            minify: true,
        }
    }
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("src")
}
fn default_output() -> PathBuf {
    PathBuf::from("build/content")
}
fn default_api_data() -> PathBuf {
    PathBuf::from("static/api-data")
}
fn default_routes() -> PathBuf {
    PathBuf::from("routes.toml")
}
fn default_light_theme() -> String {
    HighlightConfig::default().light_theme
}
fn default_dark_theme() -> String {
    HighlightConfig::default().dark_theme
}
fn default_engine_program() -> String {
    "macroforge".to_string()
}
fn default_engine_args() -> Vec<String> {
    ["expand", "--stdin", "--json", "--filename", "{filename}"]
        .map(String::from)
        .to_vec()
}
fn default_formatter_program() -> String {
    "npx".to_string()
}
fn default_formatter_args() -> Vec<String> {
    ["biome", "format", "--stdin-file-path={filename}"]
        .map(String::from)
        .to_vec()
}
fn default_max_output() -> usize {
    DEFAULT_MAX_OUTPUT
}
fn default_true() -> bool {
    true
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The build mode, forced to production when `production` is set.
    pub fn mode(&self, production: bool) -> BuildMode {
        if production {
            BuildMode::Production
        } else {
            self.build.mode
        }
    }

    pub fn highlighter(&self) -> Arc<HighlighterCache> {
        Arc::new(HighlighterCache::new(HighlightConfig {
            light_theme: self.highlight.light_theme.clone(),
            dark_theme: self.highlight.dark_theme.clone(),
        }))
    }

    pub fn formatter(&self, mode: BuildMode) -> Arc<dyn CodeFormatter> {
        if !self.formatter.enabled {
            return Arc::new(PassthroughFormatter);
        }

        let spec = CommandSpec::new(&self.formatter.program, &self.formatter.args);
        Arc::new(CommandFormatter::new(spec, mode).with_max_output(self.formatter.max_output))
    }

    /// The macro expander, or `None` when the engine is not installed.
    pub fn expander(&self, formatter: Arc<dyn CodeFormatter>) -> Option<Arc<MacroExpander>> {
        let spec = CommandSpec::new(&self.engine.program, &self.engine.args);
        match CommandEngine::locate(spec) {
            Ok(engine) => Some(Arc::new(MacroExpander::new(Arc::new(engine), formatter))),
            Err(e) => {
                tracing::warn!("{}; macro examples will not be expanded", e);
                None
            }
        }
    }
}

/// Everything a build or the dev server needs, wired from one config.
pub struct Services {
    pub expander: Option<Arc<MacroExpander>>,
    pub builder: SiteBuilder,
}

impl Services {
    pub fn new(
        config: &ConfigFile,
        mode: BuildMode,
        output: Option<PathBuf>,
        minify: bool,
    ) -> Self {
        let highlighter = config.highlighter();
        let expander = config.expander(config.formatter(mode));

        let mut pairer = MacroBlockPairer::new(highlighter.clone());
        let docs = Arc::new(ApiDocs::new(&config.content.api_data));
        let mut loader = PageLoader::new(docs, &config.content.dir);
        if let Some(expander) = &expander {
            pairer = pairer.with_expander(expander.clone());
            loader = loader.with_expander(expander.clone());
        }

        let pipeline = ContentPipeline::new(CodeBlockPreprocessor::new(highlighter), pairer);
        let build_config = BuildConfig {
            content_dir: config.content.dir.clone(),
            output_dir: output.unwrap_or_else(|| config.content.output.clone()),
            routes_file: config.content.routes.clone(),
            minify,
            site: config.site.clone(),
        };

        Self {
            expander,
            builder: SiteBuilder::new(build_config, pipeline, loader),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_without_file() {
        let temp = tempdir().unwrap();
        let config = ConfigFile::load(&temp.path().join("forgedoc.toml")).unwrap();

        assert_eq!(config.content.dir, PathBuf::from("src"));
        assert_eq!(config.content.api_data, PathBuf::from("static/api-data"));
        assert_eq!(config.engine.program, "macroforge");
        assert_eq!(config.formatter.max_output, 10 * 1024 * 1024);
        assert_eq!(config.build.mode, BuildMode::Development);
        assert!(config.build.minify);
    }

    #[test]
    fn parses_partial_config() {
        let config = ConfigFile::parse(
            r#"
[site]
name = "Forge"

[content]
dir = "docs"

[formatter]
enabled = false

[build]
mode = "production"
"#,
        )
        .unwrap();

        assert_eq!(config.site.name, "Forge");
        assert_eq!(config.content.dir, PathBuf::from("docs"));
        assert_eq!(config.content.output, PathBuf::from("build/content"));
        assert!(!config.formatter.enabled);
        assert_eq!(config.mode(false), BuildMode::Production);
    }

    #[test]
    fn production_flag_wins() {
        let config = ConfigFile::default();
        assert_eq!(config.mode(true), BuildMode::Production);
        assert_eq!(config.mode(false), BuildMode::Development);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("forgedoc.toml");
        fs::write(&path, "[content\ndir = 1").unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn disabled_formatter_only_trims() {
        let config = ConfigFile::parse("[formatter]\nenabled = false").unwrap();
        let formatter = config.formatter(BuildMode::Production);

        assert_eq!(formatter.format("  let a = 1;  ", None).unwrap(), "let a = 1;");
    }

    #[test]
    fn missing_engine_disables_expansion() {
        let config = ConfigFile::parse(
            "[engine]\nprogram = \"forgedoc-test-engine-that-does-not-exist\"",
        )
        .unwrap();

        assert!(config.expander(Arc::new(PassthroughFormatter)).is_none());
    }
}
