//! Content build.
//!
//! Walks the content directory, runs every Svelte, mdsvex and Markdown file
//! through the [`ContentPipeline`] and writes the results, together with the
//! page data for every manifest route, into the output directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use walkdir::WalkDir;

use crate::assets;
use crate::navigation::NAVIGATION;
use crate::pages::{PageLoader, RouteManifest, RouteSpec};
use crate::pipeline::{ContentKind, ContentPipeline};
use crate::site::SiteMeta;

/// Configuration for a content build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source content directory
    pub content_dir: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// Route manifest
    pub routes_file: PathBuf,

    /// Minify the generated stylesheet
    pub minify: bool,

    /// Written to `data/site.json`
    pub site: SiteMeta,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("build/content"),
            routes_file: PathBuf::from("routes.toml"),
            minify: true,
            site: SiteMeta::default(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Content files written
    pub files: usize,

    /// Files whose content changed
    pub transformed: usize,

    /// Code examples rendered from fences
    pub examples: usize,

    /// Fences left alone after a failure
    pub skipped: usize,

    /// Route data files written
    pub routes: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read content: {0}")]
    ReadError(String),

    #[error("Failed to process {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to load page data for {route}: {message}")]
    PageError { route: String, message: String },

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// What happened to one content file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileOutcome {
    pub transformed: bool,
    pub examples: usize,
    pub skipped: usize,
}

/// Builds the content tree and page data.
#[derive(Debug, Clone)]
pub struct SiteBuilder {
    config: BuildConfig,
    pipeline: ContentPipeline,
    loader: PageLoader,
}

impl SiteBuilder {
    pub fn new(config: BuildConfig, pipeline: ContentPipeline, loader: PageLoader) -> Self {
        Self {
            config,
            pipeline,
            loader,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build everything.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let files = self.discover_files()?;
        tracing::debug!("Found {} content files", files.len());

        let outcomes: Vec<Result<FileOutcome, BuildError>> =
            files.par_iter().map(|path| self.build_file(path)).collect();

        let mut result = BuildResult {
            output_dir: self.config.output_dir.clone(),
            ..Default::default()
        };

        for outcome in outcomes {
            let outcome = outcome?;
            result.files += 1;
            result.transformed += usize::from(outcome.transformed);
            result.examples += outcome.examples;
            result.skipped += outcome.skipped;
        }

        result.routes = self.build_routes()?;
        self.write_site_data()?;
        self.generate_assets()?;

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Build one content file, given its path under the content directory.
    pub fn build_file(&self, path: &Path) -> Result<FileOutcome, BuildError> {
        let relative = path.strip_prefix(&self.config.content_dir).map_err(|_| {
            BuildError::ReadError(format!(
                "{} is outside {}",
                path.display(),
                self.config.content_dir.display()
            ))
        })?;
        let output_path = self.config.output_dir.join(relative);

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }

        if !ContentKind::of(path).is_text() {
            fs::copy(path, &output_path)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", output_path.display(), e)))?;
            return Ok(FileOutcome::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

        let processed = self
            .pipeline
            .process(&content, relative)
            .map_err(|e| BuildError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let report = processed.report;
        let transformed = processed.content.is_some();
        let output = processed.content.unwrap_or(content);

        fs::write(&output_path, output)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", output_path.display(), e)))?;

        if transformed {
            tracing::debug!("Transformed {}", relative.display());
        }

        Ok(FileOutcome {
            transformed,
            examples: report.examples + report.interactive + report.expanded,
            skipped: report.skipped,
        })
    }

    /// Discover all files in the content directory.
    fn discover_files(&self) -> Result<Vec<PathBuf>, BuildError> {
        if !self.config.content_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "Content directory not found: {}",
                self.config.content_dir.display()
            )));
        }

        let output_dir = &self.config.output_dir;
        let files = WalkDir::new(&self.config.content_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                entry.depth() == 0
                    || !(name == "node_modules" || name.starts_with('.') || entry.path() == output_dir)
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        Ok(files)
    }

    /// Load and write page data for every manifest route.
    fn build_routes(&self) -> Result<usize, BuildError> {
        let manifest =
            RouteManifest::load(&self.config.routes_file).map_err(|e| BuildError::PageError {
                route: self.config.routes_file.display().to_string(),
                message: e.to_string(),
            })?;

        let data_dir = self.config.output_dir.join("data");
        manifest
            .routes
            .par_iter()
            .map(|route| self.build_route(route, &data_dir))
            .collect::<Result<Vec<()>, BuildError>>()?;

        Ok(manifest.routes.len())
    }

    fn build_route(&self, route: &RouteSpec, data_dir: &Path) -> Result<(), BuildError> {
        let data = self.loader.load(route).map_err(|e| BuildError::PageError {
            route: route.path.clone(),
            message: e.to_string(),
        })?;

        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        write_file(&data_dir.join(route.data_file()), &json)
    }

    fn write_site_data(&self) -> Result<(), BuildError> {
        let data_dir = self.config.output_dir.join("data");

        let nav = serde_json::to_string_pretty(NAVIGATION)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;
        write_file(&data_dir.join("navigation.json"), &nav)?;

        let site = serde_json::to_string_pretty(&self.config.site)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;
        write_file(&data_dir.join("site.json"), &site)
    }

    /// Generate static assets.
    fn generate_assets(&self) -> Result<(), BuildError> {
        let css = assets::highlight_css();
        let css = if self.config.minify {
            assets::minify_css(&css).unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                css
            })
        } else {
            css
        };

        write_file(
            &self.config.output_dir.join("assets").join("highlight.css"),
            &css,
        )
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
    }
    fs::write(path, content)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))
}
