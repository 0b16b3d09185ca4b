//! Content build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{ConfigFile, Services};

/// Run the build command.
pub async fn run(
    config_path: &Path,
    output: Option<PathBuf>,
    production: bool,
    minify: Option<bool>,
) -> Result<()> {
    let config = ConfigFile::load(config_path)?;
    let mode = config.mode(production);
    let minify = minify.unwrap_or(config.build.minify);

    tracing::info!("Building content ({:?})...", mode);

    let services = Services::new(&config, mode, output, minify);
    let result = tokio::task::spawn_blocking(move || services.builder.build())
        .await
        .context("Build task panicked")??;

    tracing::info!(
        "Processed {} files ({} changed, {} examples) and {} routes in {}ms",
        result.files,
        result.transformed,
        result.examples,
        result.routes,
        result.duration_ms
    );

    if result.skipped > 0 {
        tracing::warn!("{} code fences were left unrendered", result.skipped);
    }

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
