//! Expand one file through the configured engine.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use forgedoc_adapters::{
    CodeFormatter, CommandEngine, CommandSpec, DiagnosticLevel, MacroExpander,
    PassthroughFormatter,
};

use crate::config::ConfigFile;

/// Run the expand command.
pub async fn run(config_path: &Path, file: &Path, format: bool) -> Result<()> {
    let config = ConfigFile::load(config_path)?;
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let spec = CommandSpec::new(&config.engine.program, &config.engine.args);
    let engine = CommandEngine::locate(spec)?;
    let formatter: Arc<dyn CodeFormatter> = if format {
        config.formatter(config.mode(false))
    } else {
        Arc::new(PassthroughFormatter)
    };
    let expander = MacroExpander::new(Arc::new(engine), formatter);

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("example.ts")
        .to_string();

    let expansion =
        tokio::task::spawn_blocking(move || expander.expand_formatted(&source, &filename))
            .await
            .context("Expansion task panicked")??;

    for diagnostic in &expansion.diagnostics {
        match diagnostic.level {
            DiagnosticLevel::Error => tracing::error!("{}", diagnostic.message),
            DiagnosticLevel::Warning => tracing::warn!("{}", diagnostic.message),
            DiagnosticLevel::Info => tracing::info!("{}", diagnostic.message),
        }
    }

    println!("{}", expansion.code);

    Ok(())
}
