//! Development server command.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use forgedoc_server::{DevServer, DevServerConfig};

use crate::config::{ConfigFile, Services};

/// Run the dev server.
pub async fn run(config_path: &Path, port: u16, open: bool) -> Result<()> {
    let mut config = ConfigFile::load(config_path)?;

    // Watcher events carry absolute paths.
    fs::create_dir_all(&config.content.output).context("Failed to create output directory")?;
    config.content.dir = fs::canonicalize(&config.content.dir)
        .with_context(|| format!("Content directory not found: {}", config.content.dir.display()))?;
    config.content.output = fs::canonicalize(&config.content.output)?;

    let mode = config.mode(false);
    let services = Services::new(&config, mode, None, false);

    let watch_paths = vec![
        config.content.dir.clone(),
        config.content.api_data.clone(),
        config.content.routes.clone(),
    ];

    tracing::info!("Starting development server on port {}", port);

    let server_config = DevServerConfig {
        serve_dir: config.content.output.clone(),
        watch_paths,
        port,
        open,
        ..Default::default()
    };

    let mut server = DevServer::new(server_config).with_builder(Arc::new(services.builder));
    if let Some(expander) = services.expander {
        server = server.with_expander(expander);
    }

    server.start().await?;

    Ok(())
}
