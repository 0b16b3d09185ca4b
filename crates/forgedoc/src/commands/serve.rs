//! Preview server command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use forgedoc_server::{DevServer, DevServerConfig};

use crate::config::ConfigFile;

/// Run the serve command.
pub async fn run(config_path: &Path, port: u16, dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => ConfigFile::load(config_path)?.content.output,
    };

    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'forgedoc build' first.",
            dir.display()
        );
    }

    tracing::info!("Serving {}", dir.display());

    let config = DevServerConfig {
        serve_dir: dir,
        watch_paths: Vec::new(),
        port,
        open: true,
        ..Default::default()
    };

    DevServer::new(config).start().await?;

    Ok(())
}
