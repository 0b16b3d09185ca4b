//! forgedoc CLI - build-time content pipeline for the macroforge docs.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "forgedoc")]
#[command(about = "Highlight and expand code examples for the macroforge documentation site")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to forgedoc.toml config file
    #[arg(short, long, default_value = "forgedoc.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create forgedoc.toml and an example route manifest
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the content tree and page data
    Build {
        /// Output directory (defaults to config or "build/content")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on formatter errors
        #[arg(long)]
        production: bool,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Build, watch for changes and serve the output
    Dev {
        /// Port to listen on
        #[arg(short, long, default_value = "5173")]
        port: u16,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Serve a finished build
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4173")]
        port: u16,

        /// Directory to serve (defaults to the configured output)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Expand the macros in one file and print the result
    Expand {
        /// TypeScript file to expand
        file: PathBuf,

        /// Print the engine output without formatting
        #[arg(long)]
        no_format: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Build {
            output,
            production,
            no_minify,
        } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&cli.config, output, production, minify).await?;
        }
        Commands::Dev { port, no_open } => {
            commands::dev::run(&cli.config, port, !no_open).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(&cli.config, port, dir).await?;
        }
        Commands::Expand { file, no_format } => {
            commands::expand::run(&cli.config, &file, !no_format).await?;
        }
    }

    Ok(())
}
