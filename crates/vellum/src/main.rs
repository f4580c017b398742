//! Vellum CLI - Markdown blog engine with HTML import.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "vellum")]
#[command(about = "Markdown blog engine with HTML import")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to vellum.toml config file
    #[arg(short, long, default_value = "vellum.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site in the current directory
    Init {
        /// Skip interactive prompts, use defaults
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the static site
    Build {
        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include draft posts
        #[arg(long)]
        drafts: bool,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Start development server with live reload
    Dev {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Preview a built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve
        #[arg(short, long, default_value = "dist")]
        dir: PathBuf,
    },

    /// Import an exported HTML site as Markdown posts
    Migrate {
        /// Directory with one subdirectory per post (each holding index.html)
        #[arg(short, long)]
        input: PathBuf,

        /// Directory to write Markdown files into
        #[arg(short, long, default_value = "content/posts")]
        output: PathBuf,

        /// Overwrite existing Markdown files
        #[arg(long)]
        force: bool,
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

    fmt().with_env_filter(filter).with_target(false).init();

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(yes).await?;
        }
        Commands::Build {
            output,
            drafts,
            no_minify,
        } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&cli.config, output, drafts, minify).await?;
        }
        Commands::Dev { port, no_open } => {
            commands::dev::run(&cli.config, port, !no_open).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(port, dir).await?;
        }
        Commands::Migrate {
            input,
            output,
            force,
        } => {
            commands::migrate::run(input, output, force).await?;
        }
    }

    Ok(())
}
