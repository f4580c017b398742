//! Development server command.

use std::path::Path;

use anyhow::Result;
use vellum_server::{DevServer, DevServerConfig};

use crate::config::load_config;

/// Run the dev server.
pub async fn run(config_path: &Path, port: u16, open: bool) -> Result<()> {
    tracing::info!("Starting development server on port {}", port);

    let file_config = load_config(config_path)?;

    let mut build = file_config.build_config();
    // Authors preview what they are writing
    build.include_drafts = true;

    let config = DevServerConfig {
        build,
        port,
        open,
        ..Default::default()
    };

    DevServer::new(config).start().await?;

    Ok(())
}
