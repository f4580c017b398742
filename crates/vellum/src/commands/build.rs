//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use vellum_static::{BuildConfig, SiteBuilder};

use crate::config::load_config;

/// Run the build command.
pub async fn run(
    config_path: &Path,
    output: Option<PathBuf>,
    drafts: bool,
    minify: Option<bool>,
) -> Result<()> {
    tracing::info!("Building site...");

    let file_config = load_config(config_path)?;

    let base = file_config.build_config();
    let config = BuildConfig {
        output_dir: output.unwrap_or(base.output_dir),
        minify: minify.unwrap_or(base.minify),
        include_drafts: drafts,
        ..base
    };

    let result = SiteBuilder::new(config).build().await?;

    tracing::info!(
        "Built {} posts and {} pages in {}ms",
        result.posts,
        result.pages,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
